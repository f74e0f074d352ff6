//! `DateReplace(...)` directive scanning and splicing.
//!
//! Course authors annotate a text node with a directive placed just before it,
//! usually in an attribute or a comment:
//!
//! ```text
//! <span title="DateReplace(MM DD, YYYY, 5)">January 19, 2024</span>
//!              └──── marker + arguments ───┘ └─ target span ─┘
//! ```
//!
//! The association between a directive and its target is positional, not
//! structural: from the marker we look for the next `)`, then the next `>`
//! after it, then the next `<` after that. Whatever sits between that `>` and
//! `<` is overwritten with the rendered date. The marker and its arguments are
//! left in place, so a package can be re-dated any number of times.
//!
//! No HTML is parsed. Irregular markup around a directive can therefore
//! retarget it (a directive inside `<!-- -->` rewrites the gap right after the
//! comment, for instance).
//!
//! ## Arguments
//!
//! The argument text is split on its **last** comma:
//!
//! - `MM DD, YYYY, 5` → template `MM DD, YYYY`, day number `5`
//! - `Y` → template `Y`, day number defaults to the start index (offset 0)
//!
//! The resolved date is `base + (day_number - start_index)` days.

use crate::date::{CalendarDate, DateError};
use crate::template;
use thiserror::Error;

/// Literal text that opens a directive.
pub const MARKER: &str = "DateReplace(";

/// Characters stripped from both ends of a directive's template.
const TEMPLATE_TRIM: &[char] = &[' ', '\t', '\n', '\r', '"', '_', '(', ')'];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectiveError {
    #[error("Invalid day number '{0}'")]
    InvalidDayNumber(String),
}

/// Parsed arguments of one `DateReplace(...)` occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    /// Date template, already trimmed.
    pub template: String,
    /// Day number as written by the author (or the start index when omitted).
    pub day_number: i64,
}

impl Directive {
    /// Parse the text between `DateReplace(` and `)`.
    pub fn parse(args: &str, start_index: i64) -> Result<Self, DirectiveError> {
        let (template, day_number) = match args.rfind(',') {
            None => (args, start_index),
            Some(comma) => {
                let day = &args[comma + 1..];
                let day_number = parse_day_number(day)
                    .ok_or_else(|| DirectiveError::InvalidDayNumber(day.to_string()))?;
                (&args[..comma], day_number)
            }
        };

        Ok(Self {
            template: template.trim_matches(TEMPLATE_TRIM).to_string(),
            day_number,
        })
    }

    /// Days between the base date and this directive's date.
    pub fn offset(&self, start_index: i64) -> Result<i64, DateError> {
        self.day_number
            .checked_sub(start_index)
            .ok_or(DateError::OffsetOverflow {
                day_number: self.day_number,
                start_index,
            })
    }
}

/// Lenient integer parse: leading whitespace, optional sign, then digits.
///
/// Anything after the digits is ignored, so `" 5 "` and `"5th"` both give 5.
/// At least one digit is required and the value must fit in an `i64`.
fn parse_day_number(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let sign_len = usize::from(s.starts_with(|c: char| c == '+' || c == '-'));
    let digits_len = s[sign_len..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits_len == 0 {
        return None;
    }
    s[..sign_len + digits_len].parse().ok()
}

/// Why an occurrence was left untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No `)` after the marker.
    UnclosedArguments,
    /// No `>` after the `)`, or no `<` after that `>`.
    MissingTarget,
    InvalidDayNumber(String),
    DateOutOfRange(DateError),
}

/// A marker that was found but not applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    /// Byte offset of the marker in the buffer at the time it was seen.
    pub position: usize,
    pub reason: SkipReason,
}

/// Result of scanning one buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOutcome {
    pub content: String,
    /// Markers encountered, applied or not.
    pub markers: usize,
    /// Target spans rewritten.
    pub replaced: usize,
    pub skipped: Vec<Skipped>,
}

impl ScanOutcome {
    /// Whether the buffer should be written back.
    ///
    /// True as soon as any marker was seen, even if every occurrence was
    /// skipped.
    pub fn modified(&self) -> bool {
        self.markers > 0
    }
}

/// Growable text buffer with explicit search and splice positions.
///
/// Every position handed out is a byte offset of an ASCII delimiter (or just
/// past one), so slicing and splicing always land on char boundaries.
struct TextBuffer {
    text: String,
}

impl TextBuffer {
    fn find(&self, pattern: &str, from: usize) -> Option<usize> {
        self.text[from..].find(pattern).map(|i| from + i)
    }

    fn slice(&self, start: usize, end: usize) -> &str {
        &self.text[start..end]
    }

    /// Replace `start..end` with `with`; returns the position just past the
    /// inserted text.
    fn splice(&mut self, start: usize, end: usize, with: &str) -> usize {
        self.text.replace_range(start..end, with);
        start + with.len()
    }
}

/// Locate the target span for a directive whose arguments close at `close`.
///
/// Returns the byte range strictly between the next `>` and the `<` after it.
fn target_span(buf: &TextBuffer, close: usize) -> Option<(usize, usize)> {
    let start = buf.find(">", close)? + 1;
    let end = buf.find("<", start)?;
    Some((start, end))
}

/// Resolve every directive in `content`.
///
/// Scanning restarts after each rewritten span; markers inside text that was
/// just inserted are never seen. Malformed occurrences are skipped and the
/// scan always moves past their marker, so the loop terminates on any input.
pub fn apply_directives(
    content: impl Into<String>,
    base: CalendarDate,
    start_index: i64,
) -> ScanOutcome {
    let mut buf = TextBuffer {
        text: content.into(),
    };
    let mut cursor = 0;
    let mut markers = 0;
    let mut replaced = 0;
    let mut skipped = Vec::new();

    while let Some(position) = buf.find(MARKER, cursor) {
        markers += 1;
        let args_start = position + MARKER.len();

        let Some(close) = buf.find(")", args_start) else {
            tracing::debug!(position, "DateReplace directive has no closing parenthesis");
            skipped.push(Skipped {
                position,
                reason: SkipReason::UnclosedArguments,
            });
            cursor = args_start;
            continue;
        };

        let Some((target_start, target_end)) = target_span(&buf, close) else {
            tracing::debug!(position, "No text node found after DateReplace directive");
            skipped.push(Skipped {
                position,
                reason: SkipReason::MissingTarget,
            });
            cursor = args_start;
            continue;
        };

        let directive = match Directive::parse(buf.slice(args_start, close), start_index) {
            Ok(directive) => directive,
            Err(DirectiveError::InvalidDayNumber(raw)) => {
                tracing::warn!(
                    args = buf.slice(args_start, close),
                    day = %raw.trim(),
                    "Invalid day number in DateReplace directive, skipping this instance"
                );
                skipped.push(Skipped {
                    position,
                    reason: SkipReason::InvalidDayNumber(raw),
                });
                cursor = close;
                continue;
            }
        };

        let resolved = directive
            .offset(start_index)
            .and_then(|offset| base.add_days(offset));
        let date = match resolved {
            Ok(date) => date,
            Err(e) => {
                tracing::warn!(error = %e, "DateReplace directive skipped");
                skipped.push(Skipped {
                    position,
                    reason: SkipReason::DateOutOfRange(e),
                });
                cursor = close;
                continue;
            }
        };

        let rendered = template::format(&date, &directive.template);
        tracing::debug!(
            template = %directive.template,
            day = directive.day_number,
            %date,
            rendered = %rendered,
            "Resolved DateReplace directive"
        );
        cursor = buf.splice(target_start, target_end, &rendered);
        replaced += 1;
    }

    ScanOutcome {
        content: buf.text,
        markers,
        replaced,
        skipped,
    }
}

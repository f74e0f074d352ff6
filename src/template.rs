//! Date template rendering.
//!
//! Templates are plain text with single-letter tokens. Longer tokens win over
//! their single-letter prefixes, and text produced by a token is never read
//! again, so a rendered "March" keeps its `M` and "December" keeps its `D`.
//!
//! | Token | Output | Example |
//! |-------|--------|---------|
//! | `YYYY` | year | `2024` |
//! | `MM` | month name | `January` |
//! | `NN` | weekday name | `Monday` |
//! | `DD` | day of month, two digits | `05` |
//! | `Y` | year | `2024` |
//! | `M` | month abbreviation | `Jan` |
//! | `N` | weekday abbreviation | `Mon` |
//! | `D` | day of month | `5` |
//!
//! Matching is case-sensitive and there is no escape syntax: every `D` in a
//! template is a day token.

use crate::date::CalendarDate;

/// Token kinds in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    YearLong,
    MonthName,
    WeekdayName,
    DayPadded,
    Year,
    MonthAbbr,
    WeekdayAbbr,
    Day,
}

/// Precedence table: at any position the first matching entry wins.
const TOKENS: &[(&str, Token)] = &[
    ("YYYY", Token::YearLong),
    ("MM", Token::MonthName),
    ("NN", Token::WeekdayName),
    ("DD", Token::DayPadded),
    ("Y", Token::Year),
    ("M", Token::MonthAbbr),
    ("N", Token::WeekdayAbbr),
    ("D", Token::Day),
];

impl Token {
    fn render(self, date: &CalendarDate, out: &mut String) {
        match self {
            Token::YearLong | Token::Year => out.push_str(&date.year().to_string()),
            Token::MonthName => out.push_str(date.month_name()),
            Token::WeekdayName => out.push_str(date.weekday_name()),
            Token::DayPadded => out.push_str(&format!("{:02}", date.day())),
            Token::MonthAbbr => out.push_str(&date.month_name()[..3]),
            Token::WeekdayAbbr => out.push_str(&date.weekday_name()[..3]),
            Token::Day => out.push_str(&date.day().to_string()),
        }
    }
}

/// Render `date` through `template`.
///
/// ```
/// use course_redate::date::CalendarDate;
/// use course_redate::template::format;
///
/// let date = CalendarDate::from_ymd(2024, 1, 19).unwrap();
/// assert_eq!(format(&date, "MM DD, YYYY"), "January 19, 2024");
/// assert_eq!(format(&date, "N M D"), "Fri Jan 19");
/// ```
pub fn format(date: &CalendarDate, template: &str) -> String {
    let mut out = String::with_capacity(template.len() + 16);
    let mut rest = template;

    'scan: while !rest.is_empty() {
        for (pattern, token) in TOKENS {
            if let Some(after) = rest.strip_prefix(pattern) {
                token.render(date, &mut out);
                rest = after;
                continue 'scan;
            }
        }
        // Not a token: copy one char through
        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            out.push(c);
        }
        rest = chars.as_str();
    }

    out
}

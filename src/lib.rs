//! # Course Redate
//!
//! Re-dates an exported course package (IMS Common Cartridge, `.imscc`) for a
//! new term. Authors mark dates in their pages with directives:
//!
//! ```html
//! <span title="DateReplace(NN, MM DD, 12)">Friday, September 8</span>
//! ```
//!
//! Given the first day of the term and the day number the course counts from,
//! every directive's text node is rewritten with `start + (12 - index)` days.
//!
//! # Architecture: Unpack → Rewrite → Repack
//!
//! ```text
//! 1. Unpack    package.imscc  →  work dir           (external unzip)
//! 2. Rewrite   work dir       →  work dir           (text files, in place)
//! 3. Repack    work dir       →  package_updated    (external zip)
//! ```
//!
//! Only step 2 has real logic, and it is a pure function from text to text:
//! [`directive::apply_directives`] scans for `DateReplace(` markers, resolves
//! each with [`date::CalendarDate::add_days`], renders it through
//! [`template::format`], and splices it into the buffer.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`date`] | Calendar arithmetic and start-date parsing |
//! | [`template`] | `YYYY`/`MM`/`NN`/`DD`/`Y`/`M`/`N`/`D` token rendering |
//! | [`directive`] | Marker scanning, argument parsing, target-span splicing |
//! | [`process`] | Walks the unpacked tree and rewrites text files in parallel |
//! | [`archive`] | `unzip`/`zip` backend and default output naming |
//! | [`pipeline`] | Unpack → process → repack orchestration |
//! | [`config`] | Optional TOML config: extensions, archive commands, workers |
//! | [`output`] | CLI report formatting |
//!
//! # Design Decisions
//!
//! ## Positional, Not Structural
//!
//! A directive's target is found by delimiter search (`)` then `>` then `<`),
//! not by parsing HTML. Course exports mix HTML, XML and escaped markup, and
//! the positional rule behaves the same on all of them. The cost is that
//! irregular markup can retarget a directive; see [`directive`].
//!
//! ## Markers Survive
//!
//! Only the text node is rewritten. The directive stays in the page, so next
//! term's run finds it again and overwrites last term's date.
//!
//! ## External Archive Tools
//!
//! Zip handling is left to the system `unzip`/`zip` so packages round-trip
//! exactly as those tools produce them. The commands are configurable and sit
//! behind [`archive::ArchiveBackend`].

pub mod archive;
pub mod config;
pub mod date;
pub mod directive;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod template;

#[cfg(test)]
pub(crate) mod test_helpers;

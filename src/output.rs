//! CLI output formatting for a re-dating run.
//!
//! Output is a short inventory of what changed, grouped by outcome:
//!
//! ```text
//! Rewritten
//! 001 web_resources/syllabus.htm (1 date)
//! 002 wiki_content/unit-2-cells.html (2 dates, 1 skipped)
//!
//! Failed
//! 001 wiki_content/legacy.html
//!     read failed: Permission denied (os error 13)
//!
//! Rewrote 3 dates in 2 files (3 unchanged, 1 failed, 1 ignored)
//! Output: course_updated.imscc
//! ```
//!
//! Unchanged files are counted but not listed. Each format function returns
//! `Vec<String>` (or a `String` for JSON) and has no side effects; the
//! `print_*` wrappers write to stdout.

use crate::pipeline::RunSummary;
use crate::process::{FileStatus, TreeReport};

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

/// Header line for a rewritten file.
///
/// ```text
/// 001 wiki_content/unit-1-overview.html (2 dates)
/// 002 wiki_content/unit-2-cells.html (1 date, 1 skipped)
/// ```
fn rewritten_line(index: usize, path: &str, replaced: usize, skipped: usize) -> String {
    let dates = plural(replaced, "date", "dates");
    if skipped == 0 {
        format!("{} {} ({})", format_index(index), path, dates)
    } else {
        format!("{} {} ({}, {} skipped)", format_index(index), path, dates, skipped)
    }
}

/// Format the per-file section of a run.
pub fn format_tree_report(report: &TreeReport) -> Vec<String> {
    let mut lines = Vec::new();

    let rewritten: Vec<_> = report.rewritten().collect();
    if !rewritten.is_empty() {
        lines.push("Rewritten".to_string());
        for (i, file) in rewritten.iter().enumerate() {
            if let FileStatus::Rewritten {
                replaced, skipped, ..
            } = file.status
            {
                lines.push(rewritten_line(i + 1, &file.path, replaced, skipped));
            }
        }
    }

    let failed: Vec<_> = report.failed().collect();
    if !failed.is_empty() {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push("Failed".to_string());
        for (i, file) in failed.iter().enumerate() {
            lines.push(format!("{} {}", format_index(i + 1), file.path));
            if let FileStatus::Failed { error } = &file.status {
                lines.push(format!("{}{}", indent(1), error));
            }
        }
    }

    lines
}

/// Totals line for a run.
pub fn format_totals(report: &TreeReport) -> String {
    let rewritten = report.rewritten().count();
    let failed = report.failed().count();
    let unchanged = report.files.len() - rewritten - failed;
    format!(
        "Rewrote {} in {} ({} unchanged, {} failed, {} ignored)",
        plural(report.dates_replaced(), "date", "dates"),
        plural(rewritten, "file", "files"),
        unchanged,
        failed,
        report.ignored
    )
}

/// Full human-readable summary of a run.
pub fn format_run_output(summary: &RunSummary) -> Vec<String> {
    let mut lines = format_tree_report(&summary.tree);
    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.push(format_totals(&summary.tree));
    lines.push(format!("Output: {}", summary.output.display()));
    if let Some(dir) = &summary.work_dir {
        lines.push(format!("Work dir: {}", dir.display()));
    }
    lines
}

/// Machine-readable summary of a run.
pub fn format_json(summary: &RunSummary) -> serde_json::Result<String> {
    serde_json::to_string_pretty(summary)
}

pub fn print_run_output(summary: &RunSummary) {
    for line in format_run_output(summary) {
        println!("{}", line);
    }
}

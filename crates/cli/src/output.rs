//! Console rendering of check results

use colored::Colorize;
use pmapi_verify::{Check, Detail, Reporter, Section, SuiteSummary, Verdict};

/// Plain-text lines for one check, without color. Every entry is a single
/// terminal line.
pub fn check_lines(check: &Check) -> Vec<String> {
    let tag = match check.verdict {
        Verdict::Pass => "[PASS]",
        Verdict::Fail => "[FAIL]",
        Verdict::Skip => "[SKIP]",
    };

    match &check.detail {
        Detail::Status {
            status,
            expected,
            body,
        } => {
            let mut lines = if check.verdict == Verdict::Pass {
                vec![format!("{tag} {} (Status: {status})", check.name)]
            } else {
                let expected = expected
                    .iter()
                    .map(u16::to_string)
                    .collect::<Vec<_>>()
                    .join("|");
                vec![format!("{tag} {} (Status: {status}, Expected: {expected})", check.name)]
            };
            if let Some(body) = body {
                let response = format!("Response: {}", body.pretty());
                lines.extend(response.lines().map(str::to_string));
            }
            lines
        }
        Detail::Value { expected, observed } => {
            let observed = observed.as_deref().unwrap_or("<missing>");
            if check.verdict == Verdict::Pass {
                vec![format!("{tag} {}: {observed}", check.name)]
            } else {
                vec![format!("{tag} {}: observed {observed}, expected {expected}", check.name)]
            }
        }
        Detail::Condition { note } if note.is_empty() => vec![format!("{tag} {}", check.name)],
        Detail::Condition { note } => vec![format!("{tag} {} ({note})", check.name)],
        Detail::Skipped { reason } => vec![format!("{tag} {} ({reason})", check.name)],
    }
}

/// Writes results to stdout as sections complete
pub struct ConsoleReporter;

/// Forced color setting, if any. Without `--no-color` colored keeps its own
/// TTY and `NO_COLOR` detection.
fn color_override(no_color: bool) -> Option<bool> {
    no_color.then_some(false)
}

impl ConsoleReporter {
    pub fn new(no_color: bool) -> Self {
        if let Some(color) = color_override(no_color) {
            colored::control::set_override(color);
        }
        Self
    }
}

impl Reporter for ConsoleReporter {
    fn section(&mut self, section: &Section) {
        println!();
        println!("{}", format!("--- {} ---", section.title).bold());

        for check in &section.checks {
            let mut lines = check_lines(check).into_iter();
            if let Some(first) = lines.next() {
                let first = match check.verdict {
                    Verdict::Pass => first.green(),
                    Verdict::Fail => first.red(),
                    Verdict::Skip => first.yellow(),
                };
                println!("  {first}");
            }
            for line in lines {
                println!("    {}", line.dimmed());
            }
        }
    }

    fn summary(&mut self, summary: &SuiteSummary) {
        println!();
        if !summary.approvals.is_empty() {
            println!("{}", "--- Approval Summary ---".bold());
            for approval in &summary.approvals {
                let mark = if approval.passed { "✓".green() } else { "✗".red() };
                println!("  {} {} {}", mark, approval.entity_type, approval.detail.dimmed());
            }
            println!();
        }

        let totals = format!(
            "{} passed, {} failed, {} skipped ({} ms)",
            summary.passed, summary.failed, summary.skipped, summary.duration_ms
        );
        if summary.success() {
            println!("{} {}", "--- All Verifications Complete ---".bold(), totals.green());
        } else {
            println!("{} {}", "--- Verifications Complete ---".bold(), totals.red());
        }
    }
}

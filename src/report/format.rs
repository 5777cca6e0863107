//! Terminal summaries and the optional JSON run summary.
//!
//! Formatting lives here so the checks only build data.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;

use super::{CheckReport, Tally};

/// How many failing identifiers the failure message lists before truncating.
const MAX_LISTED_FAILURES: usize = 10;

/// Summary printed after a check ran and its reports were written.
pub fn format_summary(report: &CheckReport, written: &[PathBuf]) -> String {
    let mut out = String::new();
    let t = &report.tally;

    out.push_str(&format!("=== catcheck {} ===\n", report.check));
    out.push_str(&format!("Input: {}\n", report.subject));
    out.push_str(&format!(
        "Completed {} {}(s) → {} passed, {} failed, {} skipped.\n",
        t.total(),
        report.unit,
        t.pass,
        t.fail,
        t.skip
    ));
    for note in &report.notes {
        out.push_str(&format!("- {note}\n"));
    }
    for path in written {
        out.push_str(&format!("Report written to: {}\n", path.display()));
    }
    out
}

/// Message carried by the failing `AppError`.
pub fn failure_message(report: &CheckReport, strict: bool) -> String {
    let mut msg = String::new();
    let t = &report.tally;

    if t.fail > 0 {
        let listed: Vec<&str> = report
            .failures
            .iter()
            .take(MAX_LISTED_FAILURES)
            .map(String::as_str)
            .collect();
        msg.push_str(&format!(
            "{}: {} failing {}(s): {}",
            report.check,
            t.fail,
            report.unit,
            listed.join(", ")
        ));
        if report.failures.len() > MAX_LISTED_FAILURES {
            msg.push_str(&format!(", ... ({} more)", report.failures.len() - MAX_LISTED_FAILURES));
        }
    }
    for violation in &report.violations {
        if !msg.is_empty() {
            msg.push('\n');
        }
        msg.push_str(&format!("{}: {violation}", report.check));
    }
    if strict && t.skip > 0 {
        if !msg.is_empty() {
            msg.push('\n');
        }
        msg.push_str(&format!(
            "{}: {} {}(s) skipped (unparseable values; --strict)",
            report.check, t.skip, report.unit
        ));
    }
    if let Some(file) = report.primary_file() {
        msg.push_str(&format!("\nSee '{file}' for details."));
    }
    msg
}

/// Machine-readable summary (`--summary-json`).
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub tool: String,
    pub check: String,
    pub input: String,
    pub generated: DateTime<Local>,
    pub tally: Tally,
    pub failed: bool,
    pub failures: Vec<String>,
    pub violations: Vec<String>,
    pub reports: Vec<String>,
}

impl RunSummary {
    pub fn new(report: &CheckReport, written: &[PathBuf], strict: bool) -> Self {
        Self {
            tool: "catcheck".to_string(),
            check: report.check.to_string(),
            input: report.subject.clone(),
            generated: Local::now(),
            tally: report.tally,
            failed: report.failed(strict),
            failures: report.failures.clone(),
            violations: report.violations.clone(),
            reports: written.iter().map(|p| display_path(p)).collect(),
        }
    }
}

fn display_path(path: &Path) -> String {
    path.display().to_string()
}

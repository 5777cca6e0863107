//! Report model shared by all checks.
//!
//! A check produces one `CheckReport`: the report tables to write, pass/fail/skip
//! counts, and the identifiers of failing rows for the terminal message.

pub mod format;

pub use format::*;

use crate::domain::{Status, WriteMode};

/// One CSV report file: fixed column schema plus rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportTable {
    pub file_name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub mode: WriteMode,
}

impl ReportTable {
    pub fn new(file_name: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            file_name: file_name.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
            mode: WriteMode::Overwrite,
        }
    }

    pub fn with_columns(file_name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            file_name: file_name.into(),
            columns,
            rows: Vec::new(),
            mode: WriteMode::Overwrite,
        }
    }

    pub fn appending(mut self) -> Self {
        self.mode = WriteMode::Append;
        self
    }

    pub fn push(&mut self, row: Vec<String>) {
        debug_assert_eq!(row.len(), self.columns.len(), "report row width mismatch");
        self.rows.push(row);
    }

    /// Value of `column` in row `row` (test and summary helper).
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.get(col).map(String::as_str)
    }
}

/// Outcome counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct Tally {
    pub pass: usize,
    pub fail: usize,
    pub skip: usize,
}

impl Tally {
    pub fn record(&mut self, status: Status) {
        match status {
            Status::Pass => self.pass += 1,
            Status::Fail => self.fail += 1,
            Status::Skip => self.skip += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.pass + self.fail + self.skip
    }
}

#[derive(Debug, Clone)]
pub struct CheckReport {
    /// Subcommand name, e.g. `dimm-ranks`.
    pub check: &'static str,
    /// What was checked (usually the input path).
    pub subject: String,
    /// What a tallied unit is: `row`, `group`, `file`.
    pub unit: &'static str,
    pub tables: Vec<ReportTable>,
    pub tally: Tally,
    /// Identifiers of failing rows/groups, in report order.
    pub failures: Vec<String>,
    /// File-level failures that are not a tallied unit.
    pub violations: Vec<String>,
    /// Extra lines for the terminal summary.
    pub notes: Vec<String>,
}

impl CheckReport {
    pub fn new(check: &'static str, subject: impl Into<String>, unit: &'static str) -> Self {
        Self {
            check,
            subject: subject.into(),
            unit,
            tables: Vec::new(),
            tally: Tally::default(),
            failures: Vec::new(),
            violations: Vec::new(),
            notes: Vec::new(),
        }
    }

    /// Count an outcome; `ident` is only built for failures.
    pub fn record(&mut self, status: Status, ident: impl FnOnce() -> String) {
        self.tally.record(status);
        if status == Status::Fail {
            self.failures.push(ident());
        }
    }

    pub fn note(&mut self, line: impl Into<String>) {
        self.notes.push(line.into());
    }

    /// Fail the run without counting another row/group.
    pub fn violation(&mut self, message: impl Into<String>) {
        self.violations.push(message.into());
    }

    /// Whether the run must be reported as failed.
    pub fn failed(&self, strict: bool) -> bool {
        self.tally.fail > 0 || !self.violations.is_empty() || (strict && self.tally.skip > 0)
    }

    /// The primary report file (first table), if any.
    pub fn primary_file(&self) -> Option<&str> {
        self.tables.first().map(|t| t.file_name.as_str())
    }

    pub fn table(&self, file_name: &str) -> Option<&ReportTable> {
        self.tables.iter().find(|t| t.file_name == file_name)
    }
}

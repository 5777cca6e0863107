//! Shared "check pipeline" logic: load → check → write reports → verdict.
//!
//! Every subcommand differs only in the check it runs; loading inputs,
//! writing reports and deciding the exit status live here so the ordering
//! (reports first, failure last) holds for all of them.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::domain::{RunConfig, Table};
use crate::error::AppError;
use crate::io::{load_table, write_report, write_summary_json};
use crate::report::{CheckReport, RunSummary, failure_message, format_summary};

/// A finished check together with the report files it produced.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub report: CheckReport,
    pub written: Vec<PathBuf>,
}

impl RunOutput {
    pub fn failed(&self, strict: bool) -> bool {
        self.report.failed(strict)
    }
}

/// Load one input file, surfacing malformed records.
pub fn load_input(path: &Path) -> Result<Table, AppError> {
    let table = load_table(path)?;
    info!(path = %path.display(), rows = table.len(), "input loaded");
    if !table.row_errors.is_empty() {
        warn!(
            count = table.row_errors.len(),
            "some records held undecodable bytes and were read lossily"
        );
    }
    Ok(table)
}

/// Loads a check's inputs and remembers their row errors for the report.
#[derive(Debug, Default)]
pub struct Loader {
    notes: Vec<String>,
}

impl Loader {
    pub fn load(&mut self, path: &Path) -> Result<Table, AppError> {
        let table = load_input(path)?;
        for err in &table.row_errors {
            self.notes.push(format!("{} line {}: {}", table.source.display(), err.line, err.message));
        }
        Ok(table)
    }

    /// Move the collected row errors into the report's notes.
    pub fn annotate(self, report: &mut CheckReport) {
        report.notes.extend(self.notes);
    }
}

/// Write every report table of `report` (and the JSON summary when asked).
pub fn publish(config: &RunConfig, report: CheckReport) -> Result<RunOutput, AppError> {
    let mut written = Vec::with_capacity(report.tables.len());
    for table in &report.tables {
        written.push(write_report(&config.out_dir, table)?);
    }

    if let Some(path) = &config.summary_json {
        let summary = RunSummary::new(&report, &written, config.strict);
        write_summary_json(path, &summary)?;
        written.push(path.clone());
    }

    Ok(RunOutput { report, written })
}

/// Publish, print the summary, and turn violations into an error.
pub fn finish(config: &RunConfig, report: CheckReport) -> Result<RunOutput, AppError> {
    let output = publish(config, report)?;
    println!("{}", format_summary(&output.report, &output.written));

    if output.failed(config.strict) {
        return Err(AppError::violations(failure_message(&output.report, config.strict)));
    }
    Ok(output)
}

//! Write report tables and the JSON run summary.
//!
//! Reports are plain CSV so they open directly in a spreadsheet.

use std::fs::{File, OpenOptions, create_dir_all};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::domain::WriteMode;
use crate::error::AppError;
use crate::report::{ReportTable, RunSummary};

/// Write one report table into `out_dir` and return the full path.
pub fn write_report(out_dir: &Path, table: &ReportTable) -> Result<PathBuf, AppError> {
    create_dir_all(out_dir).map_err(|e| {
        AppError::output(format!("Failed to create report dir '{}': {e}", out_dir.display()))
    })?;

    let path = out_dir.join(&table.file_name);
    let (file, write_header) = match table.mode {
        WriteMode::Overwrite => {
            let file = File::create(&path).map_err(|e| {
                AppError::output(format!("Failed to create report '{}': {e}", path.display()))
            })?;
            (file, true)
        }
        WriteMode::Append => {
            // Header only on first write so repeated runs build one log.
            let existed = path.is_file();
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|e| {
                    AppError::output(format!("Failed to open report '{}': {e}", path.display()))
                })?;
            (file, !existed)
        }
    };

    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
    if write_header {
        writer
            .write_record(&table.columns)
            .map_err(|e| AppError::output(format!("Failed to write report header: {e}")))?;
    }
    for row in &table.rows {
        writer
            .write_record(row)
            .map_err(|e| AppError::output(format!("Failed to write report row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::output(format!("Failed to flush report '{}': {e}", path.display())))?;

    info!(path = %path.display(), rows = table.rows.len(), "report written");
    Ok(path)
}

/// Write the JSON run summary.
pub fn write_summary_json(path: &Path, summary: &RunSummary) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir_all(parent).map_err(|e| {
            AppError::output(format!("Failed to create summary dir '{}': {e}", parent.display()))
        })?;
    }
    let file = File::create(path)
        .map_err(|e| AppError::output(format!("Failed to create summary JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, summary)
        .map_err(|e| AppError::output(format!("Failed to write summary JSON: {e}")))?;
    Ok(())
}

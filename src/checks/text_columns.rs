//! Per-cell text rules over one or more columns.

use crate::domain::{Status, Table, TextRule};
use crate::error::AppError;
use crate::report::{CheckReport, ReportTable};
use crate::rules::text::check_text;

use super::{column_index, header_name, subject};

pub const REPORT_FILE: &str = "text_column_report.csv";

/// Apply `rule` to every cell of each named column. One report row per cell,
/// ordered by row then column.
pub fn run(table: &Table, columns: &[String], rule: TextRule) -> Result<CheckReport, AppError> {
    if columns.is_empty() {
        return Err(AppError::input("No columns given for the text check"));
    }
    let names: Vec<&str> = columns.iter().map(String::as_str).collect();
    table.require_columns(&names)?;
    let cols = names
        .iter()
        .map(|name| column_index(table, name))
        .collect::<Result<Vec<_>, _>>()?;

    let mut out = ReportTable::new(REPORT_FILE, &["row_index", "column", "value", "status", "reason"]);
    let mut report = CheckReport::new("text", subject(table), "cell");

    for idx in 0..table.len() {
        for &col in &cols {
            let column = header_name(table, col);
            let value = table.cell_at(idx, col);
            let (status, reason) = match check_text(rule, value) {
                Ok(()) => (Status::Pass, ""),
                Err(reason) => (Status::Fail, reason),
            };
            report.record(status, || format!("row {idx} {column}: {reason}"));
            out.push(vec![
                idx.to_string(),
                column,
                value.to_string(),
                status.to_string(),
                reason.to_string(),
            ]);
        }
    }

    report.note(format!("Rule: {}", rule_name(rule)));
    report.tables.push(out);
    Ok(report)
}

fn rule_name(rule: TextRule) -> &'static str {
    match rule {
        TextRule::Charset => "charset",
        TextRule::Alphabetic => "alphabetic",
        TextRule::Present => "present",
    }
}

//! Required-column check for a brand's export.

use std::collections::BTreeSet;

use tracing::info;

use crate::domain::Table;
use crate::error::AppError;
use crate::report::{CheckReport, ReportTable};
use crate::rules::{Relation, RuleBook, compare_sets};

use super::subject;

pub const REPORT_FILE: &str = "validation_results.csv";

/// Compare the file's headers with the brand's required columns.
///
/// The brand comes from `brand` or, failing that, from the file name. The
/// result row is appended to [`REPORT_FILE`] so one report can collect many
/// files.
pub fn run(table: &Table, brand: Option<&str>, rules: &RuleBook) -> Result<CheckReport, AppError> {
    let brand = match brand {
        Some(b) => b.trim().to_lowercase(),
        None => rules.infer_brand(&table.source).ok_or_else(|| {
            AppError::input(format!(
                "Could not infer brand from file name '{}'; pass --brand",
                table.source.display()
            ))
        })?,
    };
    let expected = rules
        .required_columns_for(&brand)
        .ok_or_else(|| AppError::input(format!("Unknown brand `{brand}`")))?;
    info!(brand = %brand, required = expected.len(), "checking columns");

    let actual: BTreeSet<String> = table
        .normalized_headers()
        .into_iter()
        .filter(|h| !h.is_empty())
        .collect();
    let cmp = compare_sets(&expected, &actual, Relation::Equal);
    let result = cmp.describe();

    let file = table
        .source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| subject(table));

    let mut out = ReportTable::new(REPORT_FILE, &["file", "brand", "result"]).appending();
    out.push(vec![file.clone(), brand.clone(), result.clone()]);

    let mut report = CheckReport::new("columns", subject(table), "file");
    report.record(cmp.status, || format!("{file}: {result}"));
    report.note(format!("Brand: {brand}"));
    report.tables.push(out);
    Ok(report)
}

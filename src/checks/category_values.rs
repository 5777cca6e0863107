//! Per-row `category` value check.

use std::collections::BTreeSet;

use crate::domain::{Status, Table};
use crate::error::AppError;
use crate::report::{CheckReport, ReportTable};
use crate::rules::RuleBook;
use crate::rules::consistency::join;

use super::{column_index, subject};

pub const REPORT_FILE: &str = "invalid_category_rows.csv";

/// Every row's trimmed `category` must be one of the valid categories; blank
/// is invalid. With `require_all`, each valid category must also occur at
/// least once in the file.
pub fn run(table: &Table, rules: &RuleBook, require_all: bool) -> Result<CheckReport, AppError> {
    table.require_columns(&["category"])?;
    let cat_col = column_index(table, "category")?;
    let label_col = table.column("A");
    let valid = rules.valid_category_set();

    let mut out = ReportTable::new(REPORT_FILE, &["row_index", "A", "category", "status"]);
    let mut report = CheckReport::new("category-values", subject(table), "row");
    let mut seen = BTreeSet::new();

    for idx in 0..table.len() {
        let category = table.cell_at(idx, cat_col).trim();
        let label = label_col.map(|c| table.cell_at(idx, c)).unwrap_or("");
        let status = Status::from_pass(!category.is_empty() && valid.contains(category));
        if status == Status::Pass {
            seen.insert(category.to_string());
        }
        out.push(vec![
            idx.to_string(),
            label.to_string(),
            category.to_string(),
            status.to_string(),
        ]);
        report.record(status, || {
            if category.is_empty() {
                format!("row {idx}: blank category")
            } else {
                format!("row {idx}: {category}")
            }
        });
    }

    if require_all {
        let absent: BTreeSet<String> = valid.difference(&seen).cloned().collect();
        if !absent.is_empty() {
            let listed = join(&absent, ", ");
            report.note(format!("Categories never used: {listed}"));
            report.violation(format!("{} valid categor(ies) never used: {listed}", absent.len()));
        }
    }

    report.tables.push(out);
    Ok(report)
}

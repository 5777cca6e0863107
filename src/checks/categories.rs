//! Store-level category coverage check.

use std::collections::BTreeSet;

use crate::domain::Table;
use crate::error::AppError;
use crate::report::{CheckReport, ReportTable};
use crate::rules::consistency::join;
use crate::rules::{Relation, RuleBook, compare_sets};

use super::subject;

pub const REPORT_FILE: &str = "missing_categories_report.csv";

/// The categories present in the file must be exactly those the store is
/// expected to carry.
///
/// The store column is the first header containing `store`, the category
/// column the first containing `cat`; the store is read from the first row.
pub fn run(table: &Table, rules: &RuleBook) -> Result<CheckReport, AppError> {
    let store_col = table.find_column_containing("store").ok_or_else(|| {
        AppError::input(format!("No column with 'store' in header in '{}'", table.source.display()))
    })?;
    let cat_col = table.find_column_containing("cat").ok_or_else(|| {
        AppError::input(format!("No column with 'cat' in header in '{}'", table.source.display()))
    })?;
    if table.is_empty() {
        return Err(AppError::input(format!("No data rows in '{}'", table.source.display())));
    }

    let store = table.cell_at(0, store_col).trim().to_lowercase();
    let actual: BTreeSet<String> = (0..table.len())
        .map(|idx| table.cell_at(idx, cat_col).trim().to_lowercase())
        .filter(|c| !c.is_empty() && c != "nan")
        .collect();
    let expected = rules.expected_categories(&store);

    let cmp = compare_sets(&expected, &actual, Relation::Equal);
    let result = match (cmp.missing.is_empty(), cmp.extra.is_empty()) {
        (true, true) => "all pass".to_string(),
        (false, true) => format!("missing: {}", join(&cmp.missing, ", ")),
        (true, false) => format!("extra: {}", join(&cmp.extra, ", ")),
        (false, false) => format!("category mismatch; {}", cmp.describe()),
    };

    let mut out = ReportTable::new(REPORT_FILE, &["store", "result"]);
    out.push(vec![store.clone(), result.clone()]);

    let mut report = CheckReport::new("categories", subject(table), "store");
    report.record(cmp.status, || format!("{store}: {result}"));
    if expected.is_empty() {
        report.note(format!("Store `{store}` has no expected categories."));
    }
    report.tables.push(out);
    Ok(report)
}

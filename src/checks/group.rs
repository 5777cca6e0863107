//! Distinct values of one column grouped by another (e.g. brand → products).

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::{Status, Table, is_missing};
use crate::error::AppError;
use crate::report::{CheckReport, ReportTable};
use crate::rules::consistency::join;

use super::{header_name, subject};

pub const REPORT_FILE: &str = "unique_products_by_brand.csv";

/// Group by `key` (default: first column) and collect the distinct values of
/// `values` (default: second column). Summary only; never fails.
pub fn run(table: &Table, key: Option<&str>, values: Option<&str>) -> Result<CheckReport, AppError> {
    let key_col = pick_column(table, key, 0)?;
    let value_col = pick_column(table, values, 1)?;

    let mut groups: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for idx in 0..table.len() {
        let k = table.cell_at(idx, key_col).trim();
        if is_missing(k) {
            continue;
        }
        let set = groups.entry(k.to_string()).or_default();
        let v = table.cell_at(idx, value_col).trim();
        if !is_missing(v) {
            set.insert(v.to_string());
        }
    }

    let key_name = header_name(table, key_col);
    let value_name = header_name(table, value_col);
    let mut out = ReportTable::with_columns(REPORT_FILE, vec![key_name.clone(), value_name]);
    let mut report = CheckReport::new("group", subject(table), "group");
    for (k, set) in &groups {
        out.push(vec![k.clone(), join(set, ", ")]);
        report.record(Status::Pass, String::new);
    }

    report.note(format!("{} distinct `{key_name}` value(s).", groups.len()));
    report.tables.push(out);
    Ok(report)
}

fn pick_column(table: &Table, name: Option<&str>, fallback: usize) -> Result<usize, AppError> {
    match name {
        Some(name) => {
            table.require_columns(&[name])?;
            super::column_index(table, name)
        }
        None if fallback < table.headers.len() => Ok(fallback),
        None => Err(AppError::input(format!(
            "'{}' needs at least {} column(s) to group",
            table.source.display(),
            fallback + 1
        ))),
    }
}

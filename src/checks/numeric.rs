//! Numeric-field sanity check (`speed`, `ranks`, `rank_width` by default).

use crate::domain::{Status, Table, is_missing, parse_number};
use crate::error::AppError;
use crate::report::{CheckReport, ReportTable};

use super::{column_index, subject};

pub const REPORT_FILE: &str = "test_report_speed_rank_rankwidth.csv";

pub const DEFAULT_COLUMNS: [&str; 3] = ["speed", "ranks", "rank_width"];

/// Per row, each cell must be numeric or missing, and non-negative or missing.
///
/// Missing columns do not abort the run: a single `check, status, details`
/// row is reported instead and the check fails.
pub fn run(table: &Table, columns: &[String]) -> Result<CheckReport, AppError> {
    let mut report = CheckReport::new("numeric", subject(table), "row");

    let wanted: Vec<&str> = columns.iter().map(String::as_str).collect();
    let missing = table.missing_columns(&wanted);
    if !missing.is_empty() {
        let details = format!("Missing column(s): {}", missing.join(", "));
        let mut out = ReportTable::new(REPORT_FILE, &["check", "status", "details"]);
        out.push(vec!["columns_exist".to_string(), Status::Fail.to_string(), details.clone()]);
        report.record(Status::Fail, || details);
        report.unit = "check";
        report.tables.push(out);
        return Ok(report);
    }

    let cols = wanted
        .iter()
        .map(|name| column_index(table, name))
        .collect::<Result<Vec<_>, _>>()?;

    let mut header = vec!["row_index".to_string()];
    header.extend(columns.iter().cloned());
    for name in columns {
        header.push(format!("{name}_is_numeric"));
        header.push(format!("{name}_non_negative"));
    }
    header.push("overall_status".to_string());
    let mut out = ReportTable::with_columns(REPORT_FILE, header);

    for idx in 0..table.len() {
        let mut row = vec![idx.to_string()];
        let mut verdicts = Vec::with_capacity(cols.len() * 2);
        for &col in &cols {
            let value = table.cell_at(idx, col);
            row.push(value.to_string());
            verdicts.extend(judge(value));
        }
        let overall = Status::from_pass(verdicts.iter().all(|s| *s != Status::Fail));
        row.extend(verdicts.iter().map(|s| s.to_string()));
        row.push(overall.to_string());
        out.push(row);

        report.record(overall, || format!("row {idx}"));
    }

    report.tables.push(out);
    Ok(report)
}

/// `[is_numeric, non_negative]`; sign is not judged for non-numeric text.
fn judge(value: &str) -> [Status; 2] {
    if is_missing(value) {
        return [Status::Pass, Status::Pass];
    }
    match parse_number(value) {
        Some(v) => [Status::Pass, Status::from_pass(v >= 0.0)],
        None => [Status::Fail, Status::Skip],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::fixtures::table;

    fn defaults() -> Vec<String> {
        DEFAULT_COLUMNS.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn per_row_sub_checks() {
        let t = table(
            "cisco.csv",
            &["speed", "ranks", "rank_width"],
            &[
                &["3200", "2", "4"],
                &["", "nan", "8"],
                &["-4800", "1", "4"],
                &["fast", "1", "4"],
            ],
        );
        let report = run(&t, &defaults()).unwrap();
        let out = report.table(REPORT_FILE).unwrap();

        assert_eq!(out.columns.len(), 1 + 3 + 6 + 1);
        assert_eq!(out.value(0, "overall_status"), Some("PASS"));
        assert_eq!(out.value(1, "overall_status"), Some("PASS"));
        assert_eq!(out.value(2, "speed_non_negative"), Some("FAIL"));
        assert_eq!(out.value(2, "speed_is_numeric"), Some("PASS"));
        assert_eq!(out.value(3, "speed_is_numeric"), Some("FAIL"));
        assert_eq!(out.value(3, "speed_non_negative"), Some("SKIP"));
        assert_eq!(out.value(3, "overall_status"), Some("FAIL"));
        assert_eq!(report.tally.pass, 2);
        assert_eq!(report.failures, vec!["row 2", "row 3"]);
    }

    #[test]
    fn missing_columns_write_degenerate_report() {
        let t = table("cisco.csv", &["speed"], &[&["3200"]]);
        let report = run(&t, &defaults()).unwrap();
        let out = report.table(REPORT_FILE).unwrap();
        assert_eq!(out.columns, vec!["check", "status", "details"]);
        assert_eq!(out.value(0, "details"), Some("Missing column(s): ranks, rank_width"));
        assert!(report.failed(false));
    }

    #[test]
    fn custom_column_list() {
        let t = table("x.csv", &["voltage"], &[&["1.2"], &["-1"]]);
        let report = run(&t, &["voltage".to_string()]).unwrap();
        assert_eq!(report.tally.fail, 1);
        let out = report.table(REPORT_FILE).unwrap();
        assert_eq!(out.columns, vec!["row_index", "voltage", "voltage_is_numeric", "voltage_non_negative", "overall_status"]);
    }
}

//! Part-number format check.

use crate::domain::{Status, Table, is_missing};
use crate::error::AppError;
use crate::report::{CheckReport, ReportTable};
use crate::rules::FormatValidator;

use super::{column_index, header_name, subject};

pub const REPORT_FILE: &str = "invalid_part_numbers_report.csv";

/// Validate every cell of `column` against `validator`.
///
/// `context` names an optional column echoed into the report (e.g. `A`) when
/// the file has it.
pub fn run(
    table: &Table,
    column: &str,
    validator: &FormatValidator,
    context: Option<&str>,
) -> Result<CheckReport, AppError> {
    table.require_columns(&[column])?;
    let col = column_index(table, column)?;
    let context_col = context.and_then(|name| table.column(name));

    let mut columns = vec!["row_index".to_string()];
    if let Some(c) = context_col {
        columns.push(header_name(table, c));
    }
    columns.push(header_name(table, col));
    columns.push("status".to_string());
    let mut out = ReportTable::with_columns(REPORT_FILE, columns);

    let mut report = CheckReport::new("part-number", subject(table), "row");
    for idx in 0..table.len() {
        let value = table.cell_at(idx, col);
        let status = Status::from_pass(is_missing(value) || validator.is_valid(value));

        let mut row = vec![idx.to_string()];
        if let Some(c) = context_col {
            row.push(table.cell_at(idx, c).to_string());
        }
        row.push(value.to_string());
        row.push(status.to_string());
        out.push(row);

        report.record(status, || format!("{value} (row {idx})"));
    }

    report.note(format!("Format: {}", validator.name()));
    report.tables.push(out);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::fixtures::table;
    use crate::rules::RuleBook;

    #[test]
    fn flags_malformed_cisco_options() {
        let t = table(
            "cisco.csv",
            &["A", "option_part_no"],
            &[
                &["x1", "UCSX-MRX96G2RF3"],
                &["x2", "UCS MR X8G1RS H"],
                &["x3", ""],
                &["x4", "UCS-MR.X8G1RS-H"],
            ],
        );
        let v = RuleBook::builtin().validator("cisco-option").unwrap();
        let report = run(&t, "option_part_no", &v, Some("a")).unwrap();

        assert_eq!(report.tally.pass, 2);
        assert_eq!(report.tally.fail, 2);
        assert_eq!(report.failures, vec!["UCS MR X8G1RS H (row 1)", "UCS-MR.X8G1RS-H (row 3)"]);

        let out = report.table(REPORT_FILE).unwrap();
        assert_eq!(out.columns, vec!["row_index", "A", "option_part_no", "status"]);
        assert_eq!(out.value(2, "status"), Some("PASS"));
        assert_eq!(out.value(1, "A"), Some("x2"));
    }

    #[test]
    fn context_column_is_optional() {
        let t = table("hpe.csv", &["mfr_part_no"], &[&["P00924-B21"], &["nan"]]);
        let v = RuleBook::builtin().validator("hpe-mfr").unwrap();
        let report = run(&t, "mfr_part_no", &v, Some("A")).unwrap();
        let out = report.table(REPORT_FILE).unwrap();
        assert_eq!(out.columns, vec!["row_index", "mfr_part_no", "status"]);
        assert_eq!(report.tally.pass, 2);
        assert!(!report.failed(false));
    }

    #[test]
    fn missing_column_is_an_input_error() {
        let t = table("x.csv", &["sku"], &[&["UCS-1"]]);
        let v = RuleBook::builtin().validator("cisco-option").unwrap();
        let err = run(&t, "option_part_no", &v, None).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_INPUT);
        assert!(err.message().contains("`option_part_no`"));
    }
}

//! DIMM rank-code consistency checks.
//!
//! A rank code is `{ranks}Rx{rank_width}` (e.g. `2Rx8`). Three views:
//!
//! - [`run_groups`]: per `option_part_no`, the union of listed `dimm_ranks`
//!   must equal every rank × width combination seen for that part.
//! - [`run_rows`]: per row, the row's own code must be listed in `dimm_ranks`.
//! - [`run_server`]: per row, every listed `dimm_ranks` code must also appear
//!   in `server_dimm_ranks`.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::domain::{Status, Table, is_missing, parse_integer};
use crate::error::AppError;
use crate::report::{CheckReport, ReportTable};
use crate::rules::consistency::{join, rank_code_from_cells, rank_code_product};
use crate::rules::{Relation, compare_sets, parse_token_set};

use super::{column_index, subject};

pub const GROUP_REPORT_FILE: &str = "dimm_ranks_report.csv";
pub const VALIDATED_FILE: &str = "validated_data.csv";
pub const ROW_REPORT_FILE: &str = "dimm_ranks_row_report.csv";
pub const SERVER_REPORT_FILE: &str = "dimm_ranks_server_report.csv";

#[derive(Debug, Default)]
struct PartGroup {
    ranks: BTreeSet<i64>,
    widths: BTreeSet<i64>,
    listed: BTreeSet<String>,
}

pub fn run_groups(table: &Table) -> Result<CheckReport, AppError> {
    table.require_columns(&["option_part_no", "ranks", "rank_width", "dimm_ranks"])?;
    let part_col = column_index(table, "option_part_no")?;
    let ranks_col = column_index(table, "ranks")?;
    let width_col = column_index(table, "rank_width")?;
    let dimm_col = column_index(table, "dimm_ranks")?;

    let mut groups: BTreeMap<String, PartGroup> = BTreeMap::new();
    let mut keyless = 0usize;
    for idx in 0..table.len() {
        let part = table.cell_at(idx, part_col).trim();
        if is_missing(part) {
            keyless += 1;
            continue;
        }
        let group = groups.entry(part.to_string()).or_default();
        if let Some(r) = parse_integer(table.cell_at(idx, ranks_col)) {
            group.ranks.insert(r);
        }
        if let Some(w) = parse_integer(table.cell_at(idx, width_col)) {
            group.widths.insert(w);
        }
        group.listed.extend(parse_token_set(table.cell_at(idx, dimm_col)));
    }

    let mut out = ReportTable::new(GROUP_REPORT_FILE, &["option_part_no", "missing", "extra", "status"]);
    let mut validated = ReportTable::new(VALIDATED_FILE, &["option_part_no", "matched_combos"]);
    let mut report = CheckReport::new("dimm-ranks", subject(table), "group");

    for (part, group) in &groups {
        if group.ranks.is_empty() || group.widths.is_empty() {
            debug!(part = %part, "no numeric ranks/rank_width; skipping group");
            out.push(vec![part.clone(), String::new(), String::new(), Status::Skip.to_string()]);
            report.record(Status::Skip, String::new);
            continue;
        }

        let expected = rank_code_product(&group.ranks, &group.widths);
        let cmp = compare_sets(&expected, &group.listed, Relation::Equal);
        out.push(vec![
            part.clone(),
            cmp.missing_joined(),
            cmp.extra_joined(),
            cmp.status.to_string(),
        ]);
        if cmp.status == Status::Pass {
            validated.push(vec![part.clone(), join(&expected, ",")]);
        }
        report.record(cmp.status, || format!("{part} ({})", cmp.describe()));
    }

    if keyless > 0 {
        report.note(format!("{keyless} row(s) without option_part_no were not grouped."));
    }
    report.tables.push(out);
    report.tables.push(validated);
    Ok(report)
}

pub fn run_rows(table: &Table) -> Result<CheckReport, AppError> {
    table.require_columns(&["option_part_no", "ranks", "rank_width", "dimm_ranks"])?;
    let part_col = column_index(table, "option_part_no")?;
    let ranks_col = column_index(table, "ranks")?;
    let width_col = column_index(table, "rank_width")?;
    let dimm_col = column_index(table, "dimm_ranks")?;

    let mut out = ReportTable::new(
        ROW_REPORT_FILE,
        &["row", "option_part_no", "expected", "actual", "missing", "extra", "status"],
    );
    let mut report = CheckReport::new("dimm-ranks-rows", subject(table), "row");

    for idx in 0..table.len() {
        let part = table.cell_at(idx, part_col).trim();
        let Some(expected) = rank_code_from_cells(table.cell_at(idx, ranks_col), table.cell_at(idx, width_col))
        else {
            out.push(vec![
                idx.to_string(),
                part.to_string(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                Status::Skip.to_string(),
            ]);
            report.record(Status::Skip, String::new);
            continue;
        };

        let actual = parse_token_set(table.cell_at(idx, dimm_col));
        let status = Status::from_pass(actual.contains(&expected));
        let missing = if status == Status::Pass { String::new() } else { expected.clone() };
        let extra: BTreeSet<String> = actual.iter().filter(|code| **code != expected).cloned().collect();
        out.push(vec![
            idx.to_string(),
            part.to_string(),
            expected,
            join(&actual, ","),
            missing,
            join(&extra, ","),
            status.to_string(),
        ]);
        report.record(status, || format!("{part}(row {idx})"));
    }

    report.tables.push(out);
    Ok(report)
}

pub fn run_server(table: &Table) -> Result<CheckReport, AppError> {
    table.require_columns(&["server_description", "dimm_ranks", "server_dimm_ranks"])?;
    let server_col = column_index(table, "server_description")?;
    let dimm_col = column_index(table, "dimm_ranks")?;
    let supported_col = column_index(table, "server_dimm_ranks")?;

    let mut out = ReportTable::new(
        SERVER_REPORT_FILE,
        &["row", "server_description", "dimm_ranks", "server_dimm_ranks", "missing", "extra", "status"],
    );
    let mut report = CheckReport::new("server-dimm-ranks", subject(table), "row");

    for idx in 0..table.len() {
        let server = table.cell_at(idx, server_col);
        let dimm = parse_token_set(table.cell_at(idx, dimm_col));
        let supported = parse_token_set(table.cell_at(idx, supported_col));
        let cmp = compare_sets(&dimm, &supported, Relation::Superset);

        out.push(vec![
            idx.to_string(),
            server.to_string(),
            join(&dimm, ","),
            join(&supported, ","),
            cmp.missing_joined(),
            cmp.extra_joined(),
            cmp.status.to_string(),
        ]);
        report.record(cmp.status, || {
            format!("{server}(row {idx}) missing {}", cmp.missing_joined())
        });
    }

    report.tables.push(out);
    Ok(report)
}

//! Processor mapping check: a vendor reference list against a mapped export.
//!
//! The reference (e.g. AMD's product list) groups processors under a series
//! or chipset key. Every input row under the same key must list each of the
//! reference processors; matching is fuzzy on canonical tokens (substring
//! either way), so `AMD EPYC 7003 Series Processors` matches `amd epyc 7003`.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info};

use crate::domain::{KeyStyle, Status, Table};
use crate::error::AppError;
use crate::report::{CheckReport, ReportTable};
use crate::rules::consistency::join;
use crate::rules::parse_list_cell;
use crate::rules::text::{canonical_set, canonical_token, chipset_key, contains_match, duplicates, norm, normalize_chipset_name};

use super::{column_index, subject};

pub const MISSING_REPORT_FILE: &str = "processor_missing_report.csv";
pub const DUPLICATES_REPORT_FILE: &str = "processor_duplicates_report.csv";

const NULL_KEYS: [&str; 3] = ["nan", "none", "null"];

#[derive(Debug, Clone)]
pub struct ProcessorOptions {
    /// Rows whose processor list does not mention this (case-insensitive) are
    /// out of scope. Empty disables the filter.
    pub vendor: String,
    pub reference_key: String,
    pub reference_list: String,
    pub input_key: String,
    pub input_list: String,
    pub key_style: KeyStyle,
    /// Also fail rows listing processors the reference does not have.
    pub fail_on_extra: bool,
}

impl Default for ProcessorOptions {
    fn default() -> Self {
        Self {
            vendor: "AMD".to_string(),
            reference_key: "processor_series".to_string(),
            reference_list: "processor".to_string(),
            input_key: "processor_series".to_string(),
            input_list: "final_processor_data".to_string(),
            key_style: KeyStyle::Series,
            fail_on_extra: false,
        }
    }
}

/// Reference processors for one key.
#[derive(Debug, Default)]
struct ReferenceGroup {
    /// canonical token → display form
    canonical: BTreeMap<String, String>,
}

impl ReferenceGroup {
    fn tokens(&self) -> BTreeSet<String> {
        self.canonical.keys().cloned().collect()
    }
}

pub fn run(reference: &Table, input: &Table, opts: &ProcessorOptions) -> Result<CheckReport, AppError> {
    let groups = load_reference(reference, opts)?;
    info!(keys = groups.len(), "reference processors loaded");

    input.require_columns(&[opts.input_key.as_str(), opts.input_list.as_str()])?;
    let key_col = column_index(input, &opts.input_key)?;
    let list_col = column_index(input, &opts.input_list)?;

    let mut missing_out = ReportTable::new(
        MISSING_REPORT_FILE,
        &["row", "key", "key_norm", "processors", "missing", "missing_count", "extra", "status", "detail"],
    );
    let mut dupes_out = ReportTable::new(
        DUPLICATES_REPORT_FILE,
        &["row", "key", "processors", "duplicates", "duplicate_count", "status"],
    );
    let mut report = CheckReport::new("processors", subject(input), "row");
    let mut out_of_scope = 0usize;

    for idx in 0..input.len() {
        let list_cell = input.cell_at(idx, list_col);
        if !mentions_vendor(list_cell, &opts.vendor) {
            out_of_scope += 1;
            continue;
        }
        let raw_key = input.cell_at(idx, key_col).trim();
        let key = normalize_key(raw_key, opts.key_style);
        let tokens: Vec<String> = parse_list_cell(list_cell)
            .iter()
            .map(|t| norm(t))
            .filter(|t| !t.is_empty())
            .collect();
        let listed = tokens.join(", ");

        let dupes = duplicates(tokens.iter().map(String::as_str));
        let dup_status = Status::from_pass(dupes.is_empty());
        dupes_out.push(vec![
            idx.to_string(),
            raw_key.to_string(),
            listed.clone(),
            join(&dupes, ", "),
            dupes.len().to_string(),
            dup_status.to_string(),
        ]);

        let row_canon = canonical_set(tokens.iter().map(String::as_str));
        let evaluation = match key.as_deref().map(|k| (k, groups.get(k))) {
            None => Err("no usable key"),
            Some((_, None)) => Err("key not in reference"),
            Some((_, Some(_))) if row_canon.is_empty() => Err("no processors listed"),
            Some((_, Some(group))) => Ok(compare_row(group, &row_canon)),
        };

        let key_norm = key.clone().unwrap_or_default();
        let status = match evaluation {
            Ok((missing, extra)) => {
                let pass = missing.is_empty() && (!opts.fail_on_extra || extra.is_empty());
                let status = Status::from_pass(pass);
                missing_out.push(vec![
                    idx.to_string(),
                    raw_key.to_string(),
                    key_norm.clone(),
                    listed,
                    missing.join(", "),
                    missing.len().to_string(),
                    join(&extra, ", "),
                    status.to_string(),
                    String::new(),
                ]);
                status
            }
            Err(detail) => {
                debug!(row = idx, key = %raw_key, detail, "processor row not evaluated");
                missing_out.push(vec![
                    idx.to_string(),
                    raw_key.to_string(),
                    key_norm.clone(),
                    listed,
                    String::new(),
                    "0".to_string(),
                    String::new(),
                    Status::Skip.to_string(),
                    detail.to_string(),
                ]);
                Status::Skip
            }
        };

        let overall = if dup_status == Status::Fail { Status::Fail } else { status };
        report.record(overall, || {
            let mut parts = vec![format!("row {idx} | {key_norm}")];
            if status == Status::Fail {
                parts.push("missing/extra processors".to_string());
            }
            if !dupes.is_empty() {
                parts.push(format!("duplicates: {}", join(&dupes, ", ")));
            }
            parts.join(" | ")
        });
    }

    report.note(format!("{} reference key(s).", groups.len()));
    if out_of_scope > 0 {
        report.note(format!(
            "{out_of_scope} input row(s) do not mention `{}` and were not checked.",
            opts.vendor
        ));
    }
    report.tables.push(missing_out);
    report.tables.push(dupes_out);
    Ok(report)
}

/// (missing display names, extra canonical tokens) for one input row.
fn compare_row(group: &ReferenceGroup, row_canon: &BTreeSet<String>) -> (Vec<String>, BTreeSet<String>) {
    let missing = group
        .canonical
        .iter()
        .filter(|(canon, _)| !contains_match(canon, row_canon))
        .map(|(_, display)| display.clone())
        .collect();
    let reference = group.tokens();
    let extra = row_canon
        .iter()
        .filter(|c| !contains_match(c, &reference))
        .cloned()
        .collect();
    (missing, extra)
}

fn load_reference(table: &Table, opts: &ProcessorOptions) -> Result<BTreeMap<String, ReferenceGroup>, AppError> {
    table.require_columns(&[opts.reference_key.as_str(), opts.reference_list.as_str()])?;
    let key_col = column_index(table, &opts.reference_key)?;
    let list_col = column_index(table, &opts.reference_list)?;

    let mut groups: BTreeMap<String, ReferenceGroup> = BTreeMap::new();
    for idx in 0..table.len() {
        let list_cell = table.cell_at(idx, list_col);
        if !mentions_vendor(list_cell, &opts.vendor) {
            continue;
        }
        let Some(key) = normalize_key(table.cell_at(idx, key_col), opts.key_style) else {
            continue;
        };
        let mut tokens: Vec<String> = parse_list_cell(list_cell).iter().map(|t| norm(t)).collect();
        tokens.sort();
        tokens.dedup();
        let group = groups.entry(key).or_default();
        for token in tokens {
            let canon = canonical_token(&token);
            if !canon.is_empty() {
                group.canonical.entry(canon).or_insert(token);
            }
        }
    }
    groups.retain(|_, g| !g.canonical.is_empty());

    if groups.is_empty() {
        return Err(AppError::input(format!(
            "No reference rows in '{}' mention `{}`",
            table.source.display(),
            opts.vendor
        )));
    }
    Ok(groups)
}

fn mentions_vendor(cell: &str, vendor: &str) -> bool {
    vendor.is_empty() || cell.to_lowercase().contains(&vendor.to_lowercase())
}

/// Grouping key of a raw series/chipset cell; `None` when blank or null-like.
fn normalize_key(raw: &str, style: KeyStyle) -> Option<String> {
    let key = match style {
        KeyStyle::Series => norm(raw),
        KeyStyle::Chipset => {
            // Chipset cells are sometimes list-valued; the first entry names the platform.
            let first = parse_list_cell(raw).into_iter().next()?;
            chipset_key(&normalize_chipset_name(&first))
        }
    };
    if key.is_empty() || NULL_KEYS.contains(&key.as_str()) {
        None
    } else {
        Some(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::fixtures::table;

    fn amd_reference() -> Table {
        table(
            "amd.csv",
            &["processor_series", "processor"],
            &[
                &["AMD EPYC 7003", "['AMD EPYC™ 7763', 'AMD EPYC™ 7713']"],
                &["AMD EPYC 7003", "AMD EPYC 7543"],
                &["Intel Xeon", "Intel Xeon Gold 6230"],
                &["nan", "AMD EPYC 9654"],
            ],
        )
    }

    #[test]
    fn missing_and_duplicate_processors() {
        let input = table(
            "kingston.csv",
            &["processor_series", "final_processor_data"],
            &[
                &["AMD EPYC 7003", "['AMD EPYC 7763', 'AMD EPYC 7713', 'AMD EPYC 7543']"],
                &["AMD EPYC 7003", "['AMD EPYC 7763 Processor', 'AMD EPYC 7763 Processor']"],
                &["AMD Ryzen 5000", "['AMD Ryzen 7 5800X']"],
                &["Intel Xeon", "['Intel Xeon Gold 6230']"],
            ],
        );
        let report = run(&amd_reference(), &input, &ProcessorOptions::default()).unwrap();
        let missing = report.table(MISSING_REPORT_FILE).unwrap();
        let dupes = report.table(DUPLICATES_REPORT_FILE).unwrap();

        assert_eq!(missing.rows.len(), 3);
        assert_eq!(missing.value(0, "status"), Some("PASS"));
        assert_eq!(missing.value(1, "status"), Some("FAIL"));
        assert_eq!(missing.value(1, "missing"), Some("amd epyc 7543, amd epyc 7713"));
        assert_eq!(missing.value(1, "missing_count"), Some("2"));
        assert_eq!(missing.value(2, "status"), Some("SKIP"));
        assert_eq!(missing.value(2, "detail"), Some("key not in reference"));

        assert_eq!(dupes.value(1, "duplicates"), Some("amd epyc 7763 processor"));
        assert_eq!(dupes.value(1, "status"), Some("FAIL"));
        assert_eq!(dupes.value(0, "status"), Some("PASS"));

        assert_eq!(report.tally.pass, 1);
        assert_eq!(report.tally.fail, 1);
        assert_eq!(report.tally.skip, 1);
        assert_eq!(
            report.failures,
            vec!["row 1 | amd epyc 7003 | missing/extra processors | duplicates: amd epyc 7763 processor"]
        );
        assert!(report.notes.iter().any(|n| n.starts_with("1 input row(s)")));
    }

    #[test]
    fn extras_only_fail_when_requested() {
        let input = table(
            "kingston.csv",
            &["processor_series", "final_processor_data"],
            &[&["AMD EPYC 7003", "AMD EPYC 7763, AMD EPYC 7713, AMD EPYC 7543, AMD EPYC 72F3"]],
        );
        let relaxed = run(&amd_reference(), &input, &ProcessorOptions::default()).unwrap();
        assert!(!relaxed.failed(false));
        assert_eq!(
            relaxed.table(MISSING_REPORT_FILE).unwrap().value(0, "extra"),
            Some("amd epyc 72f3")
        );

        let opts = ProcessorOptions {
            fail_on_extra: true,
            ..ProcessorOptions::default()
        };
        assert!(run(&amd_reference(), &input, &opts).unwrap().failed(false));
    }

    #[test]
    fn chipset_keys_match_on_model_token() {
        let reference = table(
            "intel.csv",
            &["chipset", "product_name"],
            &[
                &["Intel® C621 Chipset", "Intel® Xeon® Gold 6230 Processor"],
                &["Intel® C621 Chipset", "Intel® Xeon® Silver 4210 Processor"],
            ],
        );
        let input = table(
            "kingston.csv",
            &["chipset", "final_processor_data"],
            &[&["['C621']", "['Intel Xeon Gold 6230']"]],
        );
        let opts = ProcessorOptions {
            vendor: "Intel".to_string(),
            reference_key: "chipset".to_string(),
            reference_list: "product_name".to_string(),
            input_key: "chipset".to_string(),
            key_style: KeyStyle::Chipset,
            ..ProcessorOptions::default()
        };
        let report = run(&reference, &input, &opts).unwrap();
        let missing = report.table(MISSING_REPORT_FILE).unwrap();
        assert_eq!(missing.value(0, "key_norm"), Some("c621"));
        assert_eq!(missing.value(0, "missing"), Some("intel xeon silver 4210 processor"));
        assert!(report.failed(false));
    }

    #[test]
    fn empty_reference_is_an_input_error() {
        let reference = table("amd.csv", &["processor_series", "processor"], &[&["x", "Intel Xeon"]]);
        let input = table("k.csv", &["processor_series", "final_processor_data"], &[]);
        let err = run(&reference, &input, &ProcessorOptions::default()).unwrap_err();
        assert!(err.message().contains("mention `AMD`"));
    }

    #[test]
    fn key_normalization() {
        assert_eq!(normalize_key(" AMD EPYC-7003 ", KeyStyle::Series).as_deref(), Some("amd epyc 7003"));
        assert_eq!(normalize_key("None", KeyStyle::Series), None);
        assert_eq!(normalize_key("", KeyStyle::Chipset), None);
        assert_eq!(normalize_key("Intel® W680 Chipset", KeyStyle::Chipset).as_deref(), Some("w680"));
    }
}

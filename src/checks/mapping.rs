//! Processor/chipset mapping reconciliation.
//!
//! A source mapping lists, per part and server, a free-text `processor` cell
//! that often mixes processors with a trailing chipset
//! (`"AMD Ryzen 5 PRO 4650G AMD PRO 565"`). The source is normalized:
//!
//! - rows that do not mention a processor family of interest are left out
//! - quoted list cells are exploded into one entry per quoted item
//! - each entry is split into processor and chipset at the last vendor word
//! - shorthand Ryzen items inherit the generation of the item before them
//! - entries are grouped by `(option_part_no, server_description, chipset)`
//!
//! Each group is then looked up in the destination by the same key, and its
//! processor list is compared with `all_amd_processor` as case-insensitive
//! sets. Slash shorthand (`intel core i5 12400/12500`) is expanded before a
//! second comparison.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info};

use crate::domain::{Status, Table};
use crate::error::AppError;
use crate::report::{CheckReport, ReportTable};
use crate::rules::text::collapse_ws;
use crate::rules::{Relation, compare_sets};

use super::{column_index, subject};

pub const REPORT_FILE: &str = "processor_mapping_report.csv";

/// Destination list column; the second spelling is a common export typo.
const DEST_LIST_COLUMNS: [&str; 2] = ["all_amd_processor", "all_amd_processsor"];
const KEY_COLUMNS: [&str; 3] = ["option_part_no", "server_description", "chipset"];

const FAMILIES_OF_INTEREST: [&str; 15] = [
    "Intel Xeon",
    "Intel Pentium",
    "Intel Core",
    "Intel Celeron",
    "Intel Celeron Dual Core",
    "AMD Sempron",
    "AMD Ryzen",
    "AMD Ryzen 3 Pro",
    "AMD Ryzen 5 Pro",
    "AMD Ryzen 7 Pro",
    "AMD E-Series",
    "AMD A-Series",
    "AMD EPYC",
    "AMD C-Series",
    "AMD Athlon",
];

/// Entries that are never split into processor and chipset.
const KEEP_INTACT: [&str; 8] = [
    "AMD A-Series APU (FM2+) AMD A10-series",
    "(N AMD A8-7410 (N",
    "A) AMD A8-7410 A)",
    "(N AMD A4-5000 (N",
    "AMD A-Series APU AMD A4-5000 A)",
    "AMD A-Series APU AMD A4-5000 (N",
    "Intel Pentium Intel Pentium B940 (N/A)",
    "VIA C7 ",
];

/// Debris left by `(N/A)` after quote splitting.
const NA_FRAGMENTS: [&str; 3] = ["(N/A)", "(N", "A)"];

static VENDOR_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:intel|amd)\b").expect("valid regex"));
static NA_VENDOR_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\(N/A\)\s+(?:intel|amd) ").expect("valid regex"));
static INTEL_CHIPSET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bIntel\s+[A-Z]\d{2,3}\b").expect("valid regex"));
static RYZEN_FULL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^AMD Ryzen\s+(\d)\s+(?:PRO\s+)?\w+").expect("valid regex"));
static RYZEN_PRO_ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^AMD Ryzen\s+(PRO\s+\w+)").expect("valid regex"));

type GroupKey = (String, String, String);

/// Outcome of one source group, before it is tallied.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Verdict {
    Pass(&'static str),
    Fail(String),
    NoMatch,
}

impl Verdict {
    fn label(&self) -> &'static str {
        match self {
            Verdict::Pass(_) => "PASS",
            Verdict::Fail(_) => "FAIL",
            Verdict::NoMatch => "NO_MATCH",
        }
    }

    fn reason(&self) -> String {
        match self {
            Verdict::Pass(reason) => reason.to_string(),
            Verdict::Fail(reason) => reason.clone(),
            Verdict::NoMatch => "No matching row found in destination".to_string(),
        }
    }

    fn status(&self) -> Status {
        match self {
            Verdict::Pass(_) => Status::Pass,
            Verdict::Fail(_) | Verdict::NoMatch => Status::Fail,
        }
    }
}

pub fn run(source: &Table, destination: &Table) -> Result<CheckReport, AppError> {
    let (groups, out_of_scope) = group_source(source)?;
    info!(groups = groups.len(), out_of_scope, "source mapping normalized");

    let dest_rows = index_destination(destination)?;

    let mut out = ReportTable::new(
        REPORT_FILE,
        &[
            "option_part_no",
            "server_description",
            "chipset",
            "processor_src_norm",
            "all_amd_processor",
            "all_amd_processor_norm",
            "test_result",
            "reason",
        ],
    );
    let mut report = CheckReport::new("mapping", subject(source), "group");
    let mut no_match = 0usize;

    for (key, processors) in &groups {
        let src_norm = norm_list_string(&processors.iter().cloned().collect::<Vec<_>>().join(", "));
        let matches: &[String] = dest_rows.get(key).map(Vec::as_slice).unwrap_or(&[]);

        if matches.is_empty() {
            no_match += 1;
            debug!(part = %key.0, server = %key.1, chipset = %key.2, "no destination row");
            push_row(&mut out, &mut report, key, &src_norm, "", "", Verdict::NoMatch);
            continue;
        }
        for dest_list in matches {
            let dst_norm = norm_list_string(dest_list);
            let verdict = compare_lists(&src_norm, &dst_norm);
            push_row(&mut out, &mut report, key, &src_norm, dest_list, &dst_norm, verdict);
        }
    }

    if out_of_scope > 0 {
        report.note(format!(
            "{out_of_scope} source row(s) mention no processor family of interest and were not checked."
        ));
    }
    if no_match > 0 {
        report.note(format!("{no_match} source group(s) have no destination row (NO_MATCH)."));
    }
    report.tables.push(out);
    Ok(report)
}

fn push_row(
    out: &mut ReportTable,
    report: &mut CheckReport,
    key: &GroupKey,
    src_norm: &str,
    dest_list: &str,
    dst_norm: &str,
    verdict: Verdict,
) {
    let reason = verdict.reason();
    out.push(vec![
        key.0.clone(),
        key.1.clone(),
        key.2.clone(),
        src_norm.to_string(),
        dest_list.to_string(),
        dst_norm.to_string(),
        verdict.label().to_string(),
        reason.clone(),
    ]);
    report.record(verdict.status(), || {
        format!("{} / {} / {}: {reason}", key.0, key.1, key.2)
    });
}

/// Normalized source groups plus the count of rows outside the families of interest.
fn group_source(source: &Table) -> Result<(BTreeMap<GroupKey, BTreeSet<String>>, usize), AppError> {
    source.require_columns(&["processor"])?;
    let proc_col = column_index(source, "processor")?;
    let part_col = source.column("option_part_no");
    let server_col = source.column("server_description");
    let chipset_col = source.column("chipset");
    let text = |idx: usize, col: Option<usize>| col.map(|c| source.cell_at(idx, c)).unwrap_or("");

    let mut groups: BTreeMap<GroupKey, BTreeSet<String>> = BTreeMap::new();
    let mut out_of_scope = 0usize;

    for idx in 0..source.len() {
        let cell = source.cell_at(idx, proc_col);
        if !mentions_family_of_interest(cell) {
            out_of_scope += 1;
            continue;
        }
        let part = collapse_ws(text(idx, part_col));
        let server = collapse_ws(text(idx, server_col));
        let own_chipset = text(idx, chipset_col);

        for entry in explode_quoted(cell) {
            let (processor, split_chipset) = split_processor_chipset(&entry);
            let chipset = if is_meaningful_chipset(own_chipset) {
                own_chipset.to_string()
            } else {
                split_chipset
            };
            let processor = strip_intel_chipset(&normalize_ryzen_variants(&processor));

            let processors = groups
                .entry((part.clone(), server.clone(), clean_fragment(&chipset)))
                .or_default();
            let processor = clean_fragment(&processor);
            if !processor.is_empty() {
                processors.insert(processor);
            }
        }
    }
    Ok((groups, out_of_scope))
}

/// Destination list cells per cleaned key, in file order.
fn index_destination(destination: &Table) -> Result<BTreeMap<GroupKey, Vec<String>>, AppError> {
    let list_col = DEST_LIST_COLUMNS
        .iter()
        .find_map(|name| destination.column(name))
        .ok_or_else(|| {
            AppError::input(format!(
                "Missing required column `{}` in '{}'",
                DEST_LIST_COLUMNS[0],
                destination.source.display()
            ))
        })?;
    let key_cols: Vec<Option<usize>> = KEY_COLUMNS.iter().map(|name| destination.column(name)).collect();
    let key_text = |idx: usize, pos: usize| {
        collapse_ws(key_cols[pos].map(|c| destination.cell_at(idx, c)).unwrap_or(""))
    };

    let mut rows: BTreeMap<GroupKey, Vec<String>> = BTreeMap::new();
    for idx in 0..destination.len() {
        let key = (key_text(idx, 0), key_text(idx, 1), key_text(idx, 2));
        rows.entry(key)
            .or_default()
            .push(collapse_ws(destination.cell_at(idx, list_col)));
    }
    Ok(rows)
}

fn mentions_family_of_interest(cell: &str) -> bool {
    FAMILIES_OF_INTEREST.iter().any(|family| cell.contains(family))
}

/// `['a', 'b']` → `a`, `b`. Bracket pieces and bare separators are dropped.
fn explode_quoted(cell: &str) -> Vec<String> {
    cell.replace("(N/A)", "")
        .trim()
        .split('\'')
        .map(str::trim)
        .filter(|piece| !piece.is_empty() && *piece != "," && !piece.contains(['[', ']']))
        .map(str::to_string)
        .collect()
}

fn is_meaningful_chipset(value: &str) -> bool {
    let value = value.trim();
    let lower = value.to_lowercase();
    !matches!(lower.as_str(), "" | "n/a" | "na" | "none") && value.chars().count() > 1
}

/// Split an entry into `(processor, chipset)` at its vendor words.
fn split_processor_chipset(entry: &str) -> (String, String) {
    if KEEP_INTACT.contains(&entry) {
        return (entry.to_string(), String::new());
    }

    // `(N/A) Intel …` / `(N/A) AMD …` is a bare chipset, unless it names a Cedar part.
    if let Some(m) = NA_VENDOR_PREFIX.find(entry) {
        if !starts_with_word(&entry[m.end()..], "cedar") {
            return (String::new(), entry.to_string());
        }
    }

    let vendors: Vec<_> = VENDOR_WORD.find_iter(entry).collect();
    let split_at = match vendors.as_slice() {
        [.., last] if vendors.len() >= 2 => Some(last.start()),
        [only] if only.start() > 0 => Some(only.start()),
        _ => None,
    };
    match split_at {
        Some(at) => (entry[..at].trim().to_string(), entry[at..].trim().to_string()),
        None => (entry.to_string(), String::new()),
    }
}

fn starts_with_word(text: &str, word: &str) -> bool {
    let Some(head) = text.get(..word.len()) else {
        return false;
    };
    head.eq_ignore_ascii_case(word)
        && !text[word.len()..]
            .chars()
            .next()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
}

/// `AMD Ryzen 5 PRO 4650G, AMD Ryzen PRO 4750G` → the second entry gains the `5`.
fn normalize_ryzen_variants(processors: &str) -> String {
    if !processors.contains("AMD Ryzen") {
        return processors.to_string();
    }
    let mut last_gen: Option<String> = None;
    processors
        .split(',')
        .map(str::trim)
        .map(|entry| {
            if let Some(caps) = RYZEN_FULL.captures(entry) {
                last_gen = caps.get(1).map(|g| g.as_str().to_string());
                return entry.to_string();
            }
            match (RYZEN_PRO_ONLY.captures(entry), &last_gen) {
                (Some(caps), Some(generation)) => {
                    let pro = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
                    format!("AMD Ryzen {generation} {pro}")
                }
                _ => entry.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Drop a trailing Intel chipset (`Intel H610`) named alongside the processor.
fn strip_intel_chipset(processor: &str) -> String {
    match INTEL_CHIPSET.find(processor) {
        Some(m) => processor.replace(m.as_str(), "").trim().to_string(),
        None => processor.to_string(),
    }
}

fn clean_fragment(text: &str) -> String {
    let mut text = text.to_string();
    for fragment in NA_FRAGMENTS {
        text = text.replace(fragment, "");
    }
    collapse_ws(&text)
}

/// Comma list deduplicated case-insensitively (first spelling wins), sorted
/// case-insensitively, joined with `", "`.
fn norm_list_string(list: &str) -> String {
    let mut seen = BTreeSet::new();
    let mut parts: Vec<String> = list
        .split(',')
        .map(collapse_ws)
        .filter(|part| !part.is_empty() && seen.insert(part.to_lowercase()))
        .collect();
    parts.sort_by_key(|part| part.to_lowercase());
    parts.join(", ")
}

fn lower_set(list: &str) -> BTreeSet<String> {
    list.split(',').map(|p| p.trim().to_lowercase()).collect()
}

fn compare_lists(src_norm: &str, dst_norm: &str) -> Verdict {
    match (src_norm.is_empty(), dst_norm.is_empty()) {
        (true, true) => return Verdict::Pass("Both empty"),
        (_, true) => return Verdict::Fail("Missing all_amd_processor in destination".to_string()),
        (true, false) => return Verdict::Pass(""),
        (false, false) => {}
    }

    let src = lower_set(src_norm);
    let dst = lower_set(dst_norm);
    if src == dst {
        return Verdict::Pass("");
    }

    let expanded = expand_slashes(&src);
    let cmp = compare_sets(&expanded, &dst, Relation::Equal);
    if cmp.status == Status::Pass {
        return Verdict::Pass("Matched after slash expansion");
    }
    let mut details = Vec::new();
    if !cmp.missing.is_empty() {
        details.push(format!("Missing in dest: {}", join_sorted(&cmp.missing)));
    }
    if !cmp.extra.is_empty() {
        details.push(format!("Extra in dest: {}", join_sorted(&cmp.extra)));
    }
    Verdict::Fail(format!("Processor content mismatch: {}", details.join("; ")))
}

fn join_sorted(set: &BTreeSet<String>) -> String {
    set.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

/// `intel core i5 12400/12500` → `intel core i5 12400`, `intel core i5 12500`.
///
/// Only entries whose first slash part has at least three words are expanded;
/// the shared prefix is that part minus its last word.
fn expand_slashes(processors: &BTreeSet<String>) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    for entry in processors {
        let parts: Vec<&str> = entry.split('/').map(str::trim).collect();
        let words: Vec<&str> = parts[0].split_whitespace().collect();
        if parts.len() < 2 || words.len() < 3 {
            out.insert(entry.clone());
            continue;
        }
        let prefix = words[..words.len() - 1].join(" ");
        out.insert(parts[0].to_string());
        for part in &parts[1..] {
            out.insert(format!("{prefix} {part}"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::fixtures::table;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn entries_split_at_the_last_vendor_word() {
        assert_eq!(
            split_processor_chipset("AMD Ryzen 5 PRO 4650G AMD PRO 565"),
            ("AMD Ryzen 5 PRO 4650G".to_string(), "AMD PRO 565".to_string())
        );
        assert_eq!(
            split_processor_chipset("Core i5-12400 Intel Q670"),
            ("Core i5-12400".to_string(), "Intel Q670".to_string())
        );
        assert_eq!(
            split_processor_chipset("AMD EPYC 7003"),
            ("AMD EPYC 7003".to_string(), String::new())
        );
        assert_eq!(
            split_processor_chipset("(N/A) Intel C621"),
            (String::new(), "(N/A) Intel C621".to_string())
        );
        assert_eq!(
            split_processor_chipset("(N/A) AMD Cedar Trail"),
            ("(N/A)".to_string(), "AMD Cedar Trail".to_string())
        );
        assert_eq!(
            split_processor_chipset("VIA C7 "),
            ("VIA C7 ".to_string(), String::new())
        );
    }

    #[test]
    fn shorthand_ryzen_entries_inherit_the_generation() {
        assert_eq!(
            normalize_ryzen_variants("AMD Ryzen 5 PRO 4650G, AMD Ryzen PRO 4750G"),
            "AMD Ryzen 5 PRO 4650G, AMD Ryzen 5 PRO 4750G"
        );
        assert_eq!(normalize_ryzen_variants("AMD Ryzen PRO 4750G"), "AMD Ryzen PRO 4750G");
        assert_eq!(normalize_ryzen_variants("Intel Core i5"), "Intel Core i5");
    }

    #[test]
    fn intel_chipsets_and_na_debris_are_removed() {
        assert_eq!(strip_intel_chipset("Intel Core i5-12400 Intel H610"), "Intel Core i5-12400");
        assert_eq!(clean_fragment(" A) AMD  A8-7410 (N "), "AMD A8-7410");
        assert!(!is_meaningful_chipset(" N/A "));
        assert!(!is_meaningful_chipset("x"));
        assert!(is_meaningful_chipset("AMD PRO 565"));
    }

    #[test]
    fn quoted_lists_explode_into_entries() {
        assert_eq!(
            explode_quoted("['AMD Ryzen 5 PRO 4650G', 'AMD Ryzen 7 PRO 4750G']"),
            vec!["AMD Ryzen 5 PRO 4650G", "AMD Ryzen 7 PRO 4750G"]
        );
        assert_eq!(explode_quoted("(N/A) AMD EPYC 7003"), vec!["AMD EPYC 7003"]);
    }

    #[test]
    fn list_strings_dedupe_and_sort_case_insensitively() {
        assert_eq!(
            norm_list_string("b, A,  a , C"),
            "A, b, C"
        );
        assert_eq!(norm_list_string(" , "), "");
    }

    #[test]
    fn slash_shorthand_expands_with_the_shared_prefix() {
        assert_eq!(
            expand_slashes(&set(&["intel core i5 12400/12500/12600", "amd a8/a10"])),
            set(&[
                "intel core i5 12400",
                "intel core i5 12500",
                "intel core i5 12600",
                "amd a8/a10",
            ])
        );
    }

    #[test]
    fn list_comparison_verdicts() {
        assert_eq!(compare_lists("", ""), Verdict::Pass("Both empty"));
        assert_eq!(compare_lists("AMD EPYC 7003", "amd epyc 7003"), Verdict::Pass(""));
        assert_eq!(
            compare_lists("Intel Core i5 12400/12500", "intel core i5 12400, intel core i5 12500"),
            Verdict::Pass("Matched after slash expansion")
        );
        assert_eq!(
            compare_lists("AMD EPYC 7003", ""),
            Verdict::Fail("Missing all_amd_processor in destination".to_string())
        );
        assert_eq!(
            compare_lists("AMD EPYC 7002, AMD EPYC 7003", "AMD EPYC 7003, AMD EPYC 9004"),
            Verdict::Fail(
                "Processor content mismatch: Missing in dest: amd epyc 7002; Extra in dest: amd epyc 9004"
                    .to_string()
            )
        );
    }

    #[test]
    fn reconciles_source_groups_against_destination() {
        let source = table(
            "acer_mapping.csv",
            &["Option_Part_No", "Server_Description", "Processor"],
            &[
                &["KN.1", "Veriton X", "['AMD Ryzen 5 PRO 4650G, AMD Ryzen PRO 4750G AMD PRO 565', ',']"],
                &["KN.1", "Veriton X", "AMD Ryzen 3 PRO 4350G AMD PRO 565"],
                &["KN.2", "Aspire", "Intel Core i5 12400/12500 Intel H610"],
                &["KN.3", "Altos", "AMD EPYC 7003"],
                &["KN.4", "Chromebox", "MediaTek Kompanio"],
            ],
        );
        let destination = table(
            "acer_servers.csv",
            &["option_part_no", "server_description", "chipset", "all_amd_processsor"],
            &[
                &[
                    "KN.1",
                    "Veriton  X",
                    "AMD PRO 565",
                    "AMD Ryzen 3 PRO 4350G, amd ryzen 5 pro 4650g, AMD Ryzen 5 PRO 4750G",
                ],
                &["KN.2", "Aspire", "Intel H610", "Intel Core i5 12400, Intel Core i5 12500"],
                &["KN.2", "Aspire", "Intel H610", "Intel Core i5 12400"],
            ],
        );

        let report = run(&source, &destination).unwrap();
        let out = report.table(REPORT_FILE).unwrap();
        assert_eq!(out.rows.len(), 4);

        assert_eq!(out.value(0, "option_part_no"), Some("KN.1"));
        assert_eq!(out.value(0, "chipset"), Some("AMD PRO 565"));
        assert_eq!(
            out.value(0, "processor_src_norm"),
            Some("AMD Ryzen 3 PRO 4350G, AMD Ryzen 5 PRO 4650G, AMD Ryzen 5 PRO 4750G")
        );
        assert_eq!(out.value(0, "test_result"), Some("PASS"));

        assert_eq!(out.value(1, "test_result"), Some("PASS"));
        assert_eq!(out.value(1, "reason"), Some("Matched after slash expansion"));
        assert_eq!(out.value(2, "test_result"), Some("FAIL"));
        assert_eq!(
            out.value(2, "reason"),
            Some("Processor content mismatch: Missing in dest: intel core i5 12500")
        );

        assert_eq!(out.value(3, "option_part_no"), Some("KN.3"));
        assert_eq!(out.value(3, "test_result"), Some("NO_MATCH"));
        assert_eq!(out.value(3, "all_amd_processor"), Some(""));

        assert_eq!(report.tally.pass, 2);
        assert_eq!(report.tally.fail, 2);
        assert_eq!(
            report.notes,
            vec![
                "1 source row(s) mention no processor family of interest and were not checked.",
                "1 source group(s) have no destination row (NO_MATCH).",
            ]
        );
    }

    #[test]
    fn destination_without_processor_list_is_an_input_error() {
        let source = table("src.csv", &["processor"], &[&["AMD EPYC 7003"]]);
        let destination = table("dst.csv", &["option_part_no"], &[&["KN.1"]]);
        let err = run(&source, &destination).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_INPUT);
        assert!(err.message().contains("all_amd_processor"));
    }
}

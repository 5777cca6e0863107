//! Set-consistency comparison.
//!
//! An "expected" token set is derived from structured fields (rank × width,
//! a brand's required columns, a store's categories) and compared with the
//! "actual" set observed in the data.

use std::collections::BTreeSet;

use crate::domain::{Status, parse_integer};

/// Which relation must hold for a PASS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// actual == expected
    Equal,
    /// actual ⊇ expected
    Superset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetComparison {
    /// expected − actual
    pub missing: BTreeSet<String>,
    /// actual − expected
    pub extra: BTreeSet<String>,
    pub status: Status,
}

impl SetComparison {
    pub fn missing_joined(&self) -> String {
        join(&self.missing, ",")
    }

    pub fn extra_joined(&self) -> String {
        join(&self.extra, ",")
    }

    /// `all pass`, or `missing: a, b; extra: c`.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if !self.missing.is_empty() {
            parts.push(format!("missing: {}", join(&self.missing, ", ")));
        }
        if !self.extra.is_empty() {
            parts.push(format!("extra: {}", join(&self.extra, ", ")));
        }
        if parts.is_empty() {
            "all pass".to_string()
        } else {
            parts.join("; ")
        }
    }
}

pub fn compare_sets(expected: &BTreeSet<String>, actual: &BTreeSet<String>, relation: Relation) -> SetComparison {
    let missing: BTreeSet<String> = expected.difference(actual).cloned().collect();
    let extra: BTreeSet<String> = actual.difference(expected).cloned().collect();
    let pass = match relation {
        Relation::Equal => missing.is_empty() && extra.is_empty(),
        Relation::Superset => missing.is_empty(),
    };
    SetComparison {
        missing,
        extra,
        status: Status::from_pass(pass),
    }
}

/// DIMM rank code, e.g. `2Rx4`.
pub fn rank_code(ranks: i64, width: i64) -> String {
    format!("{ranks}Rx{width}")
}

/// Rank code from raw `ranks` / `rank_width` cells; `None` if either is not numeric.
pub fn rank_code_from_cells(ranks: &str, width: &str) -> Option<String> {
    Some(rank_code(parse_integer(ranks)?, parse_integer(width)?))
}

/// Every `{r}Rx{w}` combination of the given ranks and widths.
pub fn rank_code_product(ranks: &BTreeSet<i64>, widths: &BTreeSet<i64>) -> BTreeSet<String> {
    ranks
        .iter()
        .flat_map(|r| widths.iter().map(move |w| rank_code(*r, *w)))
        .collect()
}

pub fn join(items: &BTreeSet<String>, sep: &str) -> String {
    items.iter().map(String::as_str).collect::<Vec<_>>().join(sep)
}

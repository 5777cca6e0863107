//! Text normalization and per-cell text rules.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::domain::{TextRule, is_missing};

static NON_ALNUM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9 ]").expect("valid regex"));
static CHIPSET_MODEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([a-z]{1,2}\d{2,3})\b").expect("valid regex"));

const NOISY_SUFFIXES: [&str; 4] = [" series", " processors", " processor", " family"];
const CHIPSET_NOISE: [&str; 4] = ["chipset", "express", "series", "platform"];

/// Lowercase, punctuation to spaces, whitespace collapsed.
pub fn norm(s: &str) -> String {
    let lower = s.to_lowercase();
    collapse_ws(&NON_ALNUM.replace_all(&lower, " "))
}

/// Canonical processor token used for fuzzy matching.
///
/// Each trailing generic word (`series`, `processors`, `processor`, `family`)
/// is checked once, in that order: `"AMD EPYC 7003 Series Processors"` becomes
/// `"amd epyc 7003 series"`.
pub fn canonical_token(t: &str) -> String {
    let cleaned = t.trim().replace(['®', '™'], "");
    let mut t = norm(&cleaned);
    for suffix in NOISY_SUFFIXES {
        if let Some(stripped) = t.strip_suffix(suffix) {
            t = stripped.trim().to_string();
        }
    }
    collapse_ws(&t)
}

/// Canonical tokens of a list, empties dropped.
pub fn canonical_set<'a>(tokens: impl IntoIterator<Item = &'a str>) -> BTreeSet<String> {
    tokens
        .into_iter()
        .map(canonical_token)
        .filter(|t| !t.is_empty())
        .collect()
}

/// `cand` is in `stack` exactly, or is a substring of / contains any member.
pub fn contains_match(cand: &str, stack: &BTreeSet<String>) -> bool {
    stack.contains(cand) || stack.iter().any(|h| h.contains(cand) || cand.contains(h.as_str()))
}

/// Chipset name with trademarks, separators and filler words removed.
pub fn normalize_chipset_name(s: &str) -> String {
    let s = s
        .to_lowercase()
        .replace(['®', '™'], "")
        .replace(['/', '-', ','], " ");
    s.split_whitespace()
        .filter(|w| !CHIPSET_NOISE.contains(w))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Model token of a normalized chipset name (`"intel c621"` → `"c621"`), or the
/// name itself when there is none.
pub fn chipset_key(s: &str) -> String {
    match CHIPSET_MODEL.captures(s).and_then(|c| c.get(1)) {
        Some(m) => m.as_str().to_string(),
        None => s.to_string(),
    }
}

/// Tokens occurring more than once.
pub fn duplicates<'a>(tokens: impl IntoIterator<Item = &'a str>) -> BTreeSet<String> {
    let mut seen = BTreeSet::new();
    let mut dupes = BTreeSet::new();
    for t in tokens {
        if !seen.insert(t) {
            dupes.insert(t.to_string());
        }
    }
    dupes
}

/// Evaluate a text rule; `Err` carries the reason.
pub fn check_text(rule: TextRule, value: &str) -> Result<(), &'static str> {
    let value = value.trim();
    match rule {
        TextRule::Charset => {
            if is_missing(value) {
                return Ok(());
            }
            if value.contains(',') {
                return Err("Comma detected");
            }
            if !value
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || c == '-')
            {
                return Err("Contains invalid characters. Only letters, digits, spaces, and hyphens are allowed.");
            }
            Ok(())
        }
        TextRule::Alphabetic => {
            if is_missing(value) {
                return Err("Missing value");
            }
            if !value.chars().all(char::is_alphabetic) {
                return Err("Contains non-alphabetic characters");
            }
            Ok(())
        }
        TextRule::Present => {
            if is_missing(value) {
                Err("Missing value")
            } else {
                Ok(())
            }
        }
    }
}

pub(crate) fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

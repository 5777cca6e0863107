//! Part-number format validators.
//!
//! A format family is declared as data (`FormatSpec`) and compiled once into a
//! regex. Validation is pure: blank input passes (the field is optional),
//! anything else must match the whole pattern.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Declarative pattern family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FormatSpec {
    /// One of `prefixes` (case-insensitive), then zero or more ASCII alphanumeric
    /// segments, each optionally preceded by a single hyphen.
    ///
    /// `UCS` + `["-MR-X8G1RS-H"]` passes; spaces, commas, periods and
    /// underscores never match.
    Prefixed { prefixes: Vec<String> },
    /// An ASCII alphanumeric stem of `min_len..=max_len` characters, optionally
    /// followed by exactly one of `suffixes` (e.g. `-B21`).
    Suffixed {
        min_len: usize,
        max_len: usize,
        #[serde(default)]
        suffixes: Vec<String>,
    },
}

#[derive(Debug, Clone)]
pub struct FormatValidator {
    name: String,
    regex: Regex,
}

impl FormatValidator {
    pub fn compile(name: &str, spec: &FormatSpec) -> Result<Self, AppError> {
        let pattern = match spec {
            FormatSpec::Prefixed { prefixes } => {
                let alts = alternation(prefixes);
                if alts.is_empty() {
                    return Err(AppError::input(format!(
                        "Format `{name}`: at least one prefix is required."
                    )));
                }
                format!(r"^(?i:{alts})(?:-?[A-Za-z0-9]+)*$")
            }
            FormatSpec::Suffixed {
                min_len,
                max_len,
                suffixes,
            } => {
                if *min_len == 0 || min_len > max_len {
                    return Err(AppError::input(format!(
                        "Format `{name}`: invalid stem length {min_len}..={max_len}."
                    )));
                }
                let alts = alternation(suffixes);
                if alts.is_empty() {
                    format!(r"^[A-Za-z0-9]{{{min_len},{max_len}}}$")
                } else {
                    format!(r"^[A-Za-z0-9]{{{min_len},{max_len}}}(?:{alts})?$")
                }
            }
        };

        let regex = Regex::new(&pattern)
            .map_err(|e| AppError::input(format!("Format `{name}`: invalid pattern: {e}")))?;
        Ok(Self {
            name: name.to_string(),
            regex,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Blank passes; otherwise the whole value must match.
    pub fn is_valid(&self, value: &str) -> bool {
        value.trim().is_empty() || self.regex.is_match(value)
    }
}

/// Escaped `a|b|c`, longest alternative first so the regex prefers it.
fn alternation(items: &[String]) -> String {
    let mut items: Vec<&str> = items
        .iter()
        .map(String::as_str)
        .filter(|s| !s.is_empty())
        .collect();
    items.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    items.dedup();
    items
        .iter()
        .map(|s| regex::escape(s))
        .collect::<Vec<_>>()
        .join("|")
}

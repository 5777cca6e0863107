//! Shared domain types.

use std::fmt;
use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Outcome of one rule evaluation for a row or a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Pass,
    Fail,
    /// The inputs needed by the rule could not be coerced (e.g. non-numeric rank).
    Skip,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pass => "PASS",
            Status::Fail => "FAIL",
            Status::Skip => "SKIP",
        }
    }

    pub fn from_pass(pass: bool) -> Self {
        if pass { Status::Pass } else { Status::Fail }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a report file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Truncate and write header + rows.
    Overwrite,
    /// Append rows; the header is written only when the file does not exist yet.
    Append,
}

/// Per-row rule for the `text` check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TextRule {
    /// No commas; only letters, digits, whitespace and hyphens.
    Charset,
    /// Non-empty and letters only.
    Alphabetic,
    /// Any non-missing value.
    Present,
}

/// How the grouping key of the `processors` check is normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum KeyStyle {
    /// Lowercase, punctuation to spaces (AMD processor series).
    Series,
    /// Chipset names reduced to their model token (`c621`, `w680`, ...).
    Chipset,
}

/// Resolved run-wide settings (CLI flags layered over `.env`).
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Directory reports are written into.
    pub out_dir: PathBuf,
    /// Optional JSON rule book overriding the built-in tables.
    pub rules_path: Option<PathBuf>,
    /// Treat `SKIP` outcomes as failures.
    pub strict: bool,
    /// Optional machine-readable run summary.
    pub summary_json: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("."),
            rules_path: None,
            strict: false,
            summary_json: None,
        }
    }
}

//! In-memory tabular data.
//!
//! Cells are kept as untyped strings exactly as loaded (trimmed); checks coerce
//! numeric fields on demand.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::AppError;

/// A row-level problem encountered while reading the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    /// 1-based line number in the source file.
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct Table {
    /// Where the table was loaded from (used for brand inference and messages).
    pub source: PathBuf,
    /// Header names as they appear in the file (trimmed, BOM removed).
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub row_errors: Vec<RowError>,
    index: HashMap<String, usize>,
}

impl Table {
    pub fn new(source: impl Into<PathBuf>, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let mut index = HashMap::with_capacity(headers.len());
        for (idx, name) in headers.iter().enumerate() {
            // First occurrence wins on duplicate headers.
            index.entry(normalize_header(name)).or_insert(idx);
        }
        Self {
            source: source.into(),
            headers,
            rows,
            row_errors: Vec::new(),
            index,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column position by case-insensitive header name.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.index.get(&normalize_header(name)).copied()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// First column whose normalized header contains `needle`.
    pub fn find_column_containing(&self, needle: &str) -> Option<usize> {
        let needle = needle.to_ascii_lowercase();
        self.headers
            .iter()
            .position(|h| normalize_header(h).contains(&needle))
    }

    /// Names from `required` that have no matching column, in the given order.
    pub fn missing_columns<'a>(&self, required: &[&'a str]) -> Vec<&'a str> {
        required
            .iter()
            .copied()
            .filter(|name| !self.has_column(name))
            .collect()
    }

    pub fn require_columns(&self, required: &[&str]) -> Result<(), AppError> {
        let missing = self.missing_columns(required);
        if missing.is_empty() {
            return Ok(());
        }
        let list = missing
            .iter()
            .map(|name| format!("`{name}`"))
            .collect::<Vec<_>>()
            .join(", ");
        Err(AppError::input(format!(
            "Missing required column(s) in '{}': {list}",
            self.source.display()
        )))
    }

    /// Cell text by row position and column position. Short rows read as empty.
    pub fn cell_at(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Cell text by row position and header name. Unknown columns read as empty.
    pub fn cell(&self, row: usize, name: &str) -> &str {
        match self.column(name) {
            Some(col) => self.cell_at(row, col),
            None => "",
        }
    }

    /// Normalized header set (trimmed, lowercased).
    pub fn normalized_headers(&self) -> Vec<String> {
        self.headers.iter().map(|h| normalize_header(h)).collect()
    }
}

/// Header lookup key: trimmed, BOM stripped, ASCII-lowercased.
pub fn normalize_header(name: &str) -> String {
    // Excel writes UTF-8 CSVs with a BOM on the first header; without stripping
    // it the first column never matches.
    name.trim().trim_start_matches('\u{feff}').trim().to_ascii_lowercase()
}

/// A cell counts as missing when blank or the literal `nan`.
pub fn is_missing(cell: &str) -> bool {
    let cell = cell.trim();
    cell.is_empty() || cell.eq_ignore_ascii_case("nan")
}

/// Numeric coercion: finite `f64`, otherwise `None` (blank, `nan`, text).
pub fn parse_number(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    if is_missing(cell) {
        return None;
    }
    let v = cell.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

/// Integer coercion used for rank/width fields (`"2.0"` → `2`).
pub fn parse_integer(cell: &str) -> Option<i64> {
    // Truncation toward zero matches how the exports store "2.0" style values.
    parse_number(cell).map(|v| v.trunc() as i64)
}

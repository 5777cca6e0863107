//! One module per catalog check.
//!
//! Every check is a pure function from loaded table(s) and options to a
//! [`CheckReport`](crate::report::CheckReport); loading and writing live in
//! `app::pipeline`.

pub mod categories;
pub mod category_values;
pub mod columns;
pub mod dimm_ranks;
pub mod group;
pub mod mapping;
pub mod numeric;
pub mod part_number;
pub mod processors;
pub mod text_columns;

use crate::domain::Table;
use crate::error::AppError;

/// Column position of a header that `require_columns` already vouched for.
pub(crate) fn column_index(table: &Table, name: &str) -> Result<usize, AppError> {
    table.column(name).ok_or_else(|| {
        AppError::input(format!(
            "Missing required column `{name}` in '{}'",
            table.source.display()
        ))
    })
}

/// Display name of a column as spelled in the file.
pub(crate) fn header_name(table: &Table, col: usize) -> String {
    table.headers.get(col).cloned().unwrap_or_default()
}

pub(crate) fn subject(table: &Table) -> String {
    table.source.display().to_string()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::domain::Table;

    /// Table from a header list and string rows.
    pub fn table(name: &str, headers: &[&str], rows: &[&[&str]]) -> Table {
        Table::new(
            name,
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }
}

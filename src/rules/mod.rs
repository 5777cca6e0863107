//! Pure rule helpers shared by the checks.

pub mod catalog;
pub mod consistency;
pub mod format;
pub mod list_cell;
pub mod text;

pub use catalog::RuleBook;
pub use consistency::{Relation, SetComparison, compare_sets};
pub use format::{FormatSpec, FormatValidator};
pub use list_cell::{parse_list_cell, parse_token_set};

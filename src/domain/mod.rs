//! Domain types used throughout the checks.
//!
//! This module defines:
//!
//! - the in-memory `Table` every check reads from
//! - row outcomes (`Status`) and run configuration (`RunConfig`)
//! - CLI-facing enums shared between argument parsing and the checks

pub mod table;
pub mod types;

pub use table::*;
pub use types::*;

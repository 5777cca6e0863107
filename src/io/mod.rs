//! Input/output helpers.
//!
//! - CSV / workbook ingest into a `Table` (`ingest`)
//! - CSV report + JSON summary writers (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;

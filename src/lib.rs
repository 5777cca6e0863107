//! `catalog-checks` library crate.
//!
//! The binary (`catcheck`) is a thin wrapper around this library so that:
//!
//! - every check is testable without spawning processes
//! - checks stay independent, sharing only the small helpers in `rules`
//! - code stays easy to navigate as more checks are added

pub mod app;
pub mod checks;
pub mod cli;
pub mod domain;
pub mod error;
pub mod io;
pub mod report;
pub mod rules;

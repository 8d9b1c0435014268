//! Command line support for tqec-pack.
//!
//! This crate provides:
//! - a loop document parser with input validation
//! - text and JSON reporting of modules and compaction results
//! - logging setup for the `tqec-pack` binary

pub mod logging;
mod parser;
pub mod report;

pub use parser::{DocumentParser, ParseError};

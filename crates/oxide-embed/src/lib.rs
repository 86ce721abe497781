//! Command-line front end for `oxide-embed-core`.
//!
//! Loads a schema catalog from a JSON document and runs the parser and the
//! resolver over queries given on the command line.

pub mod config;
pub mod error;
pub mod report;

pub use error::{CliError, Result};

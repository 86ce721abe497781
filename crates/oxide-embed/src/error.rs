//! Error types for the command-line tool.

use std::path::PathBuf;

use oxide_embed_core::CatalogError;

/// Errors that can occur while loading a catalog or rendering output.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// The catalog file could not be read.
    #[error("Failed to read catalog '{path}': {source}")]
    Io {
        /// Path to the catalog file.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The catalog file is not a valid catalog document.
    #[error("Failed to parse catalog '{path}': {source}")]
    Json {
        /// Path to the catalog file.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },

    /// The catalog document violates the catalog invariants.
    #[error("Invalid catalog '{path}': {source}")]
    Catalog {
        /// Path to the catalog file.
        path: PathBuf,
        /// Underlying error.
        source: CatalogError,
    },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for command-line operations.
pub type Result<T> = std::result::Result<T, CliError>;

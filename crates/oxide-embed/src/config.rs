//! Catalog loading.
//!
//! The catalog is a JSON [`CatalogDocument`]:
//!
//! ```json
//! {
//!   "tables": [
//!     { "name": "users", "columns": [{ "name": "username", "primary_key": true }] }
//!   ],
//!   "foreign_keys": []
//! }
//! ```
//!
//! Columns are nullable unless `"nullable": false` or `"primary_key": true`
//! is given.

use std::fs;
use std::path::Path;

use oxide_embed_core::schema::{CatalogDocument, SchemaCatalog};
use tracing::debug;

use crate::error::{CliError, Result};

/// Reads and validates the catalog at `path`.
///
/// # Errors
///
/// Returns `CliError::Io` if the file cannot be read, `CliError::Json` if
/// it is not a catalog document and `CliError::Catalog` if the document is
/// inconsistent.
pub fn load_catalog(path: &Path) -> Result<SchemaCatalog> {
    let text = fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_catalog(path, &text)
}

/// Validates a catalog document given as JSON text. `path` is only used in
/// error messages.
///
/// # Errors
///
/// Returns `CliError::Json` or `CliError::Catalog` as [`load_catalog`].
pub fn parse_catalog(path: &Path, text: &str) -> Result<SchemaCatalog> {
    let document: CatalogDocument =
        serde_json::from_str(text).map_err(|source| CliError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    let catalog = SchemaCatalog::try_from(document).map_err(|source| CliError::Catalog {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(
        path = %path.display(),
        tables = catalog.tables().len(),
        "catalog loaded"
    );
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    const CATALOG: &str = r#"{
        "tables": [
            { "name": "users", "columns": [{ "name": "username", "primary_key": true }] },
            { "name": "messages", "columns": [
                { "name": "id", "primary_key": true },
                { "name": "username", "nullable": false }
            ] }
        ],
        "foreign_keys": [{
            "name": "messages_username_fkey",
            "table": "messages",
            "columns": ["username"],
            "references_table": "users",
            "references_columns": ["username"]
        }]
    }"#;

    #[test]
    fn test_load_catalog_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(CATALOG.as_bytes()).unwrap();

        let catalog = load_catalog(file.path()).unwrap();
        let users = catalog.table("users").unwrap();
        assert!(!users.get_column("username").unwrap().nullable);
        assert_eq!(catalog.foreign_keys().count(), 1);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        let err = load_catalog(&path).unwrap_err();
        assert!(matches!(err, CliError::Io { .. }));
        assert!(err.to_string().starts_with("Failed to read catalog"));
    }

    #[test]
    fn test_malformed_document() {
        let err = parse_catalog(Path::new("catalog.json"), r#"{ "tables": 3 }"#).unwrap_err();
        assert!(matches!(err, CliError::Json { .. }));
    }

    #[test]
    fn test_inconsistent_document() {
        let text = CATALOG.replace(
            r#""references_table": "users""#,
            r#""references_table": "people""#,
        );
        let err = parse_catalog(Path::new("catalog.json"), &text).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid catalog 'catalog.json': foreign key 'messages_username_fkey' refers to unknown table 'people'"
        );
    }
}

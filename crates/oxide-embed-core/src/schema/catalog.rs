//! The validated, read-only schema catalog.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{CatalogError, ForeignKey, Table};

/// Index of a [`ForeignKey`] inside its [`SchemaCatalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ForeignKeyId(pub(crate) usize);

impl ForeignKeyId {
    /// Returns the position of the key in declaration order.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Serialized form of a catalog, as read from a JSON document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogDocument {
    /// All tables.
    pub tables: Vec<Table>,
    /// All foreign keys.
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKey>,
}

/// Tables and foreign keys that passed validation.
///
/// Every foreign key's tables and columns are guaranteed to exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaCatalog {
    tables: Vec<Table>,
    foreign_keys: Vec<ForeignKey>,
    by_name: HashMap<String, usize>,
}

impl SchemaCatalog {
    /// Builds a catalog, checking that every constraint refers to existing
    /// tables and columns.
    ///
    /// Primary key columns are made NOT NULL whatever their `nullable` flag
    /// says.
    ///
    /// # Errors
    ///
    /// Returns a `CatalogError` describing the first violation found.
    pub fn new(
        mut tables: Vec<Table>,
        foreign_keys: Vec<ForeignKey>,
    ) -> Result<Self, CatalogError> {
        let mut by_name = HashMap::with_capacity(tables.len());
        for (idx, table) in tables.iter_mut().enumerate() {
            for column in table.columns.iter_mut().filter(|c| c.primary_key) {
                column.nullable = false;
            }
            if by_name.insert(table.name.clone(), idx).is_some() {
                return Err(CatalogError::DuplicateTable(table.name.clone()));
            }
            validate_table(table)?;
        }

        let catalog = Self {
            tables,
            foreign_keys,
            by_name,
        };

        catalog.validate_foreign_keys()?;

        debug!(
            tables = catalog.tables.len(),
            foreign_keys = catalog.foreign_keys.len(),
            "schema catalog built"
        );
        Ok(catalog)
    }

    /// Gets a table by name.
    #[must_use]
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.by_name.get(name).map(|&idx| &self.tables[idx])
    }

    /// Returns all tables in declaration order.
    #[must_use]
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    /// Returns the foreign key with the given id.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced from this catalog.
    #[must_use]
    pub fn foreign_key(&self, id: ForeignKeyId) -> &ForeignKey {
        &self.foreign_keys[id.0]
    }

    /// Returns all foreign keys with their ids, in declaration order.
    pub fn foreign_keys(&self) -> impl Iterator<Item = (ForeignKeyId, &ForeignKey)> {
        self.foreign_keys
            .iter()
            .enumerate()
            .map(|(idx, fk)| (ForeignKeyId(idx), fk))
    }

    /// Returns the serializable form of this catalog.
    #[must_use]
    pub fn to_document(&self) -> CatalogDocument {
        CatalogDocument {
            tables: self.tables.clone(),
            foreign_keys: self.foreign_keys.clone(),
        }
    }

    fn validate_foreign_keys(&self) -> Result<(), CatalogError> {
        let mut constraint_names = HashSet::new();
        for fk in &self.foreign_keys {
            if !constraint_names.insert((fk.table.as_str(), fk.name.as_str())) {
                return Err(CatalogError::DuplicateConstraint {
                    table: fk.table.clone(),
                    constraint: fk.name.clone(),
                });
            }
            self.validate_foreign_key(fk)?;
        }
        Ok(())
    }

    fn validate_foreign_key(&self, fk: &ForeignKey) -> Result<(), CatalogError> {
        if fk.columns.is_empty() || fk.references_columns.is_empty() {
            return Err(CatalogError::EmptyConstraint(fk.name.clone()));
        }
        if fk.columns.len() != fk.references_columns.len() {
            return Err(CatalogError::ColumnCountMismatch {
                constraint: fk.name.clone(),
                source_count: fk.columns.len(),
                target_count: fk.references_columns.len(),
            });
        }

        for (table_name, columns) in [
            (&fk.table, &fk.columns),
            (&fk.references_table, &fk.references_columns),
        ] {
            let table = self
                .table(table_name)
                .ok_or_else(|| CatalogError::UnknownTable {
                    constraint: fk.name.clone(),
                    table: table_name.clone(),
                })?;
            for column in columns {
                if table.get_column(column).is_none() {
                    return Err(CatalogError::UnknownColumn {
                        constraint: fk.name.clone(),
                        table: table_name.clone(),
                        column: column.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl TryFrom<CatalogDocument> for SchemaCatalog {
    type Error = CatalogError;

    fn try_from(document: CatalogDocument) -> Result<Self, Self::Error> {
        Self::new(document.tables, document.foreign_keys)
    }
}

fn validate_table(table: &Table) -> Result<(), CatalogError> {
    let mut seen = HashSet::new();
    for column in &table.columns {
        if !seen.insert(column.name.as_str()) {
            return Err(CatalogError::DuplicateColumn {
                table: table.name.clone(),
                column: column.name.clone(),
            });
        }
    }
    for unique in &table.unique_constraints {
        if unique.columns.is_empty() {
            return Err(CatalogError::EmptyConstraint(unique.name.clone()));
        }
        if let Some(missing) = unique.columns.iter().find(|c| !seen.contains(c.as_str())) {
            return Err(CatalogError::UnknownColumn {
                constraint: unique.name.clone(),
                table: table.name.clone(),
                column: missing.clone(),
            });
        }
    }
    Ok(())
}

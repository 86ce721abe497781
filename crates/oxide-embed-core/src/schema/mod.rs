//! Schema catalog: tables, columns and foreign keys.
//!
//! The catalog is supplied by the caller and validated once when it is
//! built. Resolution only ever reads it.

mod catalog;
mod error;

pub use catalog::{CatalogDocument, ForeignKeyId, SchemaCatalog};
pub use error::CatalogError;

use serde::{Deserialize, Serialize};

const fn default_true() -> bool {
    true
}

/// Column metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Database type name, informational only.
    #[serde(default)]
    pub data_type: String,
    /// Whether the column allows NULL values.
    #[serde(default = "default_true")]
    pub nullable: bool,
    /// Whether this column is part of the primary key.
    #[serde(default)]
    pub primary_key: bool,
    /// Whether this column alone carries a UNIQUE constraint.
    #[serde(default)]
    pub unique: bool,
}

impl Column {
    /// Creates a new nullable column.
    #[must_use]
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable: true,
            primary_key: false,
            unique: false,
        }
    }

    /// Sets the column as NOT NULL.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Sets the column as part of the primary key.
    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false; // Primary keys are always NOT NULL
        self
    }

    /// Sets the column as unique.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

/// A multi-column unique constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniqueConstraint {
    /// Constraint name.
    pub name: String,
    /// Columns that form the unique constraint.
    pub columns: Vec<String>,
}

/// Table metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Table name.
    pub name: String,
    /// Columns in declaration order.
    pub columns: Vec<Column>,
    /// Unique constraints spanning one or more columns.
    #[serde(default)]
    pub unique_constraints: Vec<UniqueConstraint>,
}

impl Table {
    /// Creates a new table without columns.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            unique_constraints: Vec::new(),
        }
    }

    /// Adds a column to the table.
    #[must_use]
    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Adds a unique constraint.
    #[must_use]
    pub fn unique_constraint(
        mut self,
        name: impl Into<String>,
        columns: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.unique_constraints.push(UniqueConstraint {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Gets a column by name.
    #[must_use]
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Returns the primary key column names in declaration order.
    pub fn primary_key(&self) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .filter(|c| c.primary_key)
            .map(|c| c.name.as_str())
    }

    /// Returns true if `columns` exactly covers the primary key or a
    /// unique constraint of this table.
    #[must_use]
    pub fn is_unique_key(&self, columns: &[String]) -> bool {
        if columns.is_empty() {
            return false;
        }
        if let [single] = columns {
            if self.get_column(single).is_some_and(|c| c.unique) {
                return true;
            }
        }
        let same_set = |key: &[&str]| {
            key.len() == columns.len() && columns.iter().all(|c| key.contains(&c.as_str()))
        };
        let pk: Vec<&str> = self.primary_key().collect();
        same_set(&pk)
            || self.unique_constraints.iter().any(|u| {
                let key: Vec<&str> = u.columns.iter().map(String::as_str).collect();
                same_set(&key)
            })
    }
}

/// Foreign key constraint metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Constraint name.
    pub name: String,
    /// Referencing (source) table.
    pub table: String,
    /// Column(s) in the referencing table.
    pub columns: Vec<String>,
    /// Referenced (target) table.
    pub references_table: String,
    /// Referenced column(s).
    pub references_columns: Vec<String>,
}

impl ForeignKey {
    /// Creates a new foreign key.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        table: impl Into<String>,
        columns: impl IntoIterator<Item = impl Into<String>>,
        references_table: impl Into<String>,
        references_columns: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            references_table: references_table.into(),
            references_columns: references_columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns true if `column` is one of the source or target columns.
    #[must_use]
    pub fn mentions_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
            || self.references_columns.iter().any(|c| c == column)
    }

    /// Returns true if this key is a self-reference.
    #[must_use]
    pub fn is_self_referencing(&self) -> bool {
        self.table == self.references_table
    }
}

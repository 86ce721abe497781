//! Errors raised while building a schema catalog.

/// A catalog that violates its structural invariants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    /// Two tables share a name.
    #[error("table '{0}' is defined more than once")]
    DuplicateTable(String),

    /// Two columns of the same table share a name.
    #[error("column '{column}' is defined more than once on '{table}'")]
    DuplicateColumn {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
    },

    /// Two foreign keys of the same table share a constraint name.
    #[error("constraint '{constraint}' is defined more than once on '{table}'")]
    DuplicateConstraint {
        /// Source table name.
        table: String,
        /// Constraint name.
        constraint: String,
    },

    /// A foreign key refers to a table missing from the catalog.
    #[error("foreign key '{constraint}' refers to unknown table '{table}'")]
    UnknownTable {
        /// Constraint name.
        constraint: String,
        /// Missing table.
        table: String,
    },

    /// A constraint refers to a column missing from its table.
    #[error("constraint '{constraint}' refers to unknown column '{table}.{column}'")]
    UnknownColumn {
        /// Constraint name.
        constraint: String,
        /// Table the column was looked up on.
        table: String,
        /// Missing column.
        column: String,
    },

    /// A constraint lists no columns.
    #[error("constraint '{0}' has no columns")]
    EmptyConstraint(String),

    /// A foreign key's source and target column lists differ in length.
    #[error(
        "foreign key '{constraint}' maps {source_count} column(s) onto {target_count} column(s)"
    )]
    ColumnCountMismatch {
        /// Constraint name.
        constraint: String,
        /// Number of source columns.
        source_count: usize,
        /// Number of target columns.
        target_count: usize,
    },
}

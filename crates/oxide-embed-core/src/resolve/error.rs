//! Errors attached to nodes of a resolved tree.
//!
//! These are values, not faults: a failed node becomes an error marker in
//! its parent's children and its siblings keep resolving.

use crate::parser::ParseError;

/// Why an item of the query could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EmbedError {
    /// The item failed to parse.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The queried table is not in the catalog.
    #[error("table '{0}' does not exist in the schema catalog")]
    UnknownTable(String),

    /// No foreign key connects the two tables.
    #[error("could not find the relation between {from} and {to}")]
    UnknownRelationship {
        /// Enclosing table.
        from: String,
        /// Embedded resource.
        to: String,
    },

    /// Several foreign keys connect the two tables and nothing picks one.
    #[error(
        "Could not embed because more than one relationship was found for '{to}' and '{from}' you need to hint the column with {to}!<columnName> ?"
    )]
    AmbiguousRelationship {
        /// Enclosing table.
        from: String,
        /// Embedded resource.
        to: String,
        /// Constraint names of the remaining candidates.
        candidates: Vec<String>,
    },

    /// The hint matches none of the foreign keys between the tables.
    #[error("could not find the relation between {from} and {to} using the hint '{hint}'")]
    InvalidHint {
        /// Enclosing table.
        from: String,
        /// Embedded resource.
        to: String,
        /// The hint as written.
        hint: String,
    },

    /// A selected column does not exist.
    #[error("column '{column}' does not exist on '{table}'.")]
    ColumnNotFound {
        /// Table the column was looked up on.
        table: String,
        /// Column name as written.
        column: String,
    },
}

impl EmbedError {
    /// Returns a stable identifier for the error kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Parse(_) => "parse",
            Self::UnknownTable(_) => "unknown_table",
            Self::UnknownRelationship { .. } => "unknown_relationship",
            Self::AmbiguousRelationship { .. } => "ambiguous_relationship",
            Self::InvalidHint { .. } => "invalid_hint",
            Self::ColumnNotFound { .. } => "column_not_found",
        }
    }
}

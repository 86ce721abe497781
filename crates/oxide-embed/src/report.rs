//! Rendering of command output.

use oxide_embed_core::resolve::{Cardinality, Direction, EmbeddingTree, Resolver};
use oxide_embed_core::{Lexer, Parser};
use serde::Serialize;

use crate::error::Result;

/// Renders a resolved tree as JSON.
///
/// # Errors
///
/// Returns `CliError::Serialization` if the tree cannot be serialized.
pub fn tree_json(tree: &EmbeddingTree, compact: bool) -> Result<String> {
    let json = if compact {
        serde_json::to_string(tree)?
    } else {
        serde_json::to_string_pretty(tree)?
    };
    Ok(json)
}

/// Outcome of parsing a query on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseReport {
    /// Canonical form of everything that parsed.
    pub canonical: String,
    /// Parse errors in query order.
    pub errors: Vec<String>,
}

/// Parses `query` without a catalog.
#[must_use]
pub fn parse(query: &str) -> ParseReport {
    let tree = Parser::new(query).parse();
    ParseReport {
        canonical: tree.to_string(),
        errors: tree.errors().iter().map(ToString::to_string).collect(),
    }
}

/// A token of a query, as listed by `tokens`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenRow {
    /// Start byte offset.
    pub start: usize,
    /// End byte offset.
    pub end: usize,
    /// Token description.
    pub kind: String,
    /// Source text covered by the token.
    pub text: String,
}

/// Splits `query` into tokens, ending with the end-of-input token.
#[must_use]
pub fn tokens(query: &str) -> Vec<TokenRow> {
    Lexer::new(query)
        .tokenize()
        .into_iter()
        .map(|token| TokenRow {
            start: token.span.start,
            end: token.span.end,
            kind: token.kind.describe(),
            text: token.span.text(query).unwrap_or_default().to_owned(),
        })
        .collect()
}

/// A foreign key connecting two tables, as listed by `relationships`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationshipRow {
    /// Constraint name.
    pub constraint: String,
    /// Which side holds the key, seen from the first table.
    pub direction: Direction,
    /// Cardinality of an embedding through this key.
    pub cardinality: Cardinality,
    /// `table(columns)` of the referencing side.
    pub source: String,
    /// `table(columns)` of the referenced side.
    pub target: String,
}

/// Lists the foreign keys usable to embed `to` inside `from`.
#[must_use]
pub fn relationships(resolver: &Resolver<'_>, from: &str, to: &str) -> Vec<RelationshipRow> {
    let catalog = resolver.catalog();
    resolver
        .candidates(from, to)
        .into_iter()
        .map(|candidate| {
            let fk = catalog.foreign_key(candidate.foreign_key);
            RelationshipRow {
                constraint: fk.name.clone(),
                direction: candidate.direction,
                cardinality: resolver.cardinality(candidate),
                source: format!("{}({})", fk.table, fk.columns.join(", ")),
                target: format!(
                    "{}({})",
                    fk.references_table,
                    fk.references_columns.join(", ")
                ),
            }
        })
        .collect()
}

/// Formats a row for terminal output.
#[must_use]
pub fn format_row(row: &RelationshipRow) -> String {
    let direction = match row.direction {
        Direction::Forward => "forward",
        Direction::Reverse => "reverse",
    };
    let cardinality = match row.cardinality {
        Cardinality::ToOne => "to-one",
        Cardinality::ToMany => "to-many",
    };
    format!(
        "{:<40} {:<8} {:<8} {} -> {}",
        row.constraint, direction, cardinality, row.source, row.target
    )
}

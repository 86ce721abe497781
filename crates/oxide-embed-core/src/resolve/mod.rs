//! Relationship resolution and shape composition.
//!
//! Each embedded resource is matched to exactly one foreign key between
//! its table and the enclosing one, then given a cardinality and a
//! nullability. Anything that cannot be resolved becomes an error marker
//! in the tree and its siblings are resolved independently.

mod compose;
mod error;
mod relationship;
mod tree;

pub use compose::Resolver;
pub use error::EmbedError;
pub use relationship::{Candidate, Cardinality, Direction, RelationshipIndex, ResolvedRelationship};
pub use tree::{EmbedId, Embedding, EmbeddingNode, EmbeddingTree, SelectedField};

use crate::schema::SchemaCatalog;

/// Parses `query` and resolves it against `catalog`, rooted at
/// `root_table`.
///
/// Builds a fresh relationship index; use [`Resolver`] to reuse one.
///
/// # Errors
///
/// Returns `UnknownTable` if `root_table` is not in the catalog.
pub fn resolve_query(
    catalog: &SchemaCatalog,
    root_table: &str,
    query: &str,
) -> Result<EmbeddingTree, EmbedError> {
    Resolver::new(catalog).resolve_str(root_table, query)
}

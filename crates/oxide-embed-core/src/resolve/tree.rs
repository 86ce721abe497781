//! The resolved embedding tree.
//!
//! Like the query tree, nodes live in an arena and refer to their children
//! by [`EmbedId`]. The root is stored apart since it always resolves.

use serde::ser::{Serialize, SerializeStruct, Serializer};

use super::{Cardinality, EmbedError, ResolvedRelationship};
use crate::ast::{Aggregate, JoinModifier};

/// Index of an [`EmbeddingNode`] inside its [`EmbeddingTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EmbedId(pub(crate) usize);

impl EmbedId {
    /// Returns the arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// A field selected on an embedding.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SelectedField {
    /// Key in the result row.
    pub key: String,
    /// Source column. `None` for `count()`.
    pub column: Option<String>,
    /// Cast target.
    pub cast: Option<String>,
    /// Aggregate wrapper.
    pub aggregate: Option<Aggregate>,
    /// Whether the value may be null.
    pub nullable: bool,
}

/// A successfully resolved resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Embedding {
    /// Key in the parent row (alias or name).
    pub key: String,
    /// Table the rows come from.
    pub table: String,
    /// Alias as written.
    pub alias: Option<String>,
    /// One row or many.
    pub cardinality: Cardinality,
    /// Whether a to-one embedding may be null.
    pub nullable: bool,
    /// Join modifier as written.
    pub join: JoinModifier,
    /// How the resource relates to its parent. `None` for the root.
    pub relationship: Option<ResolvedRelationship>,
    /// Selected fields in query order.
    pub fields: Vec<SelectedField>,
    /// Nested embeddings and error markers in query order.
    pub children: Vec<EmbedId>,
}

impl Embedding {
    /// Returns the selected field with the given key.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&SelectedField> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// Returns the keys of the selected fields in order.
    pub fn field_keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.key.as_str())
    }
}

/// A child of an embedding: resolved, or an error in its place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbeddingNode {
    /// The resource resolved.
    Resolved(Embedding),
    /// The item failed. Its subtree was not resolved.
    Failed {
        /// Key the item would have had. `None` when it failed to parse.
        key: Option<String>,
        /// Why it failed.
        error: EmbedError,
    },
}

impl EmbeddingNode {
    /// Returns the key of the node, if it has one.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Resolved(embedding) => Some(&embedding.key),
            Self::Failed { key, .. } => key.as_deref(),
        }
    }

    /// Returns the embedding if the node resolved.
    #[must_use]
    pub const fn as_resolved(&self) -> Option<&Embedding> {
        match self {
            Self::Resolved(embedding) => Some(embedding),
            Self::Failed { .. } => None,
        }
    }

    /// Returns the error if the node failed.
    #[must_use]
    pub const fn error(&self) -> Option<&EmbedError> {
        match self {
            Self::Resolved(_) => None,
            Self::Failed { error, .. } => Some(error),
        }
    }
}

/// Result of resolving a query against a catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddingTree {
    pub(crate) root: Embedding,
    pub(crate) nodes: Vec<EmbeddingNode>,
}

impl EmbeddingTree {
    /// Returns the queried table.
    #[must_use]
    pub const fn root(&self) -> &Embedding {
        &self.root
    }

    /// Returns the node with the given id.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced by this tree.
    #[must_use]
    pub fn node(&self, id: EmbedId) -> &EmbeddingNode {
        &self.nodes[id.0]
    }

    /// Returns the children of `embedding` in query order.
    pub fn children<'a>(
        &'a self,
        embedding: &'a Embedding,
    ) -> impl Iterator<Item = &'a EmbeddingNode> + 'a {
        embedding.children.iter().map(|&id| self.node(id))
    }

    /// Returns the first child of `embedding` with the given key.
    #[must_use]
    pub fn child<'a>(&'a self, embedding: &'a Embedding, key: &str) -> Option<&'a EmbeddingNode> {
        self.children(embedding).find(|node| node.key() == Some(key))
    }

    /// Walks down from the root following `path` keys.
    ///
    /// Every step but the last must be a resolved embedding.
    #[must_use]
    pub fn get(&self, path: &[&str]) -> Option<&EmbeddingNode> {
        let (last, parents) = path.split_last()?;
        let mut current = &self.root;
        for key in parents {
            current = self.child(current, key)?.as_resolved()?;
        }
        self.child(current, last)
    }

    /// Returns the number of nodes below the root.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if nothing was embedded below the root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns all errors in depth-first query order.
    #[must_use]
    pub fn errors(&self) -> Vec<&EmbedError> {
        let mut errors = Vec::new();
        self.collect_errors(&self.root, &mut errors);
        errors
    }

    /// Returns true if any node failed.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.nodes
            .iter()
            .any(|node| matches!(node, EmbeddingNode::Failed { .. }))
    }

    fn collect_errors<'a>(&'a self, embedding: &'a Embedding, out: &mut Vec<&'a EmbedError>) {
        for node in self.children(embedding) {
            match node {
                EmbeddingNode::Resolved(child) => self.collect_errors(child, out),
                EmbeddingNode::Failed { error, .. } => out.push(error),
            }
        }
    }
}

/// Serializes as nested objects, the root first.
impl Serialize for EmbeddingTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        EmbeddingView {
            tree: self,
            embedding: &self.root,
        }
        .serialize(serializer)
    }
}

struct EmbeddingView<'a> {
    tree: &'a EmbeddingTree,
    embedding: &'a Embedding,
}

impl Serialize for EmbeddingView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let embedding = self.embedding;
        let mut state = serializer.serialize_struct("Embedding", 9)?;
        state.serialize_field("key", &embedding.key)?;
        state.serialize_field("table", &embedding.table)?;
        state.serialize_field("alias", &embedding.alias)?;
        state.serialize_field("cardinality", &embedding.cardinality)?;
        state.serialize_field("nullable", &embedding.nullable)?;
        state.serialize_field("join", &embedding.join)?;
        state.serialize_field("relationship", &embedding.relationship)?;
        state.serialize_field("fields", &embedding.fields)?;
        state.serialize_field(
            "children",
            &ChildrenView {
                tree: self.tree,
                ids: &embedding.children,
            },
        )?;
        state.end()
    }
}

struct ChildrenView<'a> {
    tree: &'a EmbeddingTree,
    ids: &'a [EmbedId],
}

impl Serialize for ChildrenView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.ids.iter().map(|&id| NodeView {
            tree: self.tree,
            node: self.tree.node(id),
        }))
    }
}

struct NodeView<'a> {
    tree: &'a EmbeddingTree,
    node: &'a EmbeddingNode,
}

impl Serialize for NodeView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.node {
            EmbeddingNode::Resolved(embedding) => EmbeddingView {
                tree: self.tree,
                embedding,
            }
            .serialize(serializer),
            EmbeddingNode::Failed { key, error } => {
                let mut state = serializer.serialize_struct("Failed", 2)?;
                state.serialize_field("key", key)?;
                state.serialize_field("error", &ErrorView(error))?;
                state.end()
            }
        }
    }
}

struct ErrorView<'a>(&'a EmbedError);

impl Serialize for ErrorView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Error", 2)?;
        state.serialize_field("kind", self.0.kind())?;
        state.serialize_field("message", &self.0.to_string())?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(key: &str) -> SelectedField {
        SelectedField {
            key: key.to_owned(),
            column: Some(key.to_owned()),
            cast: None,
            aggregate: None,
            nullable: false,
        }
    }

    fn embedding(key: &str, children: Vec<EmbedId>) -> Embedding {
        Embedding {
            key: key.to_owned(),
            table: key.to_owned(),
            alias: None,
            cardinality: Cardinality::ToMany,
            nullable: false,
            join: JoinModifier::Default,
            relationship: None,
            fields: vec![field("id")],
            children,
        }
    }

    fn sample() -> EmbeddingTree {
        let failed = EmbeddingNode::Failed {
            key: Some(String::from("users")),
            error: EmbedError::UnknownRelationship {
                from: String::from("channels"),
                to: String::from("users"),
            },
        };
        EmbeddingTree {
            root: embedding("messages", vec![EmbedId(1)]),
            nodes: vec![
                failed,
                EmbeddingNode::Resolved(embedding("channels", vec![EmbedId(0)])),
            ],
        }
    }

    #[test]
    fn test_get_follows_keys() {
        let tree = sample();
        assert!(tree.get(&[]).is_none());
        assert_eq!(
            tree.get(&["channels"]).and_then(EmbeddingNode::key),
            Some("channels")
        );
        let failed = tree.get(&["channels", "users"]).unwrap();
        assert_eq!(failed.error().map(EmbedError::kind), Some("unknown_relationship"));
        assert!(tree.get(&["channels", "users", "id"]).is_none());
    }

    #[test]
    fn test_errors_are_collected() {
        let tree = sample();
        assert!(tree.has_errors());
        assert_eq!(tree.errors().len(), 1);
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_serializes_nested_children() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["key"], "messages");
        assert_eq!(json["cardinality"], "to_many");
        assert_eq!(json["join"], "default");
        assert_eq!(json["fields"][0]["key"], "id");
        let channels = &json["children"][0];
        assert_eq!(channels["table"], "channels");
        let error = &channels["children"][0]["error"];
        assert_eq!(error["kind"], "unknown_relationship");
        assert_eq!(
            error["message"],
            "could not find the relation between channels and users"
        );
    }
}

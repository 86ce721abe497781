//! Syntax tree types for embedding queries.

mod query;

pub use query::{Aggregate, ColumnRef, JoinModifier, NodeId, QueryNode, QueryTree, SelectItem};

//! # oxide-embed-core
//!
//! Parser and relationship resolver for resource embedding queries.
//!
//! This crate provides:
//! - A hand-written recursive descent parser for `select` lists with nested
//!   resources, aliases, casts, aggregates, join modifiers and hints
//! - A validated schema catalog of tables, columns and foreign keys
//! - A resolver that matches every embedded resource to one foreign key and
//!   derives its cardinality and nullability
//!
//! ## Parsing
//!
//! The parser needs no schema. Errors are kept in the tree next to the
//! items that caused them:
//!
//! ```rust
//! use oxide_embed_core::Parser;
//!
//! let tree = Parser::new("id, author:users!inner(username)").parse();
//! assert!(tree.errors().is_empty());
//! assert_eq!(tree.to_string(), "id,author:users!inner(username)");
//! ```
//!
//! ## Resolving
//!
//! ```rust
//! use oxide_embed_core::resolve::{resolve_query, Cardinality};
//! use oxide_embed_core::schema::{Column, ForeignKey, SchemaCatalog, Table};
//!
//! let catalog = SchemaCatalog::new(
//!     vec![
//!         Table::new("users").column(Column::new("username", "text").primary_key()),
//!         Table::new("messages")
//!             .column(Column::new("id", "int8").primary_key())
//!             .column(Column::new("username", "text").not_null()),
//!     ],
//!     vec![ForeignKey::new(
//!         "messages_username_fkey",
//!         "messages",
//!         ["username"],
//!         "users",
//!         ["username"],
//!     )],
//! )
//! .unwrap();
//!
//! let tree = resolve_query(&catalog, "messages", "id,users(username)").unwrap();
//! let users = tree.get(&["users"]).and_then(|node| node.as_resolved()).unwrap();
//! assert_eq!(users.cardinality, Cardinality::ToOne);
//! assert!(!users.nullable);
//! ```

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod resolve;
pub mod schema;

pub use ast::{QueryNode, QueryTree, SelectItem};
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::{ParseError, Parser};
pub use resolve::{EmbedError, EmbeddingTree, Resolver, resolve_query};
pub use schema::{CatalogError, SchemaCatalog};

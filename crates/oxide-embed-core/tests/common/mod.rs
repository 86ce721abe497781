#![allow(dead_code)]

use oxide_embed_core::ast::{QueryNode, QueryTree, SelectItem};
use oxide_embed_core::resolve::{Embedding, EmbeddingNode, EmbeddingTree, Resolver};
use oxide_embed_core::schema::{Column, ForeignKey, SchemaCatalog, Table};
use oxide_embed_core::{EmbedError, ParseError, Parser};

/// Chat schema: users post messages in channels, channels may have one
/// details row, best friends link three users, profiles optionally point
/// at a user and employees report to each other.
pub fn chat_catalog() -> SchemaCatalog {
    let tables = vec![
        Table::new("users")
            .column(Column::new("username", "text").primary_key())
            .column(Column::new("data", "jsonb"))
            .column(Column::new("age_range", "int4range"))
            .column(Column::new("catchphrase", "tsvector"))
            .column(Column::new("status", "user_status")),
        Table::new("channels")
            .column(Column::new("id", "int8").primary_key())
            .column(Column::new("data", "jsonb"))
            .column(Column::new("slug", "text")),
        Table::new("messages")
            .column(Column::new("id", "int8").primary_key())
            .column(Column::new("data", "jsonb"))
            .column(Column::new("message", "text"))
            .column(Column::new("username", "text").not_null())
            .column(Column::new("channel_id", "int8").not_null()),
        Table::new("channel_details")
            .column(Column::new("id", "int8").primary_key())
            .column(Column::new("details", "text")),
        Table::new("best_friends")
            .column(Column::new("id", "int8").primary_key())
            .column(Column::new("first_user", "text").not_null())
            .column(Column::new("second_user", "text").not_null())
            .column(Column::new("third_wheel", "text")),
        Table::new("user_profiles")
            .column(Column::new("id", "int8").primary_key())
            .column(Column::new("username", "text")),
        Table::new("employees")
            .column(Column::new("id", "int8").primary_key())
            .column(Column::new("name", "text").not_null())
            .column(Column::new("manager_id", "int8")),
    ];
    let foreign_keys = vec![
        ForeignKey::new(
            "messages_username_fkey",
            "messages",
            ["username"],
            "users",
            ["username"],
        ),
        ForeignKey::new(
            "messages_channel_id_fkey",
            "messages",
            ["channel_id"],
            "channels",
            ["id"],
        ),
        ForeignKey::new(
            "channel_details_id_fkey",
            "channel_details",
            ["id"],
            "channels",
            ["id"],
        ),
        ForeignKey::new(
            "best_friends_first_user_fkey",
            "best_friends",
            ["first_user"],
            "users",
            ["username"],
        ),
        ForeignKey::new(
            "best_friends_second_user_fkey",
            "best_friends",
            ["second_user"],
            "users",
            ["username"],
        ),
        ForeignKey::new(
            "best_friends_third_wheel_fkey",
            "best_friends",
            ["third_wheel"],
            "users",
            ["username"],
        ),
        ForeignKey::new(
            "user_profiles_username_fkey",
            "user_profiles",
            ["username"],
            "users",
            ["username"],
        ),
        ForeignKey::new(
            "employees_manager_id_fkey",
            "employees",
            ["manager_id"],
            "employees",
            ["id"],
        ),
    ];
    SchemaCatalog::new(tables, foreign_keys)
        .unwrap_or_else(|e| panic!("Invalid fixture catalog: {e}"))
}

pub fn parse(query: &str) -> QueryTree {
    let tree = Parser::new(query).parse();
    let errors = tree.errors();
    assert!(
        errors.is_empty(),
        "Failed to parse: {query}\nErrors: {errors:?}"
    );
    tree
}

pub fn parse_err(query: &str) -> ParseError {
    Parser::new(query)
        .parse_strict()
        .expect_err(&format!("Expected parse error for: {query}"))
}

/// Returns the node of the embedded item at `index` of `items`.
pub fn embed_at<'a>(tree: &'a QueryTree, items: &[SelectItem], index: usize) -> &'a QueryNode {
    match &items[index] {
        SelectItem::Embed(id) => tree.node(*id),
        other => panic!("Expected embedded resource, got {other:?}"),
    }
}

/// Verifies that `to_string()` produces a fixed point.
pub fn round_trip(query: &str) {
    let tree1 = parse(query);
    let rendered1 = tree1.to_string();
    let tree2 = parse(&rendered1);
    let rendered2 = tree2.to_string();
    assert_eq!(
        rendered1, rendered2,
        "Round-trip failed.\n  Input:    {query}\n  First:    {rendered1}\n  Second:   {rendered2}"
    );
}

pub fn resolve(table: &str, query: &str) -> EmbeddingTree {
    let catalog = chat_catalog();
    Resolver::new(&catalog)
        .resolve_str(table, query)
        .unwrap_or_else(|e| panic!("Failed to resolve {table}?select={query}\nError: {e}"))
}

/// Returns the resolved embedding at `path`.
pub fn embedding<'a>(tree: &'a EmbeddingTree, path: &[&str]) -> &'a Embedding {
    match tree.get(path) {
        Some(EmbeddingNode::Resolved(embedding)) => embedding,
        other => panic!("Expected resolved embedding at {path:?}, got {other:?}"),
    }
}

/// Returns the error attached at `path`.
pub fn error_at<'a>(tree: &'a EmbeddingTree, path: &[&str]) -> &'a EmbedError {
    match tree.get(path) {
        Some(EmbeddingNode::Failed { error, .. }) => error,
        other => panic!("Expected error at {path:?}, got {other:?}"),
    }
}

pub fn field_keys(embedding: &Embedding) -> Vec<&str> {
    embedding.field_keys().collect()
}

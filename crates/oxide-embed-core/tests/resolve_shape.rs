//! Tests for the shape of resolved trees: cardinality, nullability, fields
//! and error markers.

mod common;
use common::*;

use oxide_embed_core::resolve::{resolve_query, Cardinality, EmbeddingNode, Resolver};
use oxide_embed_core::EmbedError;

const AMBIGUOUS_USERS: &str = "Could not embed because more than one relationship was found for 'users' and 'best_friends' you need to hint the column with users!<columnName> ?";

#[test]
fn root_is_the_queried_table() {
    let tree = resolve("messages", "id,message");
    let root = tree.root();
    assert_eq!(root.table, "messages");
    assert_eq!(root.cardinality, Cardinality::ToMany);
    assert!(!root.nullable);
    assert!(root.relationship.is_none());
    assert!(tree.is_empty());
}

#[test]
fn unknown_root_table_is_an_error() {
    let catalog = chat_catalog();
    let err = Resolver::new(&catalog).resolve_str("people", "*").unwrap_err();
    assert_eq!(err, EmbedError::UnknownTable(String::from("people")));
    assert_eq!(
        err.to_string(),
        "table 'people' does not exist in the schema catalog"
    );
}

#[test]
fn many_to_one_with_not_null_column() {
    let tree = resolve("messages", "id,users(username,status)");
    let users = embedding(&tree, &["users"]);
    assert_eq!(users.table, "users");
    assert_eq!(users.cardinality, Cardinality::ToOne);
    assert!(!users.nullable);
    assert_eq!(field_keys(users), ["username", "status"]);
    let relationship = users.relationship.as_ref().unwrap();
    assert_eq!(relationship.constraint, "messages_username_fkey");
}

#[test]
fn many_to_one_with_nullable_column() {
    let tree = resolve("user_profiles", "id,users(*)");
    let users = embedding(&tree, &["users"]);
    assert_eq!(users.cardinality, Cardinality::ToOne);
    assert!(users.nullable);
}

#[test]
fn one_to_one_from_child_side() {
    let tree = resolve("channels", "id,channel_details(*)");
    let details = embedding(&tree, &["channel_details"]);
    assert_eq!(details.cardinality, Cardinality::ToOne);
    assert!(details.nullable);

    let tree = resolve("channels", "id,channel_details!inner(*)");
    let details = embedding(&tree, &["channel_details"]);
    assert_eq!(details.cardinality, Cardinality::ToOne);
    assert!(!details.nullable);
}

#[test]
fn one_to_many_is_a_non_null_array() {
    let tree = resolve("users", "username,messages(*)");
    let messages = embedding(&tree, &["messages"]);
    assert_eq!(messages.cardinality, Cardinality::ToMany);
    assert!(!messages.nullable);
}

#[test]
fn left_forces_nullable_to_one() {
    let tree = resolve("channels", "id,channel_details!left(*)");
    assert!(embedding(&tree, &["channel_details"]).nullable);

    // The underlying column is NOT NULL.
    let tree = resolve("channel_details", "id,channels!left(*)");
    let channels = embedding(&tree, &["channels"]);
    assert_eq!(channels.cardinality, Cardinality::ToOne);
    assert!(channels.nullable);

    let tree = resolve("messages", "id,users!left(*)");
    assert!(embedding(&tree, &["users"]).nullable);
}

#[test]
fn left_keeps_to_many_non_null() {
    let tree = resolve("users", "username,messages!left(*)");
    let messages = embedding(&tree, &["messages"]);
    assert_eq!(messages.cardinality, Cardinality::ToMany);
    assert!(!messages.nullable);
}

#[test]
fn inner_forces_non_null() {
    // The underlying column is nullable.
    let tree = resolve("user_profiles", "id,users!inner(*)");
    assert!(!embedding(&tree, &["users"]).nullable);

    let tree = resolve(
        "best_friends",
        "id,first_user:users!best_friends_first_user_fkey!inner(*)",
    );
    assert!(!embedding(&tree, &["first_user"]).nullable);
}

#[test]
fn modifier_does_not_reach_children() {
    let tree = resolve("channels", "id,messages!inner(id,users(username))");
    let messages = embedding(&tree, &["messages"]);
    assert!(!messages.nullable);
    let users = embedding(&tree, &["messages", "users"]);
    assert!(!users.nullable);

    let tree = resolve("channels", "id,messages!left(id,user_profiles:users(username))");
    assert!(!embedding(&tree, &["messages", "user_profiles"]).nullable);
}

#[test]
fn ambiguous_embedding_is_an_error_value() {
    let tree = resolve("best_friends", "id,users(*)");
    let error = error_at(&tree, &["users"]);
    assert_eq!(error.to_string(), AMBIGUOUS_USERS);
    assert_eq!(field_keys(tree.root()), ["id"]);
}

#[test]
fn hinted_joins_between_a_pair_with_several_keys_are_nullable() {
    let tree = resolve(
        "best_friends",
        "first_user:users!best_friends_first_user_fkey(*),second_user:users!second_user(*),third_wheel:users!third_wheel(*)",
    );
    assert!(!tree.has_errors());
    for key in ["first_user", "second_user", "third_wheel"] {
        let users = embedding(&tree, &[key]);
        assert_eq!(users.cardinality, Cardinality::ToOne, "{key}");
        assert!(users.nullable, "{key}");
    }
    let first = embedding(&tree, &["first_user"]);
    assert_eq!(
        first.relationship.as_ref().unwrap().constraint,
        "best_friends_first_user_fkey"
    );
}

#[test]
fn hinted_reverse_joins_are_arrays() {
    let tree = resolve(
        "users",
        "username,first_friend_of:best_friends!first_user(*),second_friend_of:best_friends!second_user(*),third_wheel_of:best_friends!third_wheel(id)",
    );
    for key in ["first_friend_of", "second_friend_of", "third_wheel_of"] {
        let friends = embedding(&tree, &[key]);
        assert_eq!(friends.cardinality, Cardinality::ToMany, "{key}");
        assert!(!friends.nullable, "{key}");
    }
    assert_eq!(field_keys(embedding(&tree, &["third_wheel_of"])), ["id"]);
    assert_eq!(embedding(&tree, &["first_friend_of"]).fields.len(), 4);
}

#[test]
fn hint_position_among_modifiers_is_irrelevant() {
    let a = resolve("best_friends", "users!inner!first_user(username)");
    let b = resolve("best_friends", "users!first_user!inner(username)");
    assert_eq!(a, b);
    let users = embedding(&a, &["users"]);
    assert_eq!(
        users.relationship.as_ref().unwrap().constraint,
        "best_friends_first_user_fkey"
    );
    assert!(!users.nullable);
}

#[test]
fn error_inside_resolved_child_stays_there() {
    let tree = resolve(
        "users",
        "username,first_friend_of:best_friends!first_user(id,users(*))",
    );
    let friends = embedding(&tree, &["first_friend_of"]);
    assert_eq!(field_keys(friends), ["id"]);
    let error = error_at(&tree, &["first_friend_of", "users"]);
    assert_eq!(error.to_string(), AMBIGUOUS_USERS);
    assert_eq!(tree.errors().len(), 1);
}

#[test]
fn siblings_of_a_failed_node_resolve() {
    let tree = resolve(
        "best_friends",
        "id,users(*),first:users!first_user(username),nope:users!nope(*),third_wheel",
    );
    assert_eq!(error_at(&tree, &["users"]).kind(), "ambiguous_relationship");
    assert_eq!(error_at(&tree, &["nope"]).kind(), "invalid_hint");
    assert_eq!(field_keys(embedding(&tree, &["first"])), ["username"]);
    assert_eq!(field_keys(tree.root()), ["id", "third_wheel"]);

    let kinds: Vec<&str> = tree.errors().iter().map(|e| e.kind()).collect();
    assert_eq!(kinds, ["ambiguous_relationship", "invalid_hint"]);
}

#[test]
fn unknown_relationship_and_column() {
    let tree = resolve("users", "username,channels(*),email");
    assert_eq!(
        error_at(&tree, &["channels"]).to_string(),
        "could not find the relation between users and channels"
    );
    assert_eq!(
        error_at(&tree, &["email"]).to_string(),
        "column 'email' does not exist on 'users'."
    );
    assert_eq!(field_keys(tree.root()), ["username"]);
}

#[test]
fn plain_name_of_related_table_is_embedded() {
    let tree = resolve("messages", "id,users");
    let users = embedding(&tree, &["users"]);
    assert_eq!(users.cardinality, Cardinality::ToOne);
    assert_eq!(users.fields.len(), 5);

    let tree = resolve("messages", "id,author:users");
    assert_eq!(embedding(&tree, &["author"]).table, "users");

    let tree = resolve("best_friends", "id,users");
    assert_eq!(error_at(&tree, &["users"]).kind(), "ambiguous_relationship");
}

#[test]
fn selected_fields_follow_query_order() {
    let tree = resolve("users", "status,username,catchphrase");
    assert_eq!(field_keys(tree.root()), ["status", "username", "catchphrase"]);

    let tree = resolve("users", "status,*");
    assert_eq!(
        field_keys(tree.root()),
        ["status", "username", "data", "age_range", "catchphrase", "status"]
    );

    let tree = resolve("users", "name:username,state:status::text");
    let root = tree.root();
    assert_eq!(field_keys(root), ["name", "state"]);
    let state = root.field("state").unwrap();
    assert_eq!(state.column.as_deref(), Some("status"));
    assert_eq!(state.cast.as_deref(), Some("text"));
}

#[test]
fn empty_and_missing_lists() {
    let tree = resolve("users", "");
    assert_eq!(tree.root().fields.len(), 5);

    let tree = resolve("messages", "id,users()");
    assert!(embedding(&tree, &["users"]).fields.is_empty());

    let tree = resolve("messages", "id,users!inner");
    let users = embedding(&tree, &["users"]);
    assert_eq!(users.fields.len(), 5);
    assert!(!users.nullable);
}

#[test]
fn field_nullability() {
    let tree = resolve(
        "messages",
        "username,message,count(),id.count(),latest:id.max()",
    );
    let root = tree.root();
    assert!(!root.field("username").unwrap().nullable);
    assert!(root.field("message").unwrap().nullable);
    assert!(!root.field("count").unwrap().nullable);
    assert!(root.field("latest").unwrap().nullable);
    assert_eq!(field_keys(root), ["username", "message", "count", "count", "latest"]);
    assert!(root.fields[2].column.is_none());
    assert_eq!(root.fields[3].column.as_deref(), Some("id"));
}

#[test]
fn parse_errors_become_error_markers() {
    let tree = resolve("users", "username,:status,messages!inner!left(id)");
    assert_eq!(field_keys(tree.root()), ["username"]);
    let errors = tree.errors();
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().all(|e| matches!(e, EmbedError::Parse(_))));
    assert!(tree.children(tree.root()).all(|node| node.key().is_none()));
}

#[test]
fn self_reference_with_column_hints() {
    let tree = resolve(
        "employees",
        "name,manager:employees!manager_id(name),reports:employees!id(name)",
    );
    let manager = embedding(&tree, &["manager"]);
    assert_eq!(manager.cardinality, Cardinality::ToOne);
    assert!(manager.nullable);
    let reports = embedding(&tree, &["reports"]);
    assert_eq!(reports.cardinality, Cardinality::ToMany);
    assert!(!reports.nullable);
}

#[test]
fn resolution_is_idempotent() {
    let catalog = chat_catalog();
    let resolver = Resolver::new(&catalog);
    let query = "id,users(*),first:users!first_user(username,messages(id)),third_wheel";
    let first = resolver.resolve_str("best_friends", query).unwrap();
    let second = resolver.resolve_str("best_friends", query).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
    assert_eq!(resolve_query(&catalog, "best_friends", query).unwrap(), first);
}

#[test]
fn serialized_tree() {
    let tree = resolve("messages", "id,author:users(username),channels!inner(nope)");
    let json = serde_json::to_value(&tree).unwrap();
    assert_eq!(json["table"], "messages");
    assert_eq!(json["relationship"], serde_json::Value::Null);

    let author = &json["children"][0];
    assert_eq!(author["key"], "author");
    assert_eq!(author["alias"], "author");
    assert_eq!(author["cardinality"], "to_one");
    assert_eq!(author["nullable"], false);
    assert_eq!(author["relationship"]["constraint"], "messages_username_fkey");
    assert_eq!(author["relationship"]["direction"], "forward");
    assert_eq!(author["fields"][0]["key"], "username");

    let channels = &json["children"][1];
    assert_eq!(channels["join"], "inner");
    let missing = &channels["children"][0];
    assert_eq!(missing["key"], "nope");
    assert_eq!(missing["error"]["kind"], "column_not_found");
    assert_eq!(
        missing["error"]["message"],
        "column 'nope' does not exist on 'channels'."
    );
}

#[test]
fn nodes_are_reachable_by_id() {
    let tree = resolve("channels", "id,messages(id,users(username))");
    let messages = embedding(&tree, &["messages"]);
    let id = messages.children[0];
    assert!(matches!(tree.node(id), EmbeddingNode::Resolved(users) if users.table == "users"));
    assert_eq!(tree.len(), 2);
}

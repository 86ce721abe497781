//! Composition of a parsed query into an embedding tree.

use std::borrow::Cow;

use tracing::debug;

use super::relationship::{self, Candidate, Cardinality, Direction, RelationshipIndex};
use super::tree::{EmbedId, Embedding, EmbeddingNode, EmbeddingTree, SelectedField};
use super::{EmbedError, ResolvedRelationship};
use crate::ast::{Aggregate, ColumnRef, JoinModifier, QueryTree, SelectItem};
use crate::parser::Parser;
use crate::schema::{SchemaCatalog, Table};

/// Resolves queries against a schema catalog.
///
/// The resolver only reads the catalog and its relationship index, so one
/// instance can serve any number of resolutions.
#[derive(Debug, Clone)]
pub struct Resolver<'a> {
    catalog: &'a SchemaCatalog,
    index: Cow<'a, RelationshipIndex>,
}

impl<'a> Resolver<'a> {
    /// Creates a resolver, indexing the catalog's foreign keys.
    #[must_use]
    pub fn new(catalog: &'a SchemaCatalog) -> Self {
        Self {
            catalog,
            index: Cow::Owned(RelationshipIndex::new(catalog)),
        }
    }

    /// Creates a resolver over an index built beforehand from `catalog`.
    #[must_use]
    pub const fn with_index(catalog: &'a SchemaCatalog, index: &'a RelationshipIndex) -> Self {
        Self {
            catalog,
            index: Cow::Borrowed(index),
        }
    }

    /// Returns the catalog.
    #[must_use]
    pub const fn catalog(&self) -> &'a SchemaCatalog {
        self.catalog
    }

    /// Returns the relationship index.
    #[must_use]
    pub fn index(&self) -> &RelationshipIndex {
        &self.index
    }

    /// Lists every foreign key connecting `from` and `to`, keys held by
    /// `from` first.
    #[must_use]
    pub fn candidates(&self, from: &str, to: &str) -> Vec<Candidate> {
        relationship::candidates(self.catalog, &self.index, from, to)
    }

    /// Returns the cardinality `candidate` would give an embedding.
    #[must_use]
    pub fn cardinality(&self, candidate: Candidate) -> Cardinality {
        relationship::cardinality(self.catalog, candidate)
    }

    /// Picks the relationship used to embed `to` inside `from`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownRelationship` when no foreign key connects the
    /// tables, `InvalidHint` when the hint matches none of them and
    /// `AmbiguousRelationship` when more than one remains.
    pub fn relationship(
        &self,
        from: &str,
        to: &str,
        hint: Option<&str>,
    ) -> Result<ResolvedRelationship, EmbedError> {
        relationship::find(self.catalog, &self.index, from, to, hint)
    }

    /// Resolves a parsed query rooted at `root_table`.
    ///
    /// Failures below the root are attached to the tree in place of the
    /// item that caused them.
    ///
    /// # Errors
    ///
    /// Returns `UnknownTable` if `root_table` is not in the catalog.
    pub fn resolve(
        &self,
        root_table: &str,
        query: &QueryTree,
    ) -> Result<EmbeddingTree, EmbedError> {
        let table = self
            .catalog
            .table(root_table)
            .ok_or_else(|| EmbedError::UnknownTable(root_table.to_owned()))?;

        let mut composer = Composer {
            resolver: self,
            query,
            nodes: Vec::new(),
        };
        // An empty query selects everything, like `*`.
        let items = Some(query.items()).filter(|items| !items.is_empty());
        let (fields, children) = composer.select(table, items);

        debug!(
            table = root_table,
            fields = fields.len(),
            nodes = composer.nodes.len(),
            "query resolved"
        );
        Ok(EmbeddingTree {
            root: Embedding {
                key: root_table.to_owned(),
                table: root_table.to_owned(),
                alias: None,
                cardinality: Cardinality::ToMany,
                nullable: false,
                join: JoinModifier::Default,
                relationship: None,
                fields,
                children,
            },
            nodes: composer.nodes,
        })
    }

    /// Parses and resolves `query` rooted at `root_table`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownTable` if `root_table` is not in the catalog.
    pub fn resolve_str(&self, root_table: &str, query: &str) -> Result<EmbeddingTree, EmbedError> {
        let tree = Parser::new(query).parse();
        self.resolve(root_table, &tree)
    }
}

/// State of one resolution.
struct Composer<'r, 'a> {
    resolver: &'r Resolver<'a>,
    query: &'r QueryTree,
    nodes: Vec<EmbeddingNode>,
}

/// What a select item turned into.
enum Composed {
    Fields(Vec<SelectedField>),
    Node(EmbeddingNode),
}

impl Composer<'_, '_> {
    /// Builds the fields and children of a resource on `table`. `None`
    /// selects every column.
    fn select(
        &mut self,
        table: &Table,
        items: Option<&[SelectItem]>,
    ) -> (Vec<SelectedField>, Vec<EmbedId>) {
        let Some(items) = items else {
            return (all_columns(table), Vec::new());
        };

        let mut fields = Vec::new();
        let mut children = Vec::new();
        for item in items {
            match self.item(table, item) {
                Composed::Fields(mut selected) => fields.append(&mut selected),
                Composed::Node(node) => {
                    children.push(EmbedId(self.nodes.len()));
                    self.nodes.push(node);
                }
            }
        }
        (fields, children)
    }

    fn item(&mut self, table: &Table, item: &SelectItem) -> Composed {
        match item {
            SelectItem::Wildcard { .. } => Composed::Fields(all_columns(table)),
            SelectItem::Count { alias, cast, .. } => Composed::Fields(vec![SelectedField {
                key: alias.clone().unwrap_or_else(|| Aggregate::Count.as_str().to_owned()),
                column: None,
                cast: cast.clone(),
                aggregate: Some(Aggregate::Count),
                nullable: false,
            }]),
            SelectItem::Column(column) => self.column(table, column),
            SelectItem::Embed(id) => {
                let node = self.query.node(*id);
                Composed::Node(self.embed(
                    table,
                    &node.name,
                    node.alias.as_deref(),
                    node.hint.as_deref(),
                    node.join,
                    node.select.as_deref(),
                ))
            }
            SelectItem::Invalid(err) => Composed::Node(EmbeddingNode::Failed {
                key: None,
                error: EmbedError::Parse(err.clone()),
            }),
        }
    }

    /// A plain name is embedded when it names a related table, and is a
    /// column otherwise.
    fn column(&mut self, table: &Table, column: &ColumnRef) -> Composed {
        let plain = column.cast.is_none() && column.aggregate.is_none();
        if plain && self.is_related(&table.name, &column.name) {
            return Composed::Node(self.embed(
                table,
                &column.name,
                column.alias.as_deref(),
                None,
                JoinModifier::Default,
                None,
            ));
        }

        let Some(source) = table.get_column(&column.name) else {
            return Composed::Node(EmbeddingNode::Failed {
                key: Some(column.key().to_owned()),
                error: EmbedError::ColumnNotFound {
                    table: table.name.clone(),
                    column: column.name.clone(),
                },
            });
        };
        let nullable = match column.aggregate {
            Some(Aggregate::Count) => false,
            // Aggregates over no rows are null.
            Some(_) => true,
            None => source.nullable,
        };
        Composed::Fields(vec![SelectedField {
            key: column.key().to_owned(),
            column: Some(column.name.clone()),
            cast: column.cast.clone(),
            aggregate: column.aggregate,
            nullable,
        }])
    }

    fn is_related(&self, from: &str, to: &str) -> bool {
        self.resolver.catalog.table(to).is_some() && !self.resolver.candidates(from, to).is_empty()
    }

    fn embed(
        &mut self,
        parent: &Table,
        name: &str,
        alias: Option<&str>,
        hint: Option<&str>,
        join: JoinModifier,
        items: Option<&[SelectItem]>,
    ) -> EmbeddingNode {
        let key = alias.unwrap_or(name).to_owned();
        let relationship = match self.resolver.relationship(&parent.name, name, hint) {
            Ok(relationship) => relationship,
            Err(error) => {
                debug!(from = %parent.name, to = name, %error, "embedding failed");
                return EmbeddingNode::Failed {
                    key: Some(key),
                    error,
                };
            }
        };
        let Some(table) = self.resolver.catalog.table(name) else {
            return EmbeddingNode::Failed {
                key: Some(key),
                error: EmbedError::UnknownTable(name.to_owned()),
            };
        };

        let nullable = self.nullable(&relationship, join);
        debug!(
            from = %parent.name,
            to = name,
            constraint = %relationship.constraint,
            cardinality = ?relationship.cardinality,
            nullable,
            "embedding resolved"
        );

        let (fields, children) = self.select(table, items);
        EmbeddingNode::Resolved(Embedding {
            key,
            table: table.name.clone(),
            alias: alias.map(str::to_owned),
            cardinality: relationship.cardinality,
            nullable,
            join,
            relationship: Some(relationship),
            fields,
            children,
        })
    }

    /// Nullability of a to-one embedding. To-many embeddings are arrays
    /// and never null.
    fn nullable(&self, relationship: &ResolvedRelationship, join: JoinModifier) -> bool {
        match (relationship.cardinality, join) {
            (_, JoinModifier::Inner) | (Cardinality::ToMany, _) => false,
            (Cardinality::ToOne, JoinModifier::Left) => true,
            (Cardinality::ToOne, JoinModifier::Default) => match relationship.direction {
                // A pair joined by several keys reports every to-one side as
                // nullable, hinted or not.
                Direction::Forward => {
                    relationship.was_ambiguous() || self.has_nullable_source(relationship)
                }
                // The child row may not exist.
                Direction::Reverse => true,
            },
        }
    }

    fn has_nullable_source(&self, relationship: &ResolvedRelationship) -> bool {
        let catalog = self.resolver.catalog;
        let fk = catalog.foreign_key(relationship.foreign_key);
        catalog.table(&fk.table).is_some_and(|table| {
            fk.columns
                .iter()
                .any(|name| table.get_column(name).is_some_and(|c| c.nullable))
        })
    }
}

fn all_columns(table: &Table) -> Vec<SelectedField> {
    table
        .columns
        .iter()
        .map(|column| SelectedField {
            key: column.name.clone(),
            column: Some(column.name.clone()),
            cast: None,
            aggregate: None,
            nullable: column.nullable,
        })
        .collect()
}

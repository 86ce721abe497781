//! Relationship lookup between an enclosing table and an embedded resource.

use std::collections::HashMap;

use serde::Serialize;
use tracing::trace;

use super::EmbedError;
use crate::schema::{ForeignKey, ForeignKeyId, SchemaCatalog};

/// How many related rows an embedding yields per parent row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    /// At most one related row.
    ToOne,
    /// Zero or more related rows.
    ToMany,
}

/// Which side of the embedding holds the foreign key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// The enclosing table references the embedded one (many-to-one).
    Forward,
    /// The embedded table references the enclosing one (one-to-many, or
    /// one-to-one when its key columns are unique).
    Reverse,
}

/// A foreign key connecting two tables, seen from the enclosing table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    /// The foreign key.
    pub foreign_key: ForeignKeyId,
    /// Which side holds it.
    pub direction: Direction,
}

/// The relationship an embedding was resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedRelationship {
    /// The chosen foreign key.
    pub foreign_key: ForeignKeyId,
    /// Its constraint name.
    pub constraint: String,
    /// Which side holds it.
    pub direction: Direction,
    /// Derived cardinality.
    pub cardinality: Cardinality,
    /// Number of candidates between the two tables before hint filtering.
    pub candidates: usize,
}

impl ResolvedRelationship {
    /// Returns true if a hint was needed to pick this relationship.
    #[must_use]
    pub const fn was_ambiguous(&self) -> bool {
        self.candidates > 1
    }
}

/// Foreign keys grouped by the pair of tables they connect.
///
/// Built once per catalog and shared by every resolution against it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationshipIndex {
    pairs: HashMap<String, HashMap<String, Vec<ForeignKeyId>>>,
}

impl RelationshipIndex {
    /// Indexes every foreign key of `catalog` under both orientations of
    /// its table pair.
    #[must_use]
    pub fn new(catalog: &SchemaCatalog) -> Self {
        let mut pairs: HashMap<String, HashMap<String, Vec<ForeignKeyId>>> = HashMap::new();
        for (id, fk) in catalog.foreign_keys() {
            pairs
                .entry(fk.table.clone())
                .or_default()
                .entry(fk.references_table.clone())
                .or_default()
                .push(id);
            if !fk.is_self_referencing() {
                pairs
                    .entry(fk.references_table.clone())
                    .or_default()
                    .entry(fk.table.clone())
                    .or_default()
                    .push(id);
            }
        }
        Self { pairs }
    }

    /// Returns the foreign keys connecting `a` and `b` in either direction,
    /// in declaration order.
    #[must_use]
    pub fn between(&self, a: &str, b: &str) -> &[ForeignKeyId] {
        self.pairs
            .get(a)
            .and_then(|targets| targets.get(b))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Collects the candidates between `from` and `to`: keys held by `from`
/// first, then keys held by `to`, each in declaration order.
pub(crate) fn candidates(
    catalog: &SchemaCatalog,
    index: &RelationshipIndex,
    from: &str,
    to: &str,
) -> Vec<Candidate> {
    let ids = index.between(from, to);
    held_by(catalog, ids, from, to, Direction::Forward)
        .chain(held_by(catalog, ids, to, from, Direction::Reverse))
        .collect()
}

fn held_by<'c>(
    catalog: &'c SchemaCatalog,
    ids: &'c [ForeignKeyId],
    holder: &'c str,
    other: &'c str,
    direction: Direction,
) -> impl Iterator<Item = Candidate> + 'c {
    ids.iter()
        .filter(move |&&id| {
            let fk = catalog.foreign_key(id);
            fk.table == holder && fk.references_table == other
        })
        .map(move |&foreign_key| Candidate {
            foreign_key,
            direction,
        })
}

/// Picks the single relationship between `from` and `to`, optionally
/// narrowed by `hint`.
pub(crate) fn find(
    catalog: &SchemaCatalog,
    index: &RelationshipIndex,
    from: &str,
    to: &str,
    hint: Option<&str>,
) -> Result<ResolvedRelationship, EmbedError> {
    let all = candidates(catalog, index, from, to);
    trace!(
        from,
        to,
        candidates = ?all
            .iter()
            .map(|c| catalog.foreign_key(c.foreign_key).name.as_str())
            .collect::<Vec<_>>(),
        "collected relationship candidates"
    );

    let remaining: Vec<Candidate> = match hint {
        Some(hint) => all
            .iter()
            .copied()
            .filter(|c| hint_matches(catalog.foreign_key(c.foreign_key), c.direction, hint))
            .collect(),
        None => all.clone(),
    };

    match remaining.as_slice() {
        [chosen] => Ok(resolved(catalog, *chosen, all.len())),
        [] => Err(match hint {
            Some(hint) => EmbedError::InvalidHint {
                from: from.to_owned(),
                to: to.to_owned(),
                hint: hint.to_owned(),
            },
            None => EmbedError::UnknownRelationship {
                from: from.to_owned(),
                to: to.to_owned(),
            },
        }),
        several => Err(EmbedError::AmbiguousRelationship {
            from: from.to_owned(),
            to: to.to_owned(),
            candidates: several
                .iter()
                .map(|c| catalog.foreign_key(c.foreign_key).name.clone())
                .collect(),
        }),
    }
}

/// A hint names the constraint or one of its columns. Both candidates of a
/// self-reference share the constraint and its columns, so there a source
/// column picks `Forward` and a target column picks `Reverse`.
fn hint_matches(fk: &ForeignKey, direction: Direction, hint: &str) -> bool {
    if fk.name == hint {
        return true;
    }
    if !fk.is_self_referencing() {
        return fk.mentions_column(hint);
    }
    let columns = match direction {
        Direction::Forward => &fk.columns,
        Direction::Reverse => &fk.references_columns,
    };
    columns.iter().any(|c| c == hint)
}

/// Derives how many rows of the embedded table match one enclosing row.
pub(crate) fn cardinality(catalog: &SchemaCatalog, candidate: Candidate) -> Cardinality {
    match candidate.direction {
        Direction::Forward => Cardinality::ToOne,
        Direction::Reverse => {
            let fk = catalog.foreign_key(candidate.foreign_key);
            let one_to_one = catalog
                .table(&fk.table)
                .is_some_and(|child| child.is_unique_key(&fk.columns));
            if one_to_one {
                Cardinality::ToOne
            } else {
                Cardinality::ToMany
            }
        }
    }
}

fn resolved(catalog: &SchemaCatalog, chosen: Candidate, candidates: usize) -> ResolvedRelationship {
    ResolvedRelationship {
        foreign_key: chosen.foreign_key,
        constraint: catalog.foreign_key(chosen.foreign_key).name.clone(),
        direction: chosen.direction,
        cardinality: cardinality(catalog, chosen),
        candidates,
    }
}

//! Query tree types produced by the parser.
//!
//! Nodes live in an arena owned by [`QueryTree`] and refer to each other
//! by [`NodeId`]. The tree is built once by the parser and never mutated
//! afterwards.

use core::fmt;

use crate::lexer::Span;
use crate::parser::ParseError;

/// Index of a [`QueryNode`] inside its [`QueryTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Returns the arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Join modifier written on an embedded resource (`!inner`, `!left`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinModifier {
    /// No modifier.
    #[default]
    Default,
    /// `!inner`: rows without a match are excluded.
    Inner,
    /// `!left`: rows without a match are kept.
    Left,
}

impl JoinModifier {
    /// Parses a modifier token. Returns `None` for anything that is not a
    /// join modifier (i.e. a hint).
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "inner" => Some(Self::Inner),
            "left" => Some(Self::Left),
            _ => None,
        }
    }

    /// Returns the modifier as written, without the leading `!`.
    #[must_use]
    pub const fn as_str(&self) -> Option<&'static str> {
        match self {
            Self::Default => None,
            Self::Inner => Some("inner"),
            Self::Left => Some("left"),
        }
    }
}

/// Aggregate functions applicable to a column (`amount.sum()`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregate {
    /// `avg()`
    Avg,
    /// `count()`
    Count,
    /// `max()`
    Max,
    /// `min()`
    Min,
    /// `sum()`
    Sum,
}

impl Aggregate {
    /// Looks up an aggregate by function name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "avg" => Some(Self::Avg),
            "count" => Some(Self::Count),
            "max" => Some(Self::Max),
            "min" => Some(Self::Min),
            "sum" => Some(Self::Sum),
            _ => None,
        }
    }

    /// Returns the function name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Avg => "avg",
            Self::Count => "count",
            Self::Max => "max",
            Self::Min => "min",
            Self::Sum => "sum",
        }
    }
}

/// A column reference in a select list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    /// Column name as written.
    pub name: String,
    /// Output alias (`alias:name`).
    pub alias: Option<String>,
    /// Cast target (`name::text`).
    pub cast: Option<String>,
    /// Aggregate wrapper (`name.sum()`).
    pub aggregate: Option<Aggregate>,
    /// Location in the query string.
    pub span: Span,
}

impl ColumnRef {
    /// Returns the key under which the column appears in the result.
    ///
    /// An aggregated column without alias is keyed by the function name.
    #[must_use]
    pub fn key(&self) -> &str {
        match (&self.alias, self.aggregate) {
            (Some(alias), _) => alias,
            (None, Some(aggregate)) => aggregate.as_str(),
            (None, None) => &self.name,
        }
    }
}

/// An item of a select list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectItem {
    /// `*`
    Wildcard {
        /// Location in the query string.
        span: Span,
    },
    /// A column, possibly aliased, cast or aggregated.
    Column(ColumnRef),
    /// A bare `count()` over the rows of the enclosing resource.
    Count {
        /// Output alias.
        alias: Option<String>,
        /// Cast target.
        cast: Option<String>,
        /// Location in the query string.
        span: Span,
    },
    /// An embedded resource.
    Embed(NodeId),
    /// An item that failed to parse.
    Invalid(ParseError),
}

/// An embedded resource: `[alias:]name[!modifier]...[(select-list)]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryNode {
    /// Resource name as written.
    pub name: String,
    /// Output alias.
    pub alias: Option<String>,
    /// Relationship hint: a constraint name or a column name.
    pub hint: Option<String>,
    /// Join modifier.
    pub join: JoinModifier,
    /// Parenthesized select list. `None` when the resource was written
    /// without parentheses, which selects every column.
    pub select: Option<Vec<SelectItem>>,
    /// Location in the query string.
    pub span: Span,
}

impl QueryNode {
    /// Returns the key under which the embedding appears in the result.
    #[must_use]
    pub fn key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    /// Returns the select list, empty when none was written.
    #[must_use]
    pub fn items(&self) -> &[SelectItem] {
        self.select.as_deref().unwrap_or_default()
    }
}

/// A parsed embedding query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryTree {
    pub(crate) nodes: Vec<QueryNode>,
    pub(crate) items: Vec<SelectItem>,
}

impl QueryTree {
    /// Returns the top-level select list.
    #[must_use]
    pub fn items(&self) -> &[SelectItem] {
        &self.items
    }

    /// Returns the node with the given id.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced by this tree.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &QueryNode {
        &self.nodes[id.0]
    }

    /// Returns the number of embedded resources in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the tree contains no embedded resources.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns all parse errors in depth-first order.
    #[must_use]
    pub fn errors(&self) -> Vec<&ParseError> {
        let mut errors = Vec::new();
        self.collect_errors(&self.items, &mut errors);
        errors
    }

    fn collect_errors<'a>(&'a self, items: &'a [SelectItem], out: &mut Vec<&'a ParseError>) {
        for item in items {
            match item {
                SelectItem::Invalid(err) => out.push(err),
                SelectItem::Embed(id) => self.collect_errors(self.node(*id).items(), out),
                _ => {}
            }
        }
    }

    fn fmt_items(&self, f: &mut fmt::Formatter<'_>, items: &[SelectItem]) -> fmt::Result {
        let mut first = true;
        for item in items {
            if matches!(item, SelectItem::Invalid(_)) {
                continue;
            }
            if !first {
                f.write_str(",")?;
            }
            first = false;
            match item {
                SelectItem::Wildcard { .. } => f.write_str("*")?,
                SelectItem::Column(column) => {
                    write_alias(f, column.alias.as_deref())?;
                    write_ident(f, &column.name)?;
                    if let Some(aggregate) = column.aggregate {
                        write!(f, ".{}()", aggregate.as_str())?;
                    }
                    write_cast(f, column.cast.as_deref())?;
                }
                SelectItem::Count { alias, cast, .. } => {
                    write_alias(f, alias.as_deref())?;
                    f.write_str("count()")?;
                    write_cast(f, cast.as_deref())?;
                }
                SelectItem::Embed(id) => {
                    let node = self.node(*id);
                    write_alias(f, node.alias.as_deref())?;
                    write_ident(f, &node.name)?;
                    if let Some(hint) = &node.hint {
                        f.write_str("!")?;
                        write_ident(f, hint)?;
                    }
                    if let Some(join) = node.join.as_str() {
                        write!(f, "!{join}")?;
                    }
                    if let Some(select) = &node.select {
                        f.write_str("(")?;
                        self.fmt_items(f, select)?;
                        f.write_str(")")?;
                    }
                }
                SelectItem::Invalid(_) => {}
            }
        }
        Ok(())
    }
}

/// Renders the canonical query string. Items that failed to parse are
/// omitted.
impl fmt::Display for QueryTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_items(f, &self.items)
    }
}

fn write_alias(f: &mut fmt::Formatter<'_>, alias: Option<&str>) -> fmt::Result {
    match alias {
        Some(alias) => {
            write_ident(f, alias)?;
            f.write_str(":")
        }
        None => Ok(()),
    }
}

fn write_cast(f: &mut fmt::Formatter<'_>, cast: Option<&str>) -> fmt::Result {
    match cast {
        Some(cast) => {
            f.write_str("::")?;
            write_ident(f, cast)
        }
        None => Ok(()),
    }
}

fn write_ident(f: &mut fmt::Formatter<'_>, ident: &str) -> fmt::Result {
    let bare = !ident.is_empty()
        && ident
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '$');
    if bare {
        f.write_str(ident)
    } else {
        write!(f, "\"{}\"", ident.replace('"', "\"\""))
    }
}

//! Embedding query parser implementation.

use super::error::ParseError;
use crate::ast::{Aggregate, ColumnRef, JoinModifier, NodeId, QueryNode, QueryTree, SelectItem};
use crate::lexer::{Lexer, Span, Token, TokenKind};

/// Maximum number of nested `(...)` blocks below the root.
pub const MAX_NESTING_DEPTH: usize = 128;

/// Embedding query parser.
///
/// Errors that leave the token stream intact (an empty alias, conflicting
/// modifiers) are attached to the offending item and parsing continues.
/// Any other error is attached where it occurred and stops the parse, so
/// later siblings are not produced.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    previous: Token,
    nodes: Vec<QueryNode>,
    /// Number of enclosing `(...)` blocks.
    depth: usize,
    /// Set once an unrecoverable error has been recorded.
    halted: bool,
}

/// Modifiers collected after a resource name.
#[derive(Default)]
struct Modifiers {
    join: JoinModifier,
    hint: Option<String>,
    present: bool,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for the given input.
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token();
        Self {
            lexer,
            current,
            previous: Token::new(TokenKind::Eof, Span::point(0)),
            nodes: Vec::new(),
            depth: 0,
            halted: false,
        }
    }

    /// Parses the whole query. Errors are embedded in the tree as
    /// [`SelectItem::Invalid`] items.
    pub fn parse(&mut self) -> QueryTree {
        let mut items = self.parse_select_list(&TokenKind::Eof);
        if !self.halted && !self.check(&TokenKind::Eof) {
            items.push(SelectItem::Invalid(self.unexpected("',' or end of input")));
            self.halted = true;
        }
        QueryTree {
            nodes: core::mem::take(&mut self.nodes),
            items,
        }
    }

    /// Parses the whole query, failing on the first error.
    ///
    /// # Errors
    ///
    /// Returns the first `ParseError` found in depth-first order.
    pub fn parse_strict(&mut self) -> Result<QueryTree, ParseError> {
        let tree = self.parse();
        match tree.errors().first() {
            Some(err) => Err((*err).clone()),
            None => Ok(tree),
        }
    }

    /// Parses a comma-separated list of items up to (not including)
    /// `terminator`.
    fn parse_select_list(&mut self, terminator: &TokenKind) -> Vec<SelectItem> {
        let mut items = vec![];
        if self.check(terminator) {
            return items;
        }

        loop {
            match self.parse_item() {
                Ok(item) => items.push(item),
                Err(err) => {
                    items.push(SelectItem::Invalid(err));
                    self.halted = true;
                }
            }
            if self.halted || !self.check(&TokenKind::Comma) {
                break;
            }
            self.advance();
        }
        items
    }

    /// Parses a single select item.
    fn parse_item(&mut self) -> Result<SelectItem, ParseError> {
        let start = self.current.span;
        let mut local_error = None;

        if self.check(&TokenKind::Star) {
            self.advance();
            return Ok(SelectItem::Wildcard { span: start });
        }

        if self.check(&TokenKind::Colon) {
            local_error = Some(ParseError::new("Empty alias before ':'", start));
            self.advance();
        }

        let first = self.expect_identifier("column or embedded resource")?;
        let (alias, name) = if self.check(&TokenKind::Colon) {
            self.advance();
            let name = self.expect_identifier("column or embedded resource after alias")?;
            (Some(first), name)
        } else {
            (None, first)
        };

        let modifiers = self.parse_modifiers(&mut local_error)?;

        if self.check(&TokenKind::LeftParen) {
            self.advance();
            if name == "count" && !modifiers.present && self.check(&TokenKind::RightParen) {
                self.advance();
                let cast = self.parse_cast()?;
                let item = SelectItem::Count {
                    alias,
                    cast,
                    span: start.to(self.previous.span),
                };
                return Ok(local_error.map_or(item, SelectItem::Invalid));
            }

            if self.depth >= MAX_NESTING_DEPTH {
                return Err(ParseError::new(
                    format!("Nesting too deep (more than {MAX_NESTING_DEPTH} levels)"),
                    self.previous.span,
                ));
            }
            self.depth += 1;
            let select = self.parse_select_list(&TokenKind::RightParen);
            self.depth -= 1;
            if !self.halted {
                self.expect(&TokenKind::RightParen, "',' or ')'")?;
            }
            let id = self.push_node(QueryNode {
                name,
                alias,
                hint: modifiers.hint,
                join: modifiers.join,
                select: Some(select),
                span: start.to(self.previous.span),
            });
            return Ok(local_error.map_or(SelectItem::Embed(id), SelectItem::Invalid));
        }

        let aggregate = self.parse_aggregate(&mut local_error)?;
        let cast = self.parse_cast()?;

        if modifiers.present {
            if aggregate.is_some() || cast.is_some() {
                local_error.get_or_insert_with(|| {
                    ParseError::new(
                        "Join modifiers and hints are only allowed on embedded resources",
                        start.to(self.previous.span),
                    )
                });
            }
            let id = self.push_node(QueryNode {
                name,
                alias,
                hint: modifiers.hint,
                join: modifiers.join,
                select: None,
                span: start.to(self.previous.span),
            });
            return Ok(local_error.map_or(SelectItem::Embed(id), SelectItem::Invalid));
        }

        let item = SelectItem::Column(ColumnRef {
            name,
            alias,
            cast,
            aggregate,
            span: start.to(self.previous.span),
        });
        Ok(local_error.map_or(item, SelectItem::Invalid))
    }

    /// Parses `!modifier` tokens. They can appear in any order.
    fn parse_modifiers(
        &mut self,
        local_error: &mut Option<ParseError>,
    ) -> Result<Modifiers, ParseError> {
        let mut modifiers = Modifiers::default();

        while self.check(&TokenKind::Bang) {
            self.advance();
            let span = self.current.span;
            let token = self.expect_identifier("join modifier or hint")?;
            modifiers.present = true;

            if let Some(join) = JoinModifier::from_token(&token) {
                if modifiers.join != JoinModifier::Default && modifiers.join != join {
                    local_error.get_or_insert_with(|| {
                        ParseError::new("Conflicting join modifiers '!inner' and '!left'", span)
                    });
                }
                modifiers.join = join;
                continue;
            }

            match modifiers.hint.take() {
                Some(hint) if hint != token => {
                    let message = format!("Conflicting hints '!{hint}' and '!{token}'");
                    local_error.get_or_insert_with(|| ParseError::new(message, span));
                    modifiers.hint = Some(hint);
                }
                _ => modifiers.hint = Some(token),
            }
        }
        Ok(modifiers)
    }

    /// Parses an optional `.aggregate()` suffix.
    fn parse_aggregate(
        &mut self,
        local_error: &mut Option<ParseError>,
    ) -> Result<Option<Aggregate>, ParseError> {
        if !self.check(&TokenKind::Dot) {
            return Ok(None);
        }
        self.advance();
        let span = self.current.span;
        let function = self.expect_identifier("aggregate function")?;
        self.expect(&TokenKind::LeftParen, "'('")?;
        self.expect(&TokenKind::RightParen, "')'")?;

        let aggregate = Aggregate::from_name(&function);
        if aggregate.is_none() {
            local_error.get_or_insert_with(|| {
                ParseError::new(format!("Unknown aggregate function '{function}'"), span)
            });
        }
        Ok(aggregate)
    }

    /// Parses an optional `::type` suffix.
    fn parse_cast(&mut self) -> Result<Option<String>, ParseError> {
        if !self.check(&TokenKind::DoubleColon) {
            return Ok(None);
        }
        self.advance();
        self.expect_identifier("type name").map(Some)
    }

    fn push_node(&mut self, node: QueryNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    // --- Helper methods ---

    /// Advances to the next token.
    fn advance(&mut self) {
        self.previous = core::mem::replace(&mut self.current, self.lexer.next_token());
    }

    /// Checks if the current token matches the given kind.
    fn check(&self, kind: &TokenKind) -> bool {
        core::mem::discriminant(&self.current.kind) == core::mem::discriminant(kind)
    }

    /// Builds an "unexpected token" error for the current token.
    fn unexpected(&self, expected: &str) -> ParseError {
        ParseError::unexpected(expected, self.current.kind.clone(), self.current.span)
    }

    /// Expects the current token to be the given kind.
    fn expect(&mut self, kind: &TokenKind, expected: &str) -> Result<(), ParseError> {
        if self.check(kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    /// Expects and returns an identifier.
    fn expect_identifier(&mut self, expected: &str) -> Result<String, ParseError> {
        let Some(name) = self.current.as_identifier().map(str::to_owned) else {
            return Err(self.unexpected(expected));
        };
        self.advance();
        Ok(name)
    }
}

//! Token types for the embedding query lexer.

use core::fmt;

use super::Span;

/// Token types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier, bare or double-quoted.
    Identifier(String),

    // Delimiters
    /// *
    Star,
    /// ,
    Comma,
    /// (
    LeftParen,
    /// )
    RightParen,
    /// :
    Colon,
    /// ::
    DoubleColon,
    /// !
    Bang,
    /// .
    Dot,

    // Special
    /// End of input
    Eof,
    /// Invalid/unknown token
    Error(String),
}

impl TokenKind {
    /// Returns a short human-readable description, used in error messages.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Identifier(name) => format!("identifier '{name}'"),
            Self::Star => String::from("'*'"),
            Self::Comma => String::from("','"),
            Self::LeftParen => String::from("'('"),
            Self::RightParen => String::from("')'"),
            Self::Colon => String::from("':'"),
            Self::DoubleColon => String::from("'::'"),
            Self::Bang => String::from("'!'"),
            Self::Dot => String::from("'.'"),
            Self::Eof => String::from("end of input"),
            Self::Error(message) => message.clone(),
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// A token with its span in the query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The kind of token.
    pub kind: TokenKind,
    /// The location in the query string.
    pub span: Span,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Returns true if this is an EOF token.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }

    /// Returns the identifier text if this is an identifier token.
    #[must_use]
    pub fn as_identifier(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Identifier(name) => Some(name),
            _ => None,
        }
    }
}

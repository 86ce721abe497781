//! Embedding query lexer.
//!
//! A hand-written lexer producing a stream of spanned tokens.

mod span;
mod token;
mod tokenizer;

pub use span::Span;
pub use token::{Token, TokenKind};
pub use tokenizer::Lexer;

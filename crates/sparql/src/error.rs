//! Error taxonomy for the parser.
//!
//! The executor never surfaces errors of its own (see `crate::eval` and
//! `crate::executor` module docs) — only the parser fails fast.

use thiserror::Error;

/// A parse-time failure, always anchored to a byte offset in the source.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("unexpected character at offset {at}")]
    UnexpectedChar { at: u32 },

    #[error("expected keyword {kw:?} at offset {at}")]
    ExpectedKeyword { kw: &'static str, at: u32 },

    #[error("capacity exceeded: {what}")]
    CapacityExceeded { what: &'static str },

    #[error("invalid number at offset {at}")]
    InvalidNumber { at: u32 },

    #[error("unterminated literal starting at offset {at}")]
    UnterminatedLiteral { at: u32 },

    #[error("unterminated IRI starting at offset {at}")]
    UnterminatedIri { at: u32 },
}

pub type ParseResult<T> = Result<T, ParseError>;

//! Property-path AST.
//!
//! Operands are stored as spans back into the source rather than as a
//! recursive owned tree — the executor re-parses an operand span with
//! `crate::parser::path::parse_path` only when it actually walks that
//! path (transitive closure, alternation, …). This keeps `PropertyPath`
//! fixed-size and `Copy`, matching `TriplePattern`'s other fields.

use crate::span::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PathKind {
    /// No path: the predicate is a simple IRI/prefixed-name/`a`.
    #[default]
    None,
    Inverse(Span),
    ZeroOrMore(Span),
    OneOrMore(Span),
    ZeroOrOne(Span),
    Sequence(Span, Span),
    Alternative(Span, Span),
    NegatedSet(Span),
    GroupedZeroOrMore(Span),
    GroupedOneOrMore(Span),
    GroupedZeroOrOne(Span),
    GroupedInverse(Span),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PropertyPath {
    pub kind: PathKind,
}

impl PropertyPath {
    pub const NONE: PropertyPath = PropertyPath { kind: PathKind::None };

    pub fn new(kind: PathKind) -> Self {
        PropertyPath { kind }
    }

    /// `HasPropertyPath ⇔ Path.kind ≠ None`.
    pub fn is_present(&self) -> bool {
        self.kind != PathKind::None
    }
}

//! Term AST node: a tagged union over `{Variable, Iri,
//! Literal, BlankNode, QuotedTriple}`, each carrying nothing but a `Span`
//! into the source. No heap strings; `QuotedTriple`'s three nested terms
//! are re-parsed from its span on demand rather than stored.

use crate::span::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TermKind {
    #[default]
    Variable,
    Iri,
    Literal,
    BlankNode,
    QuotedTriple,
}

/// A parsed term: its kind plus the span covering its full lexical form.
///
/// - `Variable`: span covers the leading `?`/`$`.
/// - `Iri`: span includes the surrounding `<…>` when the source wrote one;
///   prefixed names (`prefix:local`) and the bare `a` keyword use a span
///   over exactly that text — `Cursor::resolve_iri` expands prefixes.
/// - `Literal`: span covers the full lexical form, including quotes,
///   language tag, and datatype suffix.
/// - `QuotedTriple`: span covers `<< s p o >>` in full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Term {
    pub kind: TermKind,
    pub span: Span,
}

impl Term {
    pub fn new(kind: TermKind, span: Span) -> Self {
        Term { kind, span }
    }

    pub fn variable(span: Span) -> Self {
        Term::new(TermKind::Variable, span)
    }

    pub fn iri(span: Span) -> Self {
        Term::new(TermKind::Iri, span)
    }

    pub fn literal(span: Span) -> Self {
        Term::new(TermKind::Literal, span)
    }

    pub fn blank_node(span: Span) -> Self {
        Term::new(TermKind::BlankNode, span)
    }

    pub fn quoted_triple(span: Span) -> Self {
        Term::new(TermKind::QuotedTriple, span)
    }

    pub fn is_variable(&self) -> bool {
        self.kind == TermKind::Variable
    }

    /// The variable's name text, without the leading sigil. Only
    /// meaningful when `kind == Variable`.
    pub fn variable_name<'a>(&self, source: &'a str) -> &'a str {
        debug_assert!(self.is_variable());
        &self.span.resolve(source)[1..]
    }

    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        self.span.resolve(source)
    }
}

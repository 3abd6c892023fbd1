//! Resolves AST `Term`s and path operand text to the SPARQL lexical
//! strings the store trades in. Shared by the pattern scanner
//! (`crate::executor`) and the property-path walker (`crate::pathexec`)
//! so prefix expansion happens exactly one way.

use crate::ast::Prologue;
use crate::bindings::{hash_variable_name, BindingTable};
use crate::term::{Term, TermKind};

pub const RDF_TYPE: &str = "<http://www.w3.org/1999/02/22-rdf-syntax-ns#type>";

/// Expands a predicate-position IRI token — `<...>`, a `prefix:local`
/// name, or the bare `a` keyword — to its full `<...>` lexical form. An
/// undeclared prefix is passed through bracketed as-is.
pub fn resolve_iri_text(text: &str, prologue: &Prologue, source: &str) -> String {
    let text = text.trim();
    if text.starts_with('<') {
        return text.to_string();
    }
    if text == "a" {
        return RDF_TYPE.to_string();
    }
    if let Some(idx) = text.find(':') {
        let (prefix, rest) = text.split_at(idx);
        let local = &rest[1..];
        if let Some(iri) = prologue.resolve_prefix(source, prefix) {
            return format!("<{iri}{local}>");
        }
    }
    format!("<{text}>")
}

/// Resolves one `Term` to the lexical filter the store should apply:
/// `None` is a wildcard (unbound variable), `Some(text)` is a concrete
/// byte string to match.
pub fn resolve_term_filter(term: &Term, source: &str, prologue: &Prologue, bindings: &BindingTable) -> Option<String> {
    match term.kind {
        TermKind::Variable => {
            let hash = hash_variable_name(term.variable_name(source));
            bindings.find_binding(hash).map(|idx| bindings.lexical_at(idx))
        }
        TermKind::Iri => Some(resolve_iri_text(term.text(source), prologue, source)),
        TermKind::Literal | TermKind::BlankNode | TermKind::QuotedTriple => Some(term.text(source).to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::PrefixDecl;
    use crate::span::Span;

    #[test]
    fn bare_iri_passes_through() {
        let prologue = Prologue::default();
        assert_eq!(resolve_iri_text("<http://x>", &prologue, ""), "<http://x>");
    }

    #[test]
    fn bare_a_is_rdf_type() {
        let prologue = Prologue::default();
        assert_eq!(resolve_iri_text("a", &prologue, ""), RDF_TYPE);
    }

    #[test]
    fn prefixed_name_expands_via_prologue() {
        let source = "PREFIX ex: <http://example.org/> x";
        let mut prefixes = crate::fixed::FixedVec::new();
        prefixes
            .try_push(PrefixDecl { prefix: Span::new(7, 2), iri: Span::new(11, 20) })
            .unwrap();
        let prologue = Prologue { base: None, prefixes };
        assert_eq!(resolve_iri_text("ex:p", &prologue, source), "<http://example.org/p>");
    }
}

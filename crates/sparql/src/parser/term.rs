//! Term parser: variables, IRIs, literals, numeric
//! literals, blank nodes, and quoted triples. Dispatches on the first
//! non-space character of a term position.

use crate::cursor::Cursor;
use crate::error::{ParseError, ParseResult};
use crate::span::Span;
use crate::term::{Term, TermKind};

/// Keywords that terminate term parsing when encountered where a term
/// was expected.
const SENTINEL_KEYWORDS: &[&str] = &[
    "FILTER", "OPTIONAL", "MINUS", "BIND", "VALUES", "GRAPH", "SERVICE",
    "UNION", "ORDER", "GROUP", "HAVING", "LIMIT", "OFFSET",
];

pub fn is_sentinel_keyword(cursor: &Cursor) -> bool {
    SENTINEL_KEYWORDS.iter().any(|kw| cursor.match_keyword(kw))
}

/// Parses one term at the cursor's current position, dispatching on the
/// lookahead byte. Does not parse property paths — see
/// `crate::parser::path::parse_predicate` for the predicate position.
pub fn parse_term(cursor: &mut Cursor) -> ParseResult<Term> {
    cursor.skip_whitespace();
    let start = cursor.pos();
    match cursor.peek() {
        b'?' | b'$' => parse_variable(cursor),
        b'<' => {
            if cursor.peek_at(1) == b'<' {
                parse_quoted_triple(cursor)
            } else {
                parse_iri(cursor)
            }
        }
        b'"' | b'\'' => parse_literal(cursor),
        b'0'..=b'9' => parse_numeric_literal(cursor),
        b'+' | b'-' => {
            if cursor.peek_at(1).is_ascii_digit() || cursor.peek_at(1) == b'.' {
                parse_numeric_literal(cursor)
            } else {
                Err(ParseError::UnexpectedChar { at: start })
            }
        }
        b'_' => parse_blank_node(cursor),
        c if c.is_ascii_alphabetic() => parse_prefixed_name_or_keyword(cursor),
        _ => Err(ParseError::UnexpectedChar { at: start }),
    }
}

fn parse_variable(cursor: &mut Cursor) -> ParseResult<Term> {
    let start = cursor.pos();
    cursor.advance(); // '?' or '$'
    let name_start = cursor.pos();
    while cursor.peek().is_ascii_alphanumeric() || cursor.peek() == b'_' {
        cursor.advance();
    }
    if cursor.pos() == name_start {
        return Err(ParseError::UnexpectedChar { at: start });
    }
    Ok(Term::variable(cursor.span_from(start)))
}

pub fn parse_iri(cursor: &mut Cursor) -> ParseResult<Term> {
    let start = cursor.pos();
    cursor.advance(); // '<'
    loop {
        if cursor.is_at_end() {
            return Err(ParseError::UnterminatedIri { at: start });
        }
        if cursor.peek() == b'>' {
            cursor.advance();
            break;
        }
        cursor.advance();
    }
    Ok(Term::iri(cursor.span_from(start)))
}

fn parse_quoted_triple(cursor: &mut Cursor) -> ParseResult<Term> {
    let start = cursor.pos();
    cursor.advance(); // first '<'
    cursor.advance(); // second '<'
    cursor.skip_whitespace();
    parse_term(cursor)?; // subject
    cursor.skip_whitespace();
    // predicate position: plain term, property paths are not valid inside
    // a quoted triple's predicate slot.
    parse_term(cursor)?;
    cursor.skip_whitespace();
    parse_term(cursor)?; // object
    cursor.skip_whitespace();
    if cursor.peek() == b'>' && cursor.peek_at(1) == b'>' {
        cursor.advance();
        cursor.advance();
    } else {
        return Err(ParseError::UnterminatedLiteral { at: start });
    }
    Ok(Term::quoted_triple(cursor.span_from(start)))
}

fn parse_literal(cursor: &mut Cursor) -> ParseResult<Term> {
    let start = cursor.pos();
    let quote = cursor.advance();
    let long_form = cursor.peek() == quote && cursor.peek_at(1) == quote;
    if long_form {
        cursor.advance();
        cursor.advance();
        loop {
            if cursor.is_at_end() {
                return Err(ParseError::UnterminatedLiteral { at: start });
            }
            if cursor.peek() == b'\\' {
                cursor.advance();
                cursor.advance();
                continue;
            }
            if cursor.peek() == quote && cursor.peek_at(1) == quote && cursor.peek_at(2) == quote {
                cursor.advance();
                cursor.advance();
                cursor.advance();
                break;
            }
            cursor.advance();
        }
    } else {
        loop {
            if cursor.is_at_end() || cursor.peek() == b'\n' {
                return Err(ParseError::UnterminatedLiteral { at: start });
            }
            if cursor.peek() == b'\\' {
                cursor.advance();
                cursor.advance();
                continue;
            }
            if cursor.peek() == quote {
                cursor.advance();
                break;
            }
            cursor.advance();
        }
    }
    // optional @lang or ^^datatype suffix
    if cursor.peek() == b'@' {
        cursor.advance();
        while cursor.peek().is_ascii_alphanumeric() || cursor.peek() == b'-' {
            cursor.advance();
        }
    } else if cursor.peek() == b'^' && cursor.peek_at(1) == b'^' {
        cursor.advance();
        cursor.advance();
        if cursor.peek() == b'<' {
            parse_iri(cursor)?;
        } else {
            parse_prefixed_name_text(cursor)?;
        }
    }
    Ok(Term::literal(cursor.span_from(start)))
}

fn parse_numeric_literal(cursor: &mut Cursor) -> ParseResult<Term> {
    let start = cursor.pos();
    if matches!(cursor.peek(), b'+' | b'-') {
        cursor.advance();
    }
    while cursor.peek().is_ascii_digit() {
        cursor.advance();
    }
    if cursor.peek() == b'.' && cursor.peek_at(1).is_ascii_digit() {
        cursor.advance();
        while cursor.peek().is_ascii_digit() {
            cursor.advance();
        }
    }
    if matches!(cursor.peek(), b'e' | b'E') {
        let save = cursor.pos();
        cursor.advance();
        if matches!(cursor.peek(), b'+' | b'-') {
            cursor.advance();
        }
        if cursor.peek().is_ascii_digit() {
            while cursor.peek().is_ascii_digit() {
                cursor.advance();
            }
        } else {
            cursor.set_pos(save);
        }
    }
    if cursor.pos() == start {
        return Err(ParseError::InvalidNumber { at: start });
    }
    Ok(Term::literal(cursor.span_from(start)))
}

fn parse_blank_node(cursor: &mut Cursor) -> ParseResult<Term> {
    let start = cursor.pos();
    cursor.advance(); // '_'
    if cursor.peek() != b':' {
        return Err(ParseError::UnexpectedChar { at: start });
    }
    cursor.advance();
    while cursor.peek().is_ascii_alphanumeric() || matches!(cursor.peek(), b'_' | b'-' | b'.') {
        cursor.advance();
    }
    Ok(Term::blank_node(cursor.span_from(start)))
}

fn parse_prefixed_name_text(cursor: &mut Cursor) -> ParseResult<Span> {
    let start = cursor.pos();
    while cursor.peek().is_ascii_alphanumeric() || matches!(cursor.peek(), b'_' | b'-') {
        cursor.advance();
    }
    if cursor.peek() == b':' {
        cursor.advance();
        while cursor.peek().is_ascii_alphanumeric() || matches!(cursor.peek(), b'_' | b'-' | b'.') {
            cursor.advance();
        }
    }
    if cursor.pos() == start {
        return Err(ParseError::UnexpectedChar { at: start });
    }
    Ok(cursor.span_from(start))
}

fn parse_prefixed_name_or_keyword(cursor: &mut Cursor) -> ParseResult<Term> {
    let start = cursor.pos();
    if is_sentinel_keyword(cursor) {
        return Err(ParseError::UnexpectedChar { at: start });
    }
    // bare `a` shorthand for rdf:type, but only when not the start of a
    // longer identifier (`abc:def` is a prefixed name, not `a` + `bc:def`).
    if cursor.peek() == b'a' && !(cursor.peek_at(1).is_ascii_alphanumeric() || cursor.peek_at(1) == b'_' || cursor.peek_at(1) == b':') {
        cursor.advance();
        return Ok(Term::new(TermKind::Iri, cursor.span_from(start)));
    }
    let span = parse_prefixed_name_text(cursor)?;
    Ok(Term::new(TermKind::Iri, span))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn term_text<'a>(source: &'a str, t: &Term) -> &'a str {
        t.text(source)
    }

    #[test]
    fn parses_variable() {
        let src = "?x rest";
        let mut c = Cursor::new(src);
        let t = parse_term(&mut c).unwrap();
        assert_eq!(t.kind, TermKind::Variable);
        assert_eq!(term_text(src, &t), "?x");
    }

    #[test]
    fn parses_iri() {
        let src = "<http://example.org/s> rest";
        let mut c = Cursor::new(src);
        let t = parse_term(&mut c).unwrap();
        assert_eq!(t.kind, TermKind::Iri);
        assert_eq!(term_text(src, &t), "<http://example.org/s>");
    }

    #[test]
    fn parses_short_literal_with_language() {
        let src = r#""hello"@en rest"#;
        let mut c = Cursor::new(src);
        let t = parse_term(&mut c).unwrap();
        assert_eq!(t.kind, TermKind::Literal);
        assert_eq!(term_text(src, &t), r#""hello"@en"#);
    }

    #[test]
    fn parses_typed_literal() {
        let src = r#""42"^^<http://www.w3.org/2001/XMLSchema#integer> rest"#;
        let mut c = Cursor::new(src);
        let t = parse_term(&mut c).unwrap();
        assert_eq!(t.kind, TermKind::Literal);
        assert!(term_text(src, &t).ends_with("#integer>"));
    }

    #[test]
    fn parses_numeric_literal() {
        let src = "3.14e-2 rest";
        let mut c = Cursor::new(src);
        let t = parse_term(&mut c).unwrap();
        assert_eq!(term_text(src, &t), "3.14e-2");
    }

    #[test]
    fn parses_blank_node() {
        let src = "_:b1 rest";
        let mut c = Cursor::new(src);
        let t = parse_term(&mut c).unwrap();
        assert_eq!(t.kind, TermKind::BlankNode);
        assert_eq!(term_text(src, &t), "_:b1");
    }

    #[test]
    fn parses_a_as_rdf_type() {
        let src = "a <http://x>";
        let mut c = Cursor::new(src);
        let t = parse_term(&mut c).unwrap();
        assert_eq!(term_text(src, &t), "a");
    }

    #[test]
    fn parses_quoted_triple() {
        let src = "<< <http://a> <http://b> <http://c> >> rest";
        let mut c = Cursor::new(src);
        let t = parse_term(&mut c).unwrap();
        assert_eq!(t.kind, TermKind::QuotedTriple);
    }
}

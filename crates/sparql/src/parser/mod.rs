//! Hand-written recursive-descent parser. Each sub-module covers one
//! layer of the grammar: terms, property paths, graph patterns, and the
//! top-level query forms.

pub mod term;
pub mod path;
pub mod pattern;
pub mod query;
pub mod update;

use crate::cursor::Cursor;
use crate::error::{ParseError, ParseResult};
use crate::span::Span;

/// Consumes a balanced `open`...`close` run starting at the cursor's
/// current position (which must be `open`), honouring nested brackets of
/// the same kind and skipping over quoted-literal contents so a `}`
/// inside a string doesn't terminate early. Returns the span of the
/// entire run, parens/braces included.
pub fn consume_balanced(cursor: &mut Cursor, open: u8, close: u8) -> ParseResult<Span> {
    let start = cursor.pos();
    if cursor.peek() != open {
        return Err(ParseError::UnexpectedChar { at: start });
    }
    let mut depth: i32 = 0;
    loop {
        if cursor.is_at_end() {
            return Err(ParseError::UnexpectedEof);
        }
        let c = cursor.peek();
        match c {
            b'"' | b'\'' => {
                let quote = c;
                cursor.advance();
                while !cursor.is_at_end() && cursor.peek() != quote {
                    if cursor.peek() == b'\\' {
                        cursor.advance();
                    }
                    cursor.advance();
                }
                cursor.advance();
            }
            c if c == open => {
                depth += 1;
                cursor.advance();
            }
            c if c == close => {
                cursor.advance();
                depth -= 1;
                if depth == 0 {
                    return Ok(cursor.span_from(start));
                }
            }
            _ => {
                cursor.advance();
            }
        }
    }
}

/// Scans forward from the cursor's current position up to (but not
/// consuming) the first unbracketed occurrence of keyword `kw`, honouring
/// paren nesting and quoted-literal contents. Used by `BIND (expr AS
/// ?var)` and projection `(expr AS ?alias)` to capture `expr`'s span.
pub fn scan_expr_until_keyword(cursor: &mut Cursor, kw: &'static str) -> ParseResult<Span> {
    cursor.skip_whitespace();
    let start = cursor.pos();
    let mut depth: i32 = 0;
    loop {
        if cursor.is_at_end() {
            return Err(ParseError::UnexpectedEof);
        }
        if depth == 0 && cursor.match_keyword(kw) {
            break;
        }
        match cursor.peek() {
            b'(' => {
                depth += 1;
                cursor.advance();
            }
            b')' => {
                depth -= 1;
                cursor.advance();
            }
            b'"' | b'\'' => {
                let quote = cursor.peek();
                cursor.advance();
                while !cursor.is_at_end() && cursor.peek() != quote {
                    if cursor.peek() == b'\\' {
                        cursor.advance();
                    }
                    cursor.advance();
                }
                cursor.advance();
            }
            _ => {
                cursor.advance();
            }
        }
    }
    let span = cursor.span_from(start);
    let text = span.resolve(cursor.source());
    Ok(Span::new(span.offset, text.trim_end().len() as u32))
}

/// Captures a single `FILTER`/`HAVING`-style constraint expression body:
/// a balanced `(...)`, an `[NOT] EXISTS { ... }` block, or a bare
/// primary (function call, variable, literal). Spans include any
/// surrounding parens so the evaluator can re-parse them uniformly.
pub fn capture_constraint_expr(cursor: &mut Cursor) -> ParseResult<Span> {
    cursor.skip_whitespace();
    let start = cursor.pos();
    if cursor.peek() == b'(' {
        consume_balanced(cursor, b'(', b')')?;
        return Ok(cursor.span_from(start));
    }
    if cursor.match_keyword("NOT") {
        cursor.consume_keyword("NOT")?;
        cursor.skip_whitespace();
        cursor.consume_keyword("EXISTS")?;
        cursor.skip_whitespace();
        consume_balanced(cursor, b'{', b'}')?;
        return Ok(cursor.span_from(start));
    }
    if cursor.match_keyword("EXISTS") {
        cursor.consume_keyword("EXISTS")?;
        cursor.skip_whitespace();
        consume_balanced(cursor, b'{', b'}')?;
        return Ok(cursor.span_from(start));
    }
    if matches!(cursor.peek(), b'?' | b'$') {
        cursor.advance();
        while cursor.peek().is_ascii_alphanumeric() || cursor.peek() == b'_' {
            cursor.advance();
        }
        return Ok(cursor.span_from(start));
    }
    if cursor.peek().is_ascii_alphabetic() {
        while cursor.peek().is_ascii_alphanumeric() || cursor.peek() == b'_' {
            cursor.advance();
        }
        cursor.skip_whitespace();
        if cursor.peek() == b'(' {
            consume_balanced(cursor, b'(', b')')?;
        }
        return Ok(cursor.span_from(start));
    }
    Err(ParseError::UnexpectedChar { at: start })
}

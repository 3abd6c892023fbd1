//! Graph-pattern parser: turns a `{ … }` block into a
//! `GraphPattern`.

use crate::ast::*;
use crate::cursor::Cursor;
use crate::error::{ParseError, ParseResult};
use crate::fixed::CapacityExceededError;
use crate::parser::path::parse_predicate;
use crate::parser::term::parse_term;
use crate::parser::{capture_constraint_expr, consume_balanced};

fn cap_err(what: &'static str) -> ParseError {
    ParseError::CapacityExceeded { what }
}

fn push_pattern(gp: &mut GraphPattern, tp: TriplePattern) -> ParseResult<()> {
    gp.patterns.try_push(tp).map_err(|CapacityExceededError| cap_err("triple patterns"))
}

/// Entry point: consumes `{`, repeatedly dispatches until the matching
/// `}`. `is_optional_context` records whether this group is itself the
/// body of an `OPTIONAL` or `GRAPH` the caller is already inside, used
/// only to stamp `ServiceClause::is_optional`.
pub fn parse_graph_pattern(
    cursor: &mut Cursor,
    scope_depth: u32,
    is_optional_context: bool,
) -> ParseResult<GraphPattern> {
    cursor.skip_whitespace();
    if cursor.peek() != b'{' {
        return Err(ParseError::UnexpectedChar { at: cursor.pos() });
    }
    cursor.advance();

    let mut gp = GraphPattern::default();
    let mut union_branch = false;

    loop {
        cursor.skip_whitespace();
        if cursor.is_at_end() {
            return Err(ParseError::UnexpectedEof);
        }
        if cursor.peek() == b'}' {
            cursor.advance();
            break;
        }

        if cursor.match_keyword("FILTER") {
            cursor.consume_keyword("FILTER")?;
            let expr = capture_constraint_expr(cursor)?;
            gp.filters
                .try_push(FilterExpr { expr, scope_depth })
                .map_err(|CapacityExceededError| cap_err("filter expressions"))?;
        } else if cursor.match_keyword("OPTIONAL") {
            cursor.consume_keyword("OPTIONAL")?;
            cursor.skip_whitespace();
            let child = parse_graph_pattern(cursor, scope_depth + 1, true)?;
            merge_child(&mut gp, child, true, &mut union_branch)?;
        } else if cursor.match_keyword("MINUS") {
            cursor.consume_keyword("MINUS")?;
            cursor.skip_whitespace();
            parse_minus_block(cursor, &mut gp, scope_depth)?;
        } else if cursor.match_keyword("BIND") {
            cursor.consume_keyword("BIND")?;
            cursor.skip_whitespace();
            parse_bind(cursor, &mut gp)?;
        } else if cursor.match_keyword("VALUES") {
            cursor.consume_keyword("VALUES")?;
            cursor.skip_whitespace();
            gp.values = Some(parse_values(cursor)?);
        } else if cursor.match_keyword("GRAPH") {
            cursor.consume_keyword("GRAPH")?;
            cursor.skip_whitespace();
            parse_graph_clause(cursor, &mut gp, scope_depth)?;
        } else if cursor.match_keyword("SERVICE") {
            cursor.consume_keyword("SERVICE")?;
            cursor.skip_whitespace();
            parse_service_clause(cursor, &mut gp, scope_depth, union_branch, is_optional_context)?;
        } else if cursor.match_keyword("SELECT") {
            let sub = crate::parser::query::parse_select_body(cursor)?;
            let slot = gp.sub_selects.iter_mut().find(|s| s.is_none());
            match slot {
                Some(slot) => *slot = Some(Box::new(sub)),
                None => return Err(cap_err("sub-selects")),
            }
        } else if cursor.peek() == b'{' {
            let child = parse_graph_pattern(cursor, scope_depth + 1, is_optional_context)?;
            merge_child(&mut gp, child, false, &mut union_branch)?;
            cursor.skip_whitespace();
            if cursor.match_keyword("UNION") {
                cursor.consume_keyword("UNION")?;
                cursor.skip_whitespace();
                if gp.union_start.is_none() {
                    gp.union_start = Some(gp.patterns.len() as u32);
                }
                union_branch = true;
                let right = parse_graph_pattern(cursor, scope_depth + 1, is_optional_context)?;
                merge_child(&mut gp, right, false, &mut union_branch)?;
            }
        } else {
            let tp = parse_triple_pattern(cursor)?;
            push_pattern(&mut gp, tp)?;
            cursor.skip_whitespace();
            if cursor.peek() == b'.' {
                cursor.advance();
            }
        }
    }

    Ok(gp)
}

fn parse_triple_pattern(cursor: &mut Cursor) -> ParseResult<TriplePattern> {
    cursor.skip_whitespace();
    let subject = parse_term(cursor)?;
    cursor.skip_whitespace();
    let (predicate, path) = parse_predicate(cursor)?;
    cursor.skip_whitespace();
    let object = parse_term(cursor)?;
    Ok(TriplePattern { subject, predicate, object, path })
}

/// Merges a nested group's patterns/clauses into `parent`, re-basing the
/// MINUS-block boundaries by the parent's pattern count at merge time.
/// When `mark_optional` is set, every merged pattern index is stamped in
/// the parent's optional bitmask.
fn merge_child(
    parent: &mut GraphPattern,
    child: GraphPattern,
    mark_optional: bool,
    union_branch: &mut bool,
) -> ParseResult<()> {
    let base = parent.patterns.len() as u32;
    let _ = union_branch;
    for tp in child.patterns.iter() {
        push_pattern(parent, *tp)?;
    }
    if mark_optional {
        for i in 0..child.patterns.len() {
            parent.mark_optional(base as usize + i);
        }
    } else {
        for i in 0..child.patterns.len() {
            if child.is_optional(i) {
                parent.mark_optional(base as usize + i);
            }
        }
    }
    for f in child.filters.iter() {
        parent.filters.try_push(*f).map_err(|CapacityExceededError| cap_err("filter expressions"))?;
    }
    for b in child.binds.iter() {
        parent.binds.try_push(*b).map_err(|CapacityExceededError| cap_err("bind expressions"))?;
    }
    if child.values.is_some() {
        parent.values = child.values;
    }
    for g in child.graphs.iter() {
        parent.graphs.try_push(*g).map_err(|CapacityExceededError| cap_err("GRAPH clauses"))?;
    }
    for s in child.services.iter() {
        parent.services.try_push(*s).map_err(|CapacityExceededError| cap_err("SERVICE clauses"))?;
    }
    for mb in child.minus_blocks.iter() {
        let rebased = MinusBlock { start: mb.start + base, end: mb.end + base, ..*mb };
        parent
            .minus_blocks
            .try_push(rebased)
            .map_err(|CapacityExceededError| cap_err("MINUS blocks"))?;
    }
    for sub in child.sub_selects {
        if let Some(sub) = sub {
            let slot = parent.sub_selects.iter_mut().find(|s| s.is_none());
            match slot {
                Some(slot) => *slot = Some(sub),
                None => return Err(cap_err("sub-selects")),
            }
        }
    }
    Ok(())
}

fn parse_bind(cursor: &mut Cursor, gp: &mut GraphPattern) -> ParseResult<()> {
    if cursor.peek() != b'(' {
        return Err(ParseError::UnexpectedChar { at: cursor.pos() });
    }
    cursor.advance();
    let expr = crate::parser::scan_expr_until_keyword(cursor, "AS")?;
    cursor.consume_keyword("AS")?;
    cursor.skip_whitespace();
    let var_start = cursor.pos();
    if !matches!(cursor.peek(), b'?' | b'$') {
        return Err(ParseError::UnexpectedChar { at: var_start });
    }
    cursor.advance();
    while cursor.peek().is_ascii_alphanumeric() || cursor.peek() == b'_' {
        cursor.advance();
    }
    let var = cursor.span_from(var_start);
    cursor.skip_whitespace();
    if cursor.peek() != b')' {
        return Err(ParseError::UnexpectedChar { at: cursor.pos() });
    }
    cursor.advance();

    let after_pattern_index = gp.patterns.len() as u32;
    gp.binds
        .try_push(BindExpr { expr, var, after_pattern_index })
        .map_err(|CapacityExceededError| cap_err("bind expressions"))
}

pub fn parse_values(cursor: &mut Cursor) -> ParseResult<Values> {
    let mut values = Values::default();
    cursor.skip_whitespace();
    if cursor.peek() == b'(' {
        cursor.advance();
        loop {
            cursor.skip_whitespace();
            if cursor.peek() == b')' {
                cursor.advance();
                break;
            }
            let t = parse_term(cursor)?;
            values
                .vars
                .try_push(t.span)
                .map_err(|CapacityExceededError| cap_err("VALUES variables"))?;
            cursor.skip_whitespace();
        }
    } else {
        let t = parse_term(cursor)?;
        values
            .vars
            .try_push(t.span)
            .map_err(|CapacityExceededError| cap_err("VALUES variables"))?;
    }
    cursor.skip_whitespace();
    if cursor.peek() != b'{' {
        return Err(ParseError::UnexpectedChar { at: cursor.pos() });
    }
    cursor.advance();
    loop {
        cursor.skip_whitespace();
        if cursor.peek() == b'}' {
            cursor.advance();
            break;
        }
        let mut row: ValuesRow = Default::default();
        if cursor.peek() == b'(' {
            cursor.advance();
            loop {
                cursor.skip_whitespace();
                if cursor.peek() == b')' {
                    cursor.advance();
                    break;
                }
                let span = if cursor.match_keyword("UNDEF") {
                    cursor.consume_keyword("UNDEF")?;
                    crate::span::Span::UNDEF
                } else {
                    parse_term(cursor)?.span
                };
                row.try_push(span).map_err(|CapacityExceededError| cap_err("VALUES row columns"))?;
                cursor.skip_whitespace();
            }
        } else {
            let span = if cursor.match_keyword("UNDEF") {
                cursor.consume_keyword("UNDEF")?;
                crate::span::Span::UNDEF
            } else {
                parse_term(cursor)?.span
            };
            row.try_push(span).map_err(|CapacityExceededError| cap_err("VALUES row columns"))?;
        }
        values.rows.try_push(row).map_err(|CapacityExceededError| cap_err("VALUES rows"))?;
    }
    Ok(values)
}

fn parse_graph_clause(cursor: &mut Cursor, gp: &mut GraphPattern, _scope_depth: u32) -> ParseResult<()> {
    let graph = parse_term(cursor)?;
    cursor.skip_whitespace();
    let inner: crate::fixed::FixedVec<TriplePattern, MAX_CLAUSE_PATTERNS> = parse_flat_pattern_list(cursor)?;
    gp.graphs
        .try_push(GraphClause { graph, patterns: inner })
        .map_err(|CapacityExceededError| cap_err("GRAPH clauses"))
}

fn parse_service_clause(
    cursor: &mut Cursor,
    gp: &mut GraphPattern,
    _scope_depth: u32,
    union_branch: bool,
    is_optional: bool,
) -> ParseResult<()> {
    let silent = if cursor.match_keyword("SILENT") {
        cursor.consume_keyword("SILENT")?;
        cursor.skip_whitespace();
        true
    } else {
        false
    };
    let endpoint = parse_term(cursor)?;
    cursor.skip_whitespace();
    let patterns: crate::fixed::FixedVec<TriplePattern, MAX_CLAUSE_PATTERNS> = parse_flat_pattern_list(cursor)?;
    gp.services
        .try_push(ServiceClause { silent, endpoint, union_branch, is_optional, patterns })
        .map_err(|CapacityExceededError| cap_err("SERVICE clauses"))
}

/// Parses `{ triplePattern ('.' triplePattern)* }` without any of the
/// algebraic constructs — used for `GRAPH`/`SERVICE`/`EXISTS` bodies,
/// which carry only their own flat pattern list.
pub fn parse_flat_pattern_list<const N: usize>(
    cursor: &mut Cursor,
) -> ParseResult<crate::fixed::FixedVec<TriplePattern, N>> {
    let mut list = crate::fixed::FixedVec::new();
    cursor.skip_whitespace();
    if cursor.peek() != b'{' {
        return Err(ParseError::UnexpectedChar { at: cursor.pos() });
    }
    cursor.advance();
    loop {
        cursor.skip_whitespace();
        if cursor.peek() == b'}' {
            cursor.advance();
            break;
        }
        let tp = parse_triple_pattern(cursor)?;
        list.try_push(tp).map_err(|CapacityExceededError| cap_err("clause triple patterns"))?;
        cursor.skip_whitespace();
        if cursor.peek() == b'.' {
            cursor.advance();
        }
    }
    Ok(list)
}

/// `MINUS { … }`: the body is a flat pattern list merged into the
/// parent's pattern array, bracketed by a `MinusBlock` recording
/// `[start, end)`. A `FILTER` inside the block — plain or
/// `[NOT] EXISTS { … }` — is captured onto that block's own `filter`
/// field via `capture_constraint_expr`, the same way a top-level
/// `FILTER` is, rather than the parent's filter list: it restricts which
/// minus-side solutions count toward the anti-join, not the outer row.
fn parse_minus_block(cursor: &mut Cursor, gp: &mut GraphPattern, scope_depth: u32) -> ParseResult<()> {
    cursor.skip_whitespace();
    if cursor.peek() != b'{' {
        return Err(ParseError::UnexpectedChar { at: cursor.pos() });
    }
    cursor.advance();

    let start = gp.patterns.len() as u32;
    let mut filter: Option<FilterExpr> = None;

    loop {
        cursor.skip_whitespace();
        if cursor.peek() == b'}' {
            cursor.advance();
            break;
        }
        if cursor.match_keyword("FILTER") {
            cursor.consume_keyword("FILTER")?;
            let expr = capture_constraint_expr(cursor)?;
            filter = Some(FilterExpr { expr, scope_depth });
        } else if cursor.match_keyword("MINUS") {
            cursor.consume_keyword("MINUS")?;
            cursor.skip_whitespace();
            parse_minus_block(cursor, gp, scope_depth + 1)?;
        } else {
            let tp = parse_triple_pattern(cursor)?;
            push_pattern(gp, tp)?;
            cursor.skip_whitespace();
            if cursor.peek() == b'.' {
                cursor.advance();
            }
        }
    }

    let end = gp.patterns.len() as u32;
    gp.minus_blocks
        .try_push(MinusBlock { start, end, filter })
        .map_err(|CapacityExceededError| cap_err("MINUS blocks"))
}

#[allow(dead_code)]
fn consume_raw_block(cursor: &mut Cursor) -> ParseResult<()> {
    consume_balanced(cursor, b'{', b'}').map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_bgp() {
        let src = "{ ?x <http://p> \"2\" }";
        let mut c = Cursor::new(src);
        let gp = parse_graph_pattern(&mut c, 0, false).unwrap();
        assert_eq!(gp.patterns.len(), 1);
    }

    #[test]
    fn parses_two_patterns_with_dot() {
        let src = "{ ?x <http://q> ?y . ?y <http://p> \"3\" }";
        let mut c = Cursor::new(src);
        let gp = parse_graph_pattern(&mut c, 0, false).unwrap();
        assert_eq!(gp.patterns.len(), 2);
    }

    #[test]
    fn parses_optional() {
        let src = "{ ?x <http://p> ?v . OPTIONAL { ?x <http://q> ?y } }";
        let mut c = Cursor::new(src);
        let gp = parse_graph_pattern(&mut c, 0, false).unwrap();
        assert_eq!(gp.patterns.len(), 2);
        assert!(!gp.is_optional(0));
        assert!(gp.is_optional(1));
    }

    #[test]
    fn parses_union() {
        let src = "{ { ?x <http://p> \"a\" } UNION { ?x <http://p> \"b\" } }";
        let mut c = Cursor::new(src);
        let gp = parse_graph_pattern(&mut c, 0, false).unwrap();
        assert_eq!(gp.patterns.len(), 2);
        assert_eq!(gp.union_start, Some(1));
    }

    #[test]
    fn parses_filter() {
        let src = "{ ?x <http://p> ?v FILTER(?v = \"2\") }";
        let mut c = Cursor::new(src);
        let gp = parse_graph_pattern(&mut c, 0, false).unwrap();
        assert_eq!(gp.filters.len(), 1);
    }

    #[test]
    fn parses_minus() {
        let src = "{ ?x <http://p> ?v MINUS { ?x <http://q> ?y } }";
        let mut c = Cursor::new(src);
        let gp = parse_graph_pattern(&mut c, 0, false).unwrap();
        assert_eq!(gp.minus_blocks.len(), 1);
    }

    #[test]
    fn parses_bind() {
        let src = "{ ?x <http://p> ?v BIND(?v AS ?w) }";
        let mut c = Cursor::new(src);
        let gp = parse_graph_pattern(&mut c, 0, false).unwrap();
        assert_eq!(gp.binds.len(), 1);
    }

    #[test]
    fn parses_values() {
        let src = "{ VALUES ?x { <http://a> <http://b> } }";
        let mut c = Cursor::new(src);
        let gp = parse_graph_pattern(&mut c, 0, false).unwrap();
        assert!(gp.values.is_some());
        assert_eq!(gp.values.unwrap().rows.len(), 2);
    }

    #[test]
    fn parses_graph_clause() {
        let src = "{ GRAPH ?g { ?x <http://p> ?v } }";
        let mut c = Cursor::new(src);
        let gp = parse_graph_pattern(&mut c, 0, false).unwrap();
        assert_eq!(gp.graphs.len(), 1);
        assert_eq!(gp.graphs.get(0).unwrap().patterns.len(), 1);
    }

    #[test]
    fn exceeding_capacity_is_an_error() {
        let mut src = String::from("{ ");
        for i in 0..40 {
            src.push_str(&format!("?x <http://p> \"{i}\" . "));
        }
        src.push('}');
        let mut c = Cursor::new(&src);
        let err = parse_graph_pattern(&mut c, 0, false).unwrap_err();
        assert!(matches!(err, ParseError::CapacityExceeded { .. }));
    }
}

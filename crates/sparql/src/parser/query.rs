//! Query parser: prologue, `SELECT`/`CONSTRUCT`/`ASK`/
//! `DESCRIBE` heads, `FROM` clauses, solution modifiers, trailing
//! `VALUES`.

use crate::ast::*;
use crate::cursor::Cursor;
use crate::error::{ParseError, ParseResult};
use crate::fixed::{CapacityExceededError, FixedVec};
use crate::parser::pattern::{parse_flat_pattern_list, parse_graph_pattern};
use crate::parser::scan_expr_until_keyword;
use crate::parser::term::parse_term;
use crate::span::Span;

fn cap_err(what: &'static str) -> ParseError {
    ParseError::CapacityExceeded { what }
}

/// Parses a complete query: prologue followed by one of the four forms.
pub fn parse_query(source: &str) -> ParseResult<Query> {
    let mut cursor = Cursor::new(source);
    let prologue = parse_prologue(&mut cursor)?;
    cursor.skip_whitespace();
    let mut query = if cursor.match_keyword("SELECT") {
        parse_select_body(&mut cursor)?
    } else if cursor.match_keyword("CONSTRUCT") {
        parse_construct_body(&mut cursor)?
    } else if cursor.match_keyword("ASK") {
        parse_ask_body(&mut cursor)?
    } else if cursor.match_keyword("DESCRIBE") {
        parse_describe_body(&mut cursor)?
    } else {
        return Err(ParseError::ExpectedKeyword { kw: "SELECT|CONSTRUCT|ASK|DESCRIBE", at: cursor.pos() });
    };
    query.prologue = prologue;
    Ok(query)
}

/// `(BASE <iri> | PREFIX ns: <iri>)*`. Up to 32 prefixes.
pub fn parse_prologue(cursor: &mut Cursor) -> ParseResult<Prologue> {
    let mut prologue = Prologue::default();
    loop {
        cursor.skip_whitespace();
        if cursor.match_keyword("BASE") {
            cursor.consume_keyword("BASE")?;
            cursor.skip_whitespace();
            let iri = crate::parser::term::parse_iri(cursor)?;
            prologue.base = Some(iri.span);
        } else if cursor.match_keyword("PREFIX") {
            cursor.consume_keyword("PREFIX")?;
            cursor.skip_whitespace();
            let prefix_start = cursor.pos();
            while cursor.peek().is_ascii_alphanumeric() || matches!(cursor.peek(), b'_' | b'-') {
                cursor.advance();
            }
            let prefix_span = cursor.span_from(prefix_start);
            if cursor.peek() != b':' {
                return Err(ParseError::UnexpectedChar { at: cursor.pos() });
            }
            cursor.advance();
            cursor.skip_whitespace();
            let iri = crate::parser::term::parse_iri(cursor)?;
            prologue
                .prefixes
                .try_push(PrefixDecl { prefix: prefix_span, iri: iri.span })
                .map_err(|CapacityExceededError| cap_err("prefix declarations"))?;
        } else {
            break;
        }
    }
    Ok(prologue)
}

fn parse_dataset_clauses(cursor: &mut Cursor) -> ParseResult<FixedVec<DatasetClause, MAX_DATASETS>> {
    let mut datasets = FixedVec::new();
    loop {
        cursor.skip_whitespace();
        if !cursor.match_keyword("FROM") {
            break;
        }
        cursor.consume_keyword("FROM")?;
        cursor.skip_whitespace();
        let named = if cursor.match_keyword("NAMED") {
            cursor.consume_keyword("NAMED")?;
            cursor.skip_whitespace();
            true
        } else {
            false
        };
        let term = parse_term(cursor)?;
        datasets
            .try_push(DatasetClause { graph: term.span, named })
            .map_err(|CapacityExceededError| cap_err("FROM clauses"))?;
    }
    Ok(datasets)
}

/// Optionally consumes the `WHERE` keyword (it is grammatically optional
/// in SPARQL 1.1) and then parses the group graph pattern that follows.
fn parse_where_clause(cursor: &mut Cursor) -> ParseResult<GraphPattern> {
    cursor.skip_whitespace();
    if cursor.match_keyword("WHERE") {
        cursor.consume_keyword("WHERE")?;
        cursor.skip_whitespace();
    }
    parse_graph_pattern(cursor, 0, false)
}

fn detect_aggregate_kind(cursor: &Cursor) -> Option<AggregateKind> {
    const KEYWORDS: &[(&str, AggregateKind)] = &[
        ("COUNT", AggregateKind::Count),
        ("SUM", AggregateKind::Sum),
        ("AVG", AggregateKind::Avg),
        ("MIN", AggregateKind::Min),
        ("MAX", AggregateKind::Max),
        ("GROUP_CONCAT", AggregateKind::GroupConcat),
        ("SAMPLE", AggregateKind::Sample),
    ];
    KEYWORDS.iter().find(|(kw, _)| cursor.match_keyword(kw)).map(|(_, kind)| *kind)
}

/// `SELECT [DISTINCT|REDUCED] (projection)+` followed by `FROM`*, `WHERE`,
/// solution modifier, and trailing `VALUES`. Shared by
/// top-level queries and `{ SELECT … }` sub-selects.
pub fn parse_select_body(cursor: &mut Cursor) -> ParseResult<Query> {
    cursor.consume_keyword("SELECT")?;
    cursor.skip_whitespace();
    let mut select = SelectClause::default();
    if cursor.match_keyword("DISTINCT") {
        cursor.consume_keyword("DISTINCT")?;
        select.distinct = true;
        cursor.skip_whitespace();
    } else if cursor.match_keyword("REDUCED") {
        cursor.consume_keyword("REDUCED")?;
        select.reduced = true;
        cursor.skip_whitespace();
    }
    if cursor.peek() == b'*' {
        cursor.advance();
        select.select_all = true;
        cursor.skip_whitespace();
    } else {
        loop {
            cursor.skip_whitespace();
            if matches!(cursor.peek(), b'?' | b'$') {
                let t = parse_term(cursor)?;
                select
                    .projections
                    .try_push(Projection { kind: ProjectionKind::Var(t.span) })
                    .map_err(|CapacityExceededError| cap_err("projected variables"))?;
            } else if cursor.peek() == b'(' {
                cursor.advance();
                cursor.skip_whitespace();
                let aggregate = detect_aggregate_kind(cursor);
                let expr = if let Some(kind) = aggregate {
                    // consume the aggregate name, then its own `( … )`
                    // argument list (which may contain `DISTINCT`).
                    let kw = match kind {
                        AggregateKind::Count => "COUNT",
                        AggregateKind::Sum => "SUM",
                        AggregateKind::Avg => "AVG",
                        AggregateKind::Min => "MIN",
                        AggregateKind::Max => "MAX",
                        AggregateKind::GroupConcat => "GROUP_CONCAT",
                        AggregateKind::Sample => "SAMPLE",
                        _ => unreachable!(),
                    };
                    cursor.consume_keyword(kw)?;
                    cursor.skip_whitespace();
                    crate::parser::consume_balanced(cursor, b'(', b')')?
                } else {
                    scan_expr_until_keyword(cursor, "AS")?
                };
                cursor.skip_whitespace();
                cursor.consume_keyword("AS")?;
                cursor.skip_whitespace();
                let alias = parse_term(cursor)?;
                cursor.skip_whitespace();
                if cursor.peek() != b')' {
                    return Err(ParseError::UnexpectedChar { at: cursor.pos() });
                }
                cursor.advance();
                select
                    .projections
                    .try_push(Projection {
                        kind: ProjectionKind::Computed {
                            expr,
                            alias: alias.span,
                            aggregate: aggregate.unwrap_or(AggregateKind::None),
                        },
                    })
                    .map_err(|CapacityExceededError| cap_err("projected variables"))?;
            } else {
                break;
            }
        }
    }

    let datasets = parse_dataset_clauses(cursor)?;
    let where_clause = parse_where_clause(cursor)?;
    let solution_modifier = parse_solution_modifier(cursor)?;
    let trailing_values = parse_trailing_values(cursor)?;

    let mut query = Query::new(QueryType::Select);
    query.select = Some(select);
    query.datasets = datasets;
    query.where_clause = where_clause;
    query.solution_modifier = solution_modifier;
    query.trailing_values = trailing_values;
    Ok(query)
}

/// `CONSTRUCT { template } FROM* WHERE { pattern } solutionModifier`, or
/// the `CONSTRUCT WHERE { pattern }` shorthand (template = pattern).
fn parse_construct_body(cursor: &mut Cursor) -> ParseResult<Query> {
    cursor.consume_keyword("CONSTRUCT")?;
    cursor.skip_whitespace();
    let mut query = Query::new(QueryType::Construct);

    if cursor.match_keyword("WHERE") {
        cursor.consume_keyword("WHERE")?;
        cursor.skip_whitespace();
        let gp = parse_graph_pattern(cursor, 0, false)?;
        for tp in gp.patterns.iter() {
            query
                .construct_template
                .try_push(*tp)
                .map_err(|CapacityExceededError| cap_err("construct template patterns"))?;
        }
        query.where_clause = gp;
    } else {
        query.construct_template = parse_flat_pattern_list(cursor)?;
        cursor.skip_whitespace();
        query.datasets = parse_dataset_clauses(cursor)?;
        query.where_clause = parse_where_clause(cursor)?;
    }
    query.solution_modifier = parse_solution_modifier(cursor)?;
    Ok(query)
}

fn parse_ask_body(cursor: &mut Cursor) -> ParseResult<Query> {
    cursor.consume_keyword("ASK")?;
    cursor.skip_whitespace();
    let mut query = Query::new(QueryType::Ask);
    query.datasets = parse_dataset_clauses(cursor)?;
    query.where_clause = parse_where_clause(cursor)?;
    query.solution_modifier = parse_solution_modifier(cursor)?;
    Ok(query)
}

fn parse_describe_body(cursor: &mut Cursor) -> ParseResult<Query> {
    cursor.consume_keyword("DESCRIBE")?;
    cursor.skip_whitespace();
    let mut query = Query::new(QueryType::Describe);
    if cursor.peek() == b'*' {
        cursor.advance();
        query.describe_all = true;
        cursor.skip_whitespace();
    } else {
        loop {
            cursor.skip_whitespace();
            if matches!(cursor.peek(), b'<' | b'?' | b'$') || cursor.peek().is_ascii_alphabetic() {
                if cursor.match_keyword("FROM") || cursor.match_keyword("WHERE") {
                    break;
                }
                let t = parse_term(cursor)?;
                query
                    .describe_targets
                    .try_push(t)
                    .map_err(|CapacityExceededError| cap_err("DESCRIBE targets"))?;
            } else {
                break;
            }
        }
    }
    query.datasets = parse_dataset_clauses(cursor)?;
    cursor.skip_whitespace();
    if cursor.match_keyword("WHERE") || cursor.peek() == b'{' {
        query.where_clause = parse_where_clause(cursor)?;
    }
    query.solution_modifier = parse_solution_modifier(cursor)?;
    Ok(query)
}

/// `GROUP BY (var | (expr AS alias))+`, `HAVING (expr)`, `ORDER BY
/// (ASC|DESC)? ?var (…)*`, `LIMIT n`, `OFFSET n`, plus the temporal
/// clause — all optional, all parsed in this order.
pub fn parse_solution_modifier(cursor: &mut Cursor) -> ParseResult<SolutionModifier> {
    let mut sm = SolutionModifier::default();

    cursor.skip_whitespace();
    if cursor.match_keyword("GROUP") {
        cursor.consume_keyword("GROUP")?;
        cursor.skip_whitespace();
        cursor.consume_keyword("BY")?;
        loop {
            cursor.skip_whitespace();
            if matches!(cursor.peek(), b'?' | b'$') {
                let t = parse_term(cursor)?;
                sm.group_by
                    .try_push(Projection { kind: ProjectionKind::Var(t.span) })
                    .map_err(|CapacityExceededError| cap_err("GROUP BY items"))?;
            } else if cursor.peek() == b'(' {
                cursor.advance();
                let expr = scan_expr_until_keyword(cursor, "AS")?;
                cursor.consume_keyword("AS")?;
                cursor.skip_whitespace();
                let alias = parse_term(cursor)?;
                cursor.skip_whitespace();
                if cursor.peek() != b')' {
                    return Err(ParseError::UnexpectedChar { at: cursor.pos() });
                }
                cursor.advance();
                sm.group_by
                    .try_push(Projection {
                        kind: ProjectionKind::Computed { expr, alias: alias.span, aggregate: AggregateKind::None },
                    })
                    .map_err(|CapacityExceededError| cap_err("GROUP BY items"))?;
            } else {
                break;
            }
        }
    }

    cursor.skip_whitespace();
    if cursor.match_keyword("HAVING") {
        cursor.consume_keyword("HAVING")?;
        sm.having = Some(crate::parser::capture_constraint_expr(cursor)?);
    }

    cursor.skip_whitespace();
    if cursor.match_keyword("ORDER") {
        cursor.consume_keyword("ORDER")?;
        cursor.skip_whitespace();
        cursor.consume_keyword("BY")?;
        loop {
            cursor.skip_whitespace();
            let descending = if cursor.match_keyword("DESC") {
                cursor.consume_keyword("DESC")?;
                cursor.skip_whitespace();
                true
            } else if cursor.match_keyword("ASC") {
                cursor.consume_keyword("ASC")?;
                cursor.skip_whitespace();
                false
            } else {
                false
            };
            let var_span = if matches!(cursor.peek(), b'?' | b'$') {
                parse_term(cursor)?.span
            } else if cursor.peek() == b'(' {
                crate::parser::consume_balanced(cursor, b'(', b')')?
            } else {
                break;
            };
            sm.order_by
                .try_push(OrderCondition { var: var_span, descending })
                .map_err(|CapacityExceededError| cap_err("ORDER BY conditions"))?;
        }
    }

    cursor.skip_whitespace();
    if cursor.match_keyword("LIMIT") {
        cursor.consume_keyword("LIMIT")?;
        cursor.skip_whitespace();
        sm.limit = Some(cursor.parse_integer()?);
    }

    cursor.skip_whitespace();
    if cursor.match_keyword("OFFSET") {
        cursor.consume_keyword("OFFSET")?;
        cursor.skip_whitespace();
        sm.offset = Some(cursor.parse_integer()?);
    }

    cursor.skip_whitespace();
    sm.temporal = parse_temporal_modifier(cursor)?;

    Ok(sm)
}

fn parse_temporal_modifier(cursor: &mut Cursor) -> ParseResult<Option<TemporalModifier>> {
    if cursor.match_keyword("AS") {
        cursor.consume_keyword("AS")?;
        cursor.skip_whitespace();
        cursor.consume_keyword("OF")?;
        cursor.skip_whitespace();
        let t = parse_term(cursor)?;
        return Ok(Some(TemporalModifier::AsOf(t.span)));
    }
    if cursor.match_keyword("DURING") {
        cursor.consume_keyword("DURING")?;
        cursor.skip_whitespace();
        if cursor.peek() != b'(' {
            return Err(ParseError::UnexpectedChar { at: cursor.pos() });
        }
        cursor.advance();
        cursor.skip_whitespace();
        let start = parse_term(cursor)?;
        cursor.skip_whitespace();
        if cursor.peek() != b',' {
            return Err(ParseError::UnexpectedChar { at: cursor.pos() });
        }
        cursor.advance();
        cursor.skip_whitespace();
        let end = parse_term(cursor)?;
        cursor.skip_whitespace();
        if cursor.peek() != b')' {
            return Err(ParseError::UnexpectedChar { at: cursor.pos() });
        }
        cursor.advance();
        return Ok(Some(TemporalModifier::During(start.span, end.span)));
    }
    if cursor.match_keyword("ALL") {
        cursor.consume_keyword("ALL")?;
        cursor.skip_whitespace();
        cursor.consume_keyword("VERSIONS")?;
        return Ok(Some(TemporalModifier::AllVersions));
    }
    Ok(None)
}

fn parse_trailing_values(cursor: &mut Cursor) -> ParseResult<Option<Values>> {
    cursor.skip_whitespace();
    if cursor.match_keyword("VALUES") {
        cursor.consume_keyword("VALUES")?;
        cursor.skip_whitespace();
        Ok(Some(crate::parser::pattern::parse_values(cursor)?))
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_select_star() {
        let q = parse_query("SELECT * WHERE { ?x <http://p> \"2\" }").unwrap();
        assert_eq!(q.query_type, QueryType::Select);
        assert!(q.select.unwrap().select_all);
    }

    #[test]
    fn parses_select_distinct_with_order_by() {
        let q = parse_query(
            "SELECT DISTINCT ?o WHERE { ?s <http://p> ?o } ORDER BY DESC(?o)",
        )
        .unwrap();
        let sel = q.select.unwrap();
        assert!(sel.distinct);
        assert_eq!(q.solution_modifier.order_by.len(), 1);
        assert!(q.solution_modifier.order_by.get(0).unwrap().descending);
    }

    #[test]
    fn parses_prologue_prefixes() {
        let q = parse_query(
            "PREFIX ex: <http://example.org/> SELECT ?x WHERE { ?x ex:p \"v\" }",
        )
        .unwrap();
        assert_eq!(q.prologue.prefixes.len(), 1);
    }

    #[test]
    fn parses_ask() {
        let q = parse_query("ASK WHERE { <http://a> <http://p> \"3\" }").unwrap();
        assert_eq!(q.query_type, QueryType::Ask);
    }

    #[test]
    fn parses_limit_offset() {
        let q = parse_query("SELECT ?x WHERE { ?x <http://p> ?v } LIMIT 5 OFFSET 2").unwrap();
        assert_eq!(q.solution_modifier.limit, Some(5));
        assert_eq!(q.solution_modifier.offset, Some(2));
    }

    #[test]
    fn parses_aggregate_projection() {
        let q = parse_query(
            "SELECT (COUNT(?x) AS ?c) WHERE { ?x <http://p> ?v } GROUP BY ?v",
        )
        .unwrap();
        let sel = q.select.unwrap();
        assert_eq!(sel.projections.len(), 1);
        match sel.projections.get(0).unwrap().kind {
            ProjectionKind::Computed { aggregate, .. } => assert_eq!(aggregate, AggregateKind::Count),
            _ => panic!("expected computed projection"),
        }
    }
}

//! SPARQL Update parser: `INSERT DATA`/`DELETE DATA`/`DELETE`/`INSERT`/
//! `LOAD`/`CLEAR`/`CREATE`/`DROP`. The AST carries these shapes (spec.md
//! §1 lists update operations as an external collaborator) but nothing in
//! this crate executes them — a store applies `UpdateOperation`s itself.

use crate::ast::*;
use crate::cursor::Cursor;
use crate::error::{ParseError, ParseResult};
use crate::parser::pattern::{parse_flat_pattern_list, parse_graph_pattern};
use crate::parser::query::parse_prologue;
use crate::parser::term::parse_term;

/// Parses a `;`-separated sequence of update operations, each preceded by
/// its own (possibly empty) prologue. The returned `Update::prologue` is
/// the first operation's prologue; later operations may redeclare prefixes
/// but this AST keeps only one shared prologue, matching how the parser's
/// single-query counterpart hangs the prologue off the outermost node.
pub fn parse_update(source: &str) -> ParseResult<Update> {
    let mut cursor = Cursor::new(source);
    let prologue = parse_prologue(&mut cursor)?;
    let mut operations = Vec::new();
    loop {
        cursor.skip_whitespace();
        if cursor.is_at_end() {
            break;
        }
        let op = parse_update_operation(&mut cursor)?;
        operations.push(op);
        cursor.skip_whitespace();
        if cursor.peek() == b';' {
            cursor.advance();
            cursor.skip_whitespace();
            // A second request may carry its own prologue; parse and
            // discard it here (re-declared prefixes resolve identically
            // for the operations that follow within this call).
            parse_prologue(&mut cursor)?;
        } else {
            break;
        }
    }
    Ok(Update { prologue, operations })
}

fn parse_update_operation(cursor: &mut Cursor) -> ParseResult<UpdateOperation> {
    if cursor.match_keyword("INSERT") {
        cursor.consume_keyword("INSERT")?;
        cursor.skip_whitespace();
        if cursor.match_keyword("DATA") {
            cursor.consume_keyword("DATA")?;
            cursor.skip_whitespace();
            let quads = parse_flat_pattern_list(cursor)?;
            return Ok(UpdateOperation::InsertData { quads });
        }
        return parse_modify(cursor, FixedVecKind::InsertOnly);
    }
    if cursor.match_keyword("DELETE") {
        cursor.consume_keyword("DELETE")?;
        cursor.skip_whitespace();
        if cursor.match_keyword("DATA") {
            cursor.consume_keyword("DATA")?;
            cursor.skip_whitespace();
            let quads = parse_flat_pattern_list(cursor)?;
            return Ok(UpdateOperation::DeleteData { quads });
        }
        return parse_modify(cursor, FixedVecKind::DeleteFirst);
    }
    if cursor.match_keyword("WITH") {
        // `WITH <graph> DELETE/INSERT ... WHERE ...` — the graph target
        // narrows both sides to one graph; not separately represented in
        // `UpdateOperation::DeleteInsert`, so parse and drop it (the
        // `WHERE` pattern still records any `GRAPH` clauses written
        // explicitly inside the braces).
        cursor.consume_keyword("WITH")?;
        cursor.skip_whitespace();
        parse_term(cursor)?;
        cursor.skip_whitespace();
        return parse_update_operation(cursor);
    }
    if cursor.match_keyword("LOAD") {
        cursor.consume_keyword("LOAD")?;
        cursor.skip_whitespace();
        if cursor.match_keyword("SILENT") {
            cursor.consume_keyword("SILENT")?;
            cursor.skip_whitespace();
        }
        let source_term = parse_term(cursor)?;
        cursor.skip_whitespace();
        let into = if cursor.match_keyword("INTO") {
            cursor.consume_keyword("INTO")?;
            cursor.skip_whitespace();
            cursor.consume_keyword("GRAPH")?;
            cursor.skip_whitespace();
            Some(parse_term(cursor)?)
        } else {
            None
        };
        return Ok(UpdateOperation::Load { source: source_term.span, into });
    }
    if cursor.match_keyword("CLEAR") {
        cursor.consume_keyword("CLEAR")?;
        cursor.skip_whitespace();
        let silent = consume_silent(cursor)?;
        let target = parse_graph_target(cursor)?;
        return Ok(UpdateOperation::Clear { target, silent });
    }
    if cursor.match_keyword("CREATE") {
        cursor.consume_keyword("CREATE")?;
        cursor.skip_whitespace();
        let silent = consume_silent(cursor)?;
        cursor.consume_keyword("GRAPH")?;
        cursor.skip_whitespace();
        let graph = parse_term(cursor)?;
        return Ok(UpdateOperation::Create { graph, silent });
    }
    if cursor.match_keyword("DROP") {
        cursor.consume_keyword("DROP")?;
        cursor.skip_whitespace();
        let silent = consume_silent(cursor)?;
        let target = parse_graph_target(cursor)?;
        return Ok(UpdateOperation::Drop { target, silent });
    }
    Err(ParseError::ExpectedKeyword {
        kw: "INSERT|DELETE|LOAD|CLEAR|CREATE|DROP",
        at: cursor.pos(),
    })
}

fn consume_silent(cursor: &mut Cursor) -> ParseResult<bool> {
    if cursor.match_keyword("SILENT") {
        cursor.consume_keyword("SILENT")?;
        cursor.skip_whitespace();
        Ok(true)
    } else {
        Ok(false)
    }
}

fn parse_graph_target(cursor: &mut Cursor) -> ParseResult<GraphTarget> {
    if cursor.match_keyword("DEFAULT") {
        cursor.consume_keyword("DEFAULT")?;
        return Ok(GraphTarget::Default);
    }
    if cursor.match_keyword("ALL") {
        cursor.consume_keyword("ALL")?;
        return Ok(GraphTarget::All);
    }
    if cursor.match_keyword("GRAPH") {
        cursor.consume_keyword("GRAPH")?;
        cursor.skip_whitespace();
    }
    let term = parse_term(cursor)?;
    Ok(GraphTarget::Named(term))
}

/// Which half of a `DELETE { … } INSERT { … } WHERE { … }` request was
/// already consumed by the caller's leading keyword.
enum FixedVecKind {
    DeleteFirst,
    InsertOnly,
}

/// `DELETE { template } [INSERT { template }] WHERE { pattern }`, or
/// `INSERT { template } WHERE { pattern }`. Both quad-pattern templates
/// reuse the triple-pattern grammar (a `GRAPH` block inside either
/// template is parsed as an ordinary nested pattern list).
fn parse_modify(cursor: &mut Cursor, kind: FixedVecKind) -> ParseResult<UpdateOperation> {
    cursor.skip_whitespace();
    let mut delete = crate::fixed::FixedVec::<TriplePattern, MAX_TRIPLE_PATTERNS>::new();
    let mut insert = crate::fixed::FixedVec::<TriplePattern, MAX_TRIPLE_PATTERNS>::new();

    match kind {
        FixedVecKind::DeleteFirst => {
            delete = parse_flat_pattern_list(cursor)?;
            cursor.skip_whitespace();
            if cursor.match_keyword("INSERT") {
                cursor.consume_keyword("INSERT")?;
                cursor.skip_whitespace();
                insert = parse_flat_pattern_list(cursor)?;
                cursor.skip_whitespace();
            }
        }
        FixedVecKind::InsertOnly => {
            insert = parse_flat_pattern_list(cursor)?;
            cursor.skip_whitespace();
        }
    }

    cursor.consume_keyword("WHERE")?;
    cursor.skip_whitespace();
    let pattern = parse_graph_pattern(cursor, 0, false)?;

    Ok(UpdateOperation::DeleteInsert { delete, insert, pattern })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_insert_data() {
        let u = parse_update("INSERT DATA { <http://a> <http://p> \"1\" }").unwrap();
        assert_eq!(u.operations.len(), 1);
        match &u.operations[0] {
            UpdateOperation::InsertData { quads } => assert_eq!(quads.len(), 1),
            _ => panic!("expected InsertData"),
        }
    }

    #[test]
    fn parses_delete_data() {
        let u = parse_update("DELETE DATA { <http://a> <http://p> \"1\" }").unwrap();
        match &u.operations[0] {
            UpdateOperation::DeleteData { quads } => assert_eq!(quads.len(), 1),
            _ => panic!("expected DeleteData"),
        }
    }

    #[test]
    fn parses_delete_insert_where() {
        let u = parse_update(
            "DELETE { ?s <http://p> ?o } INSERT { ?s <http://q> ?o } WHERE { ?s <http://p> ?o }",
        )
        .unwrap();
        match &u.operations[0] {
            UpdateOperation::DeleteInsert { delete, insert, pattern } => {
                assert_eq!(delete.len(), 1);
                assert_eq!(insert.len(), 1);
                assert_eq!(pattern.patterns.len(), 1);
            }
            _ => panic!("expected DeleteInsert"),
        }
    }

    #[test]
    fn parses_clear_graph() {
        let u = parse_update("CLEAR SILENT GRAPH <http://g>").unwrap();
        match &u.operations[0] {
            UpdateOperation::Clear { target: GraphTarget::Named(_), silent: true } => {}
            _ => panic!("expected Clear"),
        }
    }

    #[test]
    fn parses_drop_default() {
        let u = parse_update("DROP DEFAULT").unwrap();
        match &u.operations[0] {
            UpdateOperation::Drop { target: GraphTarget::Default, silent: false } => {}
            _ => panic!("expected Drop"),
        }
    }

    #[test]
    fn parses_load_into() {
        let u = parse_update("LOAD <http://src> INTO GRAPH <http://dst>").unwrap();
        match &u.operations[0] {
            UpdateOperation::Load { into: Some(_), .. } => {}
            _ => panic!("expected Load"),
        }
    }

    #[test]
    fn parses_multiple_operations() {
        let u = parse_update(
            "CLEAR GRAPH <http://g> ; INSERT DATA { <http://a> <http://p> \"1\" }",
        )
        .unwrap();
        assert_eq!(u.operations.len(), 2);
    }
}

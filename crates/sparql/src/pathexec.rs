//! Property-path execution. The
//! parser keeps `PropertyPath` operands as spans rather than an owned
//! recursive tree, so walking a path means re-classifying
//! each operand span on demand with `crate::parser::path::classify` —
//! the same re-entrant-parse approach used for `IF`/`FILTER` bodies.

use crate::ast::Prologue;
use crate::parser::path::classify;
use crate::path::PathKind;
use crate::resolve::resolve_iri_text;
use crate::span::Span;
use crate::store::TripleSource;
use rustc_hash::FxHashSet;

fn hop_forward(store: &dyn TripleSource, pred: &str, from: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut it = store.query_current(Some(from), Some(pred), None);
    while it.move_next() {
        out.push(it.current().2.to_string());
    }
    out
}

fn hop_backward(store: &dyn TripleSource, pred: &str, to: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut it = store.query_current(None, Some(pred), Some(to));
    while it.move_next() {
        out.push(it.current().0.to_string());
    }
    out
}

/// Re-classifies `span`'s source text as a path expression and
/// evaluates one forward hop from `from`, handling the `PathKind::None`
/// (plain IRI) base case inline.
fn eval_operand(store: &dyn TripleSource, source: &str, prologue: &Prologue, span: &Span, from: &str, max_depth: usize) -> Vec<String> {
    let text = span.resolve(source);
    let (kind, head) = classify(text, span.offset);
    if kind == PathKind::None {
        let pred = resolve_iri_text(head.resolve(source), prologue, source);
        hop_forward(store, &pred, from)
    } else {
        eval_from(store, source, prologue, &kind, from, max_depth, &mut FxHashSet::default())
    }
}

fn parse_negated_set(text: &str, prologue: &Prologue, source: &str) -> FxHashSet<String> {
    text.split('|')
        .map(|part| resolve_iri_text(part.trim().trim_start_matches('^'), prologue, source))
        .collect()
}

/// Breadth-first transitive closure for `*`/`+`, guarded by a visited
/// set for cycle detection and `max_depth`
/// (`ExecutorConfig::max_path_depth`) as a hard backstop.
fn closure(
    store: &dyn TripleSource,
    source: &str,
    prologue: &Prologue,
    span: &Span,
    from: &str,
    include_zero: bool,
    max_depth: usize,
) -> Vec<String> {
    let mut visited: FxHashSet<String> = FxHashSet::default();
    visited.insert(from.to_string());
    let mut out = Vec::new();
    if include_zero {
        out.push(from.to_string());
    }
    let mut frontier = vec![from.to_string()];
    let mut depth = 0;
    while !frontier.is_empty() && depth < max_depth {
        depth += 1;
        let mut next_frontier = Vec::new();
        for node in &frontier {
            for reached in eval_operand(store, source, prologue, span, node) {
                if visited.insert(reached.clone()) {
                    out.push(reached.clone());
                    next_frontier.push(reached);
                }
            }
        }
        frontier = next_frontier;
    }
    out
}

/// Evaluates an already-classified `PathKind`, returning every node
/// reachable from `from` in the forward direction. `max_depth` bounds
/// any `*`/`+` closure reached along the way
/// (`ExecutorConfig::max_path_depth`).
fn eval_from(
    store: &dyn TripleSource,
    source: &str,
    prologue: &Prologue,
    kind: &PathKind,
    from: &str,
    max_depth: usize,
    _seen: &mut FxHashSet<String>,
) -> Vec<String> {
    match kind {
        PathKind::None => Vec::new(),
        PathKind::Inverse(iri_span) | PathKind::GroupedInverse(iri_span) => {
            let pred = resolve_iri_text(iri_span.resolve(source), prologue, source);
            hop_backward(store, &pred, from)
        }
        PathKind::ZeroOrMore(span) | PathKind::GroupedZeroOrMore(span) => {
            closure(store, source, prologue, span, from, true, max_depth)
        }
        PathKind::OneOrMore(span) | PathKind::GroupedOneOrMore(span) => {
            closure(store, source, prologue, span, from, false, max_depth)
        }
        PathKind::ZeroOrOne(span) | PathKind::GroupedZeroOrOne(span) => {
            let mut out = vec![from.to_string()];
            out.extend(eval_operand(store, source, prologue, span, from, max_depth));
            out
        }
        PathKind::Sequence(left, right) => eval_operand(store, source, prologue, left, from, max_depth)
            .into_iter()
            .flat_map(|mid| eval_operand(store, source, prologue, right, &mid, max_depth))
            .collect(),
        PathKind::Alternative(left, right) => {
            let mut out = eval_operand(store, source, prologue, left, from, max_depth);
            out.extend(eval_operand(store, source, prologue, right, from, max_depth));
            out
        }
        PathKind::NegatedSet(span) => {
            let excluded = parse_negated_set(span.resolve(source), prologue, source);
            let mut out = Vec::new();
            let mut it = store.query_current(Some(from), None, None);
            while it.move_next() {
                let (_, p, o) = it.current();
                if !excluded.contains(p) {
                    out.push(o.to_string());
                }
            }
            out
        }
    }
}

/// Top-level entry used by the pattern scanner when a `TriplePattern`
/// carries a property path. Returns every `(subject, object)` pair
/// satisfying the path, honoring whichever end is already bound.
/// `max_depth` is `ExecutorConfig::max_path_depth`, the caller's
/// transitive-closure BFS-frontier cap.
///
/// When the subject is unbound, this enumerates candidate subjects from
/// the store and walks the path forward from each — a documented
/// limitation (no general reverse-path solver): quadratic in store size
/// for such queries.
pub fn eval_path_pairs(
    store: &dyn TripleSource,
    source: &str,
    prologue: &Prologue,
    kind: &PathKind,
    subject: Option<&str>,
    object: Option<&str>,
    max_depth: usize,
) -> Vec<(String, String)> {
    let mut seen = FxHashSet::default();
    if let Some(s) = subject {
        return eval_from(store, source, prologue, kind, s, max_depth, &mut seen)
            .into_iter()
            .filter(|o| object.is_none_or(|ob| ob == o))
            .map(|o| (s.to_string(), o))
            .collect();
    }

    let mut out = Vec::new();
    let mut it = store.query_current(None, None, None);
    let mut seen_subjects: FxHashSet<String> = FxHashSet::default();
    while it.move_next() {
        let subj_text = it.current().0.to_string();
        if seen_subjects.insert(subj_text.clone()) {
            for o in eval_from(store, source, prologue, kind, &subj_text, max_depth, &mut seen) {
                if object.is_none_or(|ob| ob == o) {
                    out.push((subj_text.clone(), o));
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Prologue;

    struct FixtureStore {
        triples: Vec<(String, String, String)>,
    }

    struct FixtureEnum {
        rows: Vec<(String, String, String)>,
        idx: usize,
    }

    impl crate::store::TripleEnumerator for FixtureEnum {
        fn move_next(&mut self) -> bool {
            if self.idx < self.rows.len() {
                self.idx += 1;
                true
            } else {
                false
            }
        }
        fn current(&self) -> (&str, &str, &str) {
            let (s, p, o) = &self.rows[self.idx - 1];
            (s, p, o)
        }
    }

    impl TripleSource for FixtureStore {
        fn query_current<'s>(
            &'s self,
            subject: Option<&str>,
            predicate: Option<&str>,
            object: Option<&str>,
        ) -> Box<dyn crate::store::TripleEnumerator + 's> {
            let rows = self
                .triples
                .iter()
                .filter(|(s, p, o)| {
                    subject.is_none_or(|x| x == s) && predicate.is_none_or(|x| x == p) && object.is_none_or(|x| x == o)
                })
                .cloned()
                .collect();
            Box::new(FixtureEnum { rows, idx: 0 })
        }
    }

    #[test]
    fn sequence_path_composes_two_hops() {
        let store = FixtureStore {
            triples: vec![
                ("<a>".into(), "<q>".into(), "<b>".into()),
                ("<b>".into(), "<p>".into(), "\"3\"".into()),
            ],
        };
        let source = "<q>/<p>";
        let (kind, _head) = classify(source, 0);
        let pairs = eval_path_pairs(&store, source, &Prologue::default(), &kind, Some("<a>"), None, 64);
        assert_eq!(pairs, vec![("<a>".to_string(), "\"3\"".to_string())]);
    }

    #[test]
    fn zero_or_more_includes_start_node() {
        let store = FixtureStore {
            triples: vec![("<a>".into(), "<q>".into(), "<b>".into()), ("<b>".into(), "<q>".into(), "<c>".into())],
        };
        let source = "<q>*";
        let (kind, _head) = classify(source, 0);
        let mut reached = eval_from(&store, source, &Prologue::default(), &kind, "<a>", 64, &mut Default::default());
        reached.sort();
        assert_eq!(reached, vec!["<a>".to_string(), "<b>".to_string(), "<c>".to_string()]);
    }
}

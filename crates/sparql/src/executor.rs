//! Pull-based join engine: turns a parsed
//! `Query` plus a `TripleSource` into a `QueryResults` iterator of
//! solutions, one `move_next`/`current` pair at a time. No batch
//! materialization happens unless `ORDER BY` forces it.
//!
//! The engine walks the `WHERE` clause's flattened pattern list as a
//! sequence of nested-loop "levels" — one per required triple pattern,
//! `GRAPH`-clause pattern, and sub-select — and backtracks across them the
//! way standard nested-loop backtracking does: advance the deepest level;
//! on exhaustion, rewind it and back up one level; on success, step one
//! level deeper. `OPTIONAL`, `BIND`, `FILTER`, `MINUS` and `VALUES` are
//! then applied to whatever full binding frame the join produced, in that
//! order.

use crate::ast::{
    GraphClause, GraphPattern, OrderCondition, ProjectionKind, Prologue, Query, TemporalModifier, TriplePattern, Values,
};
use crate::bindings::{hash_variable_name, BindingTable};
use crate::eval::{self, evaluate_bind, evaluate_filter, ExistsTester, Value};
use crate::pathexec;
use crate::resolve::resolve_term_filter;
use crate::span::Span;
use crate::store::{ExecutorConfig, TemporalQuery, TripleEnumerator, TripleSource};
use crate::term::Term;
use rustc_hash::FxHashSet;

/// One row snapshot: every bound variable's hash plus its evaluated
/// `Value`, detached from any `BindingTable`'s buffer.
type MaterializedRow = Vec<(u32, Value)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Branch {
    Left,
    Right,
}

/// Which collaborator a join level pulls candidates from. Required
/// (non-`OPTIONAL`) main patterns are not necessarily contiguous in
/// `GraphPattern::patterns` once `OPTIONAL` blocks are interspersed, so
/// the engine addresses levels by this indirection rather than by a bare
/// pattern index.
#[derive(Debug, Clone, Copy)]
enum LevelSource {
    Main(usize),
    Graph(usize, usize),
    SubSelect(usize),
}

enum LevelCursor<'s> {
    Store(Box<dyn TripleEnumerator + 's>),
    Pairs(std::vec::IntoIter<(String, String)>),
    Rows(std::vec::IntoIter<MaterializedRow>),
}

struct LevelState<'s> {
    binding_count_at_entry: usize,
    cursor: Option<LevelCursor<'s>>,
}

impl<'s> Default for LevelState<'s> {
    fn default() -> Self {
        LevelState { binding_count_at_entry: 0, cursor: None }
    }
}

enum Candidate {
    Triple(String, String, String),
    Pair(String, String),
    Row(MaterializedRow),
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Empty,
    Streaming,
    Collecting,
    SortedStreaming,
    Done,
}

/// A live binding, or one row pulled off the `ORDER BY` materialization —
/// whichever `QueryResults` is currently iterating.
pub enum CurrentRow<'a> {
    Live(&'a BindingTable),
    Materialized(&'a [(u32, Value)]),
}

impl<'a> CurrentRow<'a> {
    /// Looks up `name` (sigil already stripped) in the current row.
    pub fn get(&self, name: &str) -> Value {
        let hash = hash_variable_name(name);
        match self {
            CurrentRow::Live(b) => match b.find_binding(hash) {
                Some(idx) => eval::binding_to_value(b, idx),
                None => Value::Unbound,
            },
            CurrentRow::Materialized(row) => {
                row.iter().find(|(h, _)| *h == hash).map(|(_, v)| v.clone()).unwrap_or(Value::Unbound)
            }
        }
    }
}

fn required_indices(gp: &GraphPattern, branch: Branch) -> Vec<usize> {
    let union_start = gp.union_start.unwrap_or(gp.patterns.len() as u32) as usize;
    let (lo, hi) = match branch {
        Branch::Left => (0, union_start),
        Branch::Right => (union_start, gp.patterns.len()),
    };
    (lo..hi).filter(|&i| !gp.is_optional(i)).collect()
}

fn optional_indices(gp: &GraphPattern, branch: Branch) -> Vec<usize> {
    let union_start = gp.union_start.unwrap_or(gp.patterns.len() as u32) as usize;
    let (lo, hi) = match branch {
        Branch::Left => (0, union_start),
        Branch::Right => (union_start, gp.patterns.len()),
    };
    (lo..hi).filter(|&i| gp.is_optional(i)).collect()
}

fn graph_levels(gp: &GraphPattern) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    for (ci, clause) in gp.graphs.iter().enumerate() {
        for pi in 0..clause.patterns.len() {
            out.push((ci, pi));
        }
    }
    out
}

fn subselect_levels(gp: &GraphPattern) -> Vec<usize> {
    (0..gp.sub_selects.len()).filter(|&i| gp.sub_selects[i].is_some()).collect()
}

fn build_levels(gp: &GraphPattern, branch: Branch) -> Vec<LevelSource> {
    let mut levels: Vec<LevelSource> = required_indices(gp, branch).into_iter().map(LevelSource::Main).collect();
    for (ci, pi) in graph_levels(gp) {
        levels.push(LevelSource::Graph(ci, pi));
    }
    for si in subselect_levels(gp) {
        levels.push(LevelSource::SubSelect(si));
    }
    levels
}

fn bind_term(bindings: &mut BindingTable, term: &Term, source: &str, depth: u32, text: &str) -> bool {
    if !term.is_variable() {
        return true;
    }
    bindings.try_bind_lexical(hash_variable_name(term.variable_name(source)), text, depth)
}

fn try_bind_triple(bindings: &mut BindingTable, pattern: &TriplePattern, source: &str, depth: u32, s: &str, p: &str, o: &str) -> bool {
    let ok_s = bind_term(bindings, &pattern.subject, source, depth, s);
    let ok_p = pattern.has_property_path() || bind_term(bindings, &pattern.predicate, source, depth, p);
    let ok_o = bind_term(bindings, &pattern.object, source, depth, o);
    ok_s && ok_p && ok_o
}

fn bind_value_checked(bindings: &mut BindingTable, hash: u32, value: &Value, depth: u32) -> bool {
    if let Some(idx) = bindings.find_binding(hash) {
        eval::value_string_content(&eval::binding_to_value(bindings, idx)) == eval::value_string_content(value)
    } else {
        eval::bind_value(bindings, hash, value, depth);
        true
    }
}

/// Recursive backtracking existence test shared by `MINUS` anti-joins and
/// `FILTER [NOT] EXISTS`: does at least one
/// assignment of `patterns` against `store` extend the frame already in
/// `bindings` without contradicting it, *and*, if `filter` is given,
/// satisfy that expression against the resulting frame? Runs against a
/// scratch clone so the caller's live row is untouched either way.
fn block_matches(
    store: &dyn TripleSource,
    prologue: &Prologue,
    source: &str,
    patterns: &[TriplePattern],
    bindings: &BindingTable,
    config: &ExecutorConfig,
    filter: Option<Span>,
) -> bool {
    #[allow(clippy::too_many_arguments)]
    fn go(
        i: usize,
        patterns: &[TriplePattern],
        store: &dyn TripleSource,
        prologue: &Prologue,
        source: &str,
        bindings: &mut BindingTable,
        config: &ExecutorConfig,
        filter: Option<Span>,
    ) -> bool {
        if i == patterns.len() {
            return match filter {
                Some(expr) => {
                    let ro = &*bindings;
                    let tester = StoreExistsTester { store, prologue, bindings: ro, config };
                    evaluate_filter(expr, source, ro, config, &tester)
                }
                None => true,
            };
        }
        let pattern = patterns[i];
        let entry = bindings.len();
        let subj = resolve_term_filter(&pattern.subject, source, prologue, bindings);
        let obj = resolve_term_filter(&pattern.object, source, prologue, bindings);
        if pattern.has_property_path() {
            let pairs =
                pathexec::eval_path_pairs(store, source, prologue, &pattern.path.kind, subj.as_deref(), obj.as_deref(), config.max_path_depth);
            for (s, o) in pairs {
                bindings.truncate_to(entry);
                let ok = bind_term(bindings, &pattern.subject, source, 0, &s) && bind_term(bindings, &pattern.object, source, 0, &o);
                if ok && go(i + 1, patterns, store, prologue, source, bindings, config, filter) {
                    return true;
                }
            }
        } else {
            let pred = resolve_term_filter(&pattern.predicate, source, prologue, bindings);
            let mut it = store.query_current(subj.as_deref(), pred.as_deref(), obj.as_deref());
            while it.move_next() {
                let (s, p, o) = it.current();
                let (s, p, o) = (s.to_string(), p.to_string(), o.to_string());
                bindings.truncate_to(entry);
                if try_bind_triple(bindings, &pattern, source, 0, &s, &p, &o) && go(i + 1, patterns, store, prologue, source, bindings, config, filter) {
                    return true;
                }
            }
        }
        bindings.truncate_to(entry);
        false
    }
    let mut scratch = bindings.clone();
    go(0, patterns, store, prologue, source, &mut scratch, config, filter)
}

struct StoreExistsTester<'a> {
    store: &'a dyn TripleSource,
    prologue: &'a Prologue,
    bindings: &'a BindingTable,
    config: &'a ExecutorConfig,
}

impl<'a> ExistsTester for StoreExistsTester<'a> {
    fn test(&self, patterns: &[TriplePattern], source: &str) -> bool {
        block_matches(self.store, self.prologue, source, patterns, self.bindings, self.config, None)
    }
}

fn compare_values_for_order(a: &Value, b: &Value) -> std::cmp::Ordering {
    let (sa, sb) = (eval::value_string_content(a), eval::value_string_content(b));
    match (sa.parse::<f64>(), sb.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(std::cmp::Ordering::Equal),
        _ => sa.cmp(&sb),
    }
}

/// Iterator over a query's solutions. Built by [`execute`];
/// drive it with [`move_next`](QueryResults::move_next) and read the
/// current row with [`get`](QueryResults::get)/[`current`](QueryResults::current).
pub struct QueryResults<'q, 's> {
    store: &'s dyn TripleSource,
    query: &'q Query,
    source: &'q str,
    config: ExecutorConfig,
    bindings: BindingTable,
    state: State,
    branch: Branch,
    levels_src: Vec<LevelSource>,
    levels: Vec<LevelState<'s>>,
    current_level: usize,
    seen: FxHashSet<u32>,
    offset_remaining: i64,
    limit: Option<i64>,
    returned: i64,
    sorted_rows: Vec<MaterializedRow>,
    sorted_pos: usize,
}

impl<'q, 's> QueryResults<'q, 's> {
    #[tracing::instrument(skip_all, fields(query_type = ?query.query_type))]
    pub fn new(store: &'s dyn TripleSource, query: &'q Query, source: &'q str, config: ExecutorConfig) -> Self {
        let gp = &query.where_clause;
        let is_empty = gp.patterns.is_empty() || required_indices(gp, Branch::Left).is_empty();
        let branch = Branch::Left;
        let levels_src = if is_empty { Vec::new() } else { build_levels(gp, branch) };
        let n = levels_src.len();
        let has_order = !query.solution_modifier.order_by.is_empty();
        QueryResults {
            store,
            query,
            source,
            config,
            bindings: BindingTable::new(),
            state: if is_empty {
                State::Empty
            } else if has_order {
                State::Collecting
            } else {
                State::Streaming
            },
            branch,
            levels_src,
            levels: (0..n).map(|_| LevelState::default()).collect(),
            current_level: 0,
            seen: FxHashSet::default(),
            offset_remaining: query.solution_modifier.offset.unwrap_or(0).max(0),
            limit: query.solution_modifier.limit,
            returned: 0,
            sorted_rows: Vec::new(),
            sorted_pos: 0,
        }
    }

    fn temporal_query(&self) -> Option<TemporalQuery<'q>> {
        match &self.query.solution_modifier.temporal {
            None => None,
            Some(TemporalModifier::AsOf(span)) => Some(TemporalQuery::AsOf(span.resolve(self.source))),
            Some(TemporalModifier::During(a, b)) => Some(TemporalQuery::During(a.resolve(self.source), b.resolve(self.source))),
            Some(TemporalModifier::AllVersions) => Some(TemporalQuery::AllVersions),
        }
    }

    fn pattern_copy_for(&self, source_kind: LevelSource) -> TriplePattern {
        match source_kind {
            LevelSource::Main(idx) => self.query.where_clause.patterns.as_slice()[idx],
            LevelSource::Graph(ci, pi) => self.query.where_clause.graphs.as_slice()[ci].patterns.as_slice()[pi],
            LevelSource::SubSelect(_) => TriplePattern::default(),
        }
    }

    fn init_pattern_cursor(&self, pattern: &TriplePattern, graph: Option<&Term>) -> LevelCursor<'s> {
        let prologue = &self.query.prologue;
        let subj = resolve_term_filter(&pattern.subject, self.source, prologue, &self.bindings);
        let obj = resolve_term_filter(&pattern.object, self.source, prologue, &self.bindings);
        if pattern.has_property_path() {
            let pairs = pathexec::eval_path_pairs(
                self.store,
                self.source,
                prologue,
                &pattern.path.kind,
                subj.as_deref(),
                obj.as_deref(),
                self.config.max_path_depth,
            );
            return LevelCursor::Pairs(pairs.into_iter());
        }
        let pred = resolve_term_filter(&pattern.predicate, self.source, prologue, &self.bindings);
        if let Some(g) = graph {
            let gf = resolve_term_filter(g, self.source, prologue, &self.bindings);
            LevelCursor::Store(self.store.query_graph(gf.as_deref(), subj.as_deref(), pred.as_deref(), obj.as_deref()))
        } else if let Some(t) = self.temporal_query() {
            LevelCursor::Store(self.store.query_temporal(&t, subj.as_deref(), pred.as_deref(), obj.as_deref()))
        } else {
            LevelCursor::Store(self.store.query_current(subj.as_deref(), pred.as_deref(), obj.as_deref()))
        }
    }

    fn init_cursor(&self, source_kind: LevelSource) -> LevelCursor<'s> {
        match source_kind {
            LevelSource::Main(idx) => {
                let pattern = self.query.where_clause.patterns.as_slice()[idx];
                self.init_pattern_cursor(&pattern, None)
            }
            LevelSource::Graph(ci, pi) => {
                let clause: GraphClause = self.query.where_clause.graphs.as_slice()[ci];
                let pattern = clause.patterns.as_slice()[pi];
                self.init_pattern_cursor(&pattern, Some(&clause.graph))
            }
            LevelSource::SubSelect(si) => LevelCursor::Rows(self.materialized_subselect(si).into_iter()),
        }
    }

    fn materialized_subselect(&self, si: usize) -> Vec<MaterializedRow> {
        let Some(sub) = self.query.where_clause.sub_selects[si].as_ref() else {
            return Vec::new();
        };
        let projected: Vec<u32> = match &sub.select {
            Some(sel) => sel
                .projections
                .iter()
                .filter_map(|p| match p.kind {
                    ProjectionKind::Var(span) => Some(hash_variable_name(&span.resolve(self.source)[1..])),
                    ProjectionKind::Computed { alias, .. } => Some(hash_variable_name(&alias.resolve(self.source)[1..])),
                })
                .collect(),
            None => Vec::new(),
        };
        let mut results = QueryResults::new(self.store, sub, self.source, self.config);
        let mut out = Vec::new();
        while results.move_next() {
            let row: MaterializedRow = projected
                .iter()
                .map(|&h| {
                    let v = results
                        .bindings
                        .find_binding(h)
                        .map(|idx| eval::binding_to_value(&results.bindings, idx))
                        .unwrap_or(Value::Unbound);
                    (h, v)
                })
                .collect();
            out.push(row);
        }
        out
    }

    /// Advances one join level, retrying candidates until one extends the
    /// frame consistently or the level's source is exhausted.
    fn try_advance(&mut self, level_idx: usize) -> bool {
        let source_kind = self.levels_src[level_idx];
        if self.levels[level_idx].cursor.is_none() {
            let entry = self.bindings.len();
            let cursor = self.init_cursor(source_kind);
            self.levels[level_idx] = LevelState { binding_count_at_entry: entry, cursor: Some(cursor) };
        }
        let entry = self.levels[level_idx].binding_count_at_entry;
        loop {
            self.bindings.truncate_to(entry);
            let candidate = match self.levels[level_idx].cursor.as_mut().unwrap() {
                LevelCursor::Store(e) => {
                    if e.move_next() {
                        let (s, p, o) = e.current();
                        Candidate::Triple(s.to_string(), p.to_string(), o.to_string())
                    } else {
                        Candidate::None
                    }
                }
                LevelCursor::Pairs(it) => match it.next() {
                    Some((s, o)) => Candidate::Pair(s, o),
                    None => Candidate::None,
                },
                LevelCursor::Rows(it) => match it.next() {
                    Some(row) => Candidate::Row(row),
                    None => Candidate::None,
                },
            };
            match candidate {
                Candidate::None => return false,
                Candidate::Triple(s, p, o) => {
                    let pattern = self.pattern_copy_for(source_kind);
                    if try_bind_triple(&mut self.bindings, &pattern, self.source, 0, &s, &p, &o) {
                        return true;
                    }
                }
                Candidate::Pair(s, o) => {
                    let pattern = self.pattern_copy_for(source_kind);
                    let ok_s = bind_term(&mut self.bindings, &pattern.subject, self.source, 0, &s);
                    let ok_o = bind_term(&mut self.bindings, &pattern.object, self.source, 0, &o);
                    if ok_s && ok_o {
                        return true;
                    }
                }
                Candidate::Row(row) => {
                    let mut ok = true;
                    for (h, v) in &row {
                        if !bind_value_checked(&mut self.bindings, *h, v, 0) {
                            ok = false;
                            break;
                        }
                    }
                    if ok {
                        return true;
                    }
                }
            }
        }
    }

    fn advance_within_branch(&mut self) -> bool {
        if self.levels_src.is_empty() {
            return false;
        }
        loop {
            if self.try_advance(self.current_level) {
                if self.current_level + 1 == self.levels_src.len() {
                    return true;
                }
                self.current_level += 1;
                self.levels[self.current_level] = LevelState::default();
            } else if self.current_level == 0 {
                return false;
            } else {
                self.current_level -= 1;
            }
        }
    }

    /// Drives the main join, switching to the `UNION`'s right branch once
    /// the left branch is exhausted.
    fn advance_join(&mut self) -> bool {
        loop {
            if self.advance_within_branch() {
                return true;
            }
            if self.branch == Branch::Left && self.query.where_clause.has_union() {
                tracing::debug!("left UNION branch exhausted, switching to right branch");
                self.branch = Branch::Right;
                self.levels_src = build_levels(&self.query.where_clause, Branch::Right);
                self.levels = (0..self.levels_src.len()).map(|_| LevelState::default()).collect();
                self.current_level = 0;
                continue;
            }
            return false;
        }
    }

    fn apply_optionals(&mut self) {
        let indices = optional_indices(&self.query.where_clause, self.branch);
        for i in indices {
            let pattern = self.query.where_clause.patterns.as_slice()[i];
            let prologue = &self.query.prologue;
            let subj = resolve_term_filter(&pattern.subject, self.source, prologue, &self.bindings);
            let obj = resolve_term_filter(&pattern.object, self.source, prologue, &self.bindings);
            if pattern.has_property_path() {
                let pairs = pathexec::eval_path_pairs(
                    self.store,
                    self.source,
                    prologue,
                    &pattern.path.kind,
                    subj.as_deref(),
                    obj.as_deref(),
                    self.config.max_path_depth,
                );
                if let Some((s, o)) = pairs.into_iter().next() {
                    bind_term(&mut self.bindings, &pattern.subject, self.source, 0, &s);
                    bind_term(&mut self.bindings, &pattern.object, self.source, 0, &o);
                }
            } else {
                let pred = resolve_term_filter(&pattern.predicate, self.source, prologue, &self.bindings);
                let mut it = self.store.query_current(subj.as_deref(), pred.as_deref(), obj.as_deref());
                if it.move_next() {
                    let (s, p, o) = it.current();
                    let (s, p, o) = (s.to_string(), p.to_string(), o.to_string());
                    try_bind_triple(&mut self.bindings, &pattern, self.source, 0, &s, &p, &o);
                }
            }
        }
    }

    fn apply_binds(&mut self) {
        for b in self.query.where_clause.binds.iter() {
            let value = evaluate_bind(b.expr, self.source, &self.bindings);
            let hash = hash_variable_name(&b.var.resolve(self.source)[1..]);
            eval::bind_value(&mut self.bindings, hash, &value, 0);
        }
    }

    fn filters_pass(&self) -> bool {
        let tester = StoreExistsTester { store: self.store, prologue: &self.query.prologue, bindings: &self.bindings, config: &self.config };
        self.query
            .where_clause
            .filters
            .iter()
            .all(|f| evaluate_filter(f.expr, self.source, &self.bindings, &self.config, &tester))
    }

    /// A block hides the row iff its anti-join patterns match the current
    /// frame *and* (when present) its own `FILTER`/`FILTER [NOT] EXISTS`
    /// holds against that match — the filter narrows which minus-side
    /// solutions count, it does not apply to the outer row.
    fn minus_hides_row(&self) -> bool {
        self.query.where_clause.minus_blocks.iter().any(|block| {
            let patterns = &self.query.where_clause.patterns.as_slice()[block.start as usize..block.end as usize];
            let filter = block.filter.map(|f| f.expr);
            block_matches(self.store, &self.query.prologue, self.source, patterns, &self.bindings, &self.config, filter)
        })
    }

    fn values_permit(&self, values: &Values) -> bool {
        let any_bound = values
            .vars
            .iter()
            .any(|v| self.bindings.find_binding(hash_variable_name(&v.resolve(self.source)[1..])).is_some());
        if !any_bound {
            return true;
        }
        values.rows.iter().any(|row| {
            values.vars.iter().enumerate().all(|(j, v)| {
                let col = row.get(j);
                let Some(span) = col else { return true };
                if span.is_undef() {
                    return true;
                }
                let hash = hash_variable_name(&v.resolve(self.source)[1..]);
                match self.bindings.find_binding(hash) {
                    None => true,
                    Some(idx) => self.bindings.lexical_at(idx) == span.resolve(self.source),
                }
            })
        })
    }

    fn values_pass(&self) -> bool {
        let inline_ok = match &self.query.where_clause.values {
            Some(values) => self.values_permit(values),
            None => true,
        };
        let trailing_ok = match &self.query.trailing_values {
            Some(values) => self.values_permit(values),
            None => true,
        };
        inline_ok && trailing_ok
    }

    /// Produces the next fully-joined, filtered row, applying `OPTIONAL`,
    /// `BIND`, `FILTER`, `MINUS` and `VALUES` in that order. Returns `false` once the join is exhausted.
    fn produce_next_row(&mut self) -> bool {
        loop {
            if !self.advance_join() {
                return false;
            }
            self.apply_optionals();
            self.apply_binds();
            if !self.filters_pass() {
                continue;
            }
            if self.minus_hides_row() {
                continue;
            }
            if !self.values_pass() {
                continue;
            }
            return true;
        }
    }

    fn distinct_active(&self) -> bool {
        self.query.select.map(|s| s.distinct).unwrap_or(false)
    }

    fn sort_rows(&mut self) {
        let conds: Vec<OrderCondition> = self.query.solution_modifier.order_by.iter().copied().collect();
        let source = self.source;
        self.sorted_rows.sort_by(|a, b| {
            for c in &conds {
                let hash = hash_variable_name(&c.var.resolve(source)[1..]);
                let av = a.iter().find(|(h, _)| *h == hash).map(|(_, v)| v.clone()).unwrap_or(Value::Unbound);
                let bv = b.iter().find(|(h, _)| *h == hash).map(|(_, v)| v.clone()).unwrap_or(Value::Unbound);
                let ord = compare_values_for_order(&av, &bv);
                let ord = if c.descending { ord.reverse() } else { ord };
                if ord != std::cmp::Ordering::Equal {
                    return ord;
                }
            }
            std::cmp::Ordering::Equal
        });
    }

    /// Eagerly drains the unordered stream (no `LIMIT`/`OFFSET` applied)
    /// and sorts the result before streaming resumes.
    fn collect_all(&mut self) {
        loop {
            if !self.produce_next_row() {
                break;
            }
            if self.distinct_active() {
                let h = self.bindings.distinct_hash();
                if !self.seen.insert(h) {
                    continue;
                }
            }
            let row: MaterializedRow =
                (0..self.bindings.len()).map(|i| (self.bindings.binding_at(i).variable_hash, eval::binding_to_value(&self.bindings, i))).collect();
            self.sorted_rows.push(row);
        }
        self.sort_rows();
    }

    /// Advances to the next solution. Returns `false` once the result set
    /// is exhausted; `current`/`get` are only meaningful after this
    /// returns `true`.
    pub fn move_next(&mut self) -> bool {
        match self.state {
            State::Done | State::Empty => false,
            State::Streaming => loop {
                if let Some(limit) = self.limit {
                    if self.returned >= limit {
                        self.state = State::Done;
                        return false;
                    }
                }
                if !self.produce_next_row() {
                    self.state = State::Done;
                    return false;
                }
                if self.distinct_active() {
                    let h = self.bindings.distinct_hash();
                    if !self.seen.insert(h) {
                        continue;
                    }
                }
                if self.offset_remaining > 0 {
                    self.offset_remaining -= 1;
                    continue;
                }
                self.returned += 1;
                return true;
            },
            State::Collecting => {
                self.collect_all();
                self.state = State::SortedStreaming;
                self.move_next()
            }
            State::SortedStreaming => loop {
                if let Some(limit) = self.limit {
                    if self.returned >= limit {
                        self.state = State::Done;
                        return false;
                    }
                }
                if self.sorted_pos >= self.sorted_rows.len() {
                    self.state = State::Done;
                    return false;
                }
                self.sorted_pos += 1;
                if self.offset_remaining > 0 {
                    self.offset_remaining -= 1;
                    continue;
                }
                self.returned += 1;
                return true;
            },
        }
    }

    /// The current solution row, as either a live binding frame or a
    /// materialized (post-`ORDER BY`) row.
    pub fn current(&self) -> CurrentRow<'_> {
        if self.state == State::SortedStreaming && self.sorted_pos > 0 {
            CurrentRow::Materialized(&self.sorted_rows[self.sorted_pos - 1])
        } else {
            CurrentRow::Live(&self.bindings)
        }
    }

    /// Shorthand for `self.current().get(name)`.
    pub fn get(&self, name: &str) -> Value {
        self.current().get(name)
    }

    /// Releases the underlying store cursors. Dropping `self` does the
    /// same; kept as an explicit call for symmetry with `TripleEnumerator::dispose`.
    pub fn dispose(mut self) {
        for level in &mut self.levels {
            if let Some(LevelCursor::Store(e)) = &mut level.cursor {
                e.dispose();
            }
        }
    }
}

/// Entry point: `execute(store, query) -> QueryResults`.
pub fn execute<'q, 's>(store: &'s dyn TripleSource, query: &'q Query, source: &'q str, config: ExecutorConfig) -> QueryResults<'q, 's> {
    QueryResults::new(store, query, source, config)
}

/// `ASK` evaluation: true iff the pattern has at least one solution.
pub fn execute_ask(store: &dyn TripleSource, query: &Query, source: &str, config: ExecutorConfig) -> bool {
    let mut results = QueryResults::new(store, query, source, config);
    results.move_next()
}

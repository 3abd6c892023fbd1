//! Bridges `storage::QuadStore` to `sparql::TripleSource` for integration
//! tests, so the join engine is exercised against the real indexed backend
//! rather than the in-memory fixture used by `executor.rs`'s unit tests.

use rdf_model::{Dictionary, Node};
use sparql::{ExecutorConfig, Query, QueryResults, TripleEnumerator, TripleSource};
use storage::{InMemoryBackend, NodePattern, QuadPattern, QuadStore};

/// Parses one SPARQL lexical token (`<iri>`, `"str"`, `"str"@lang`,
/// `"str"^^<dt>`, `_:bN`) into an interned `Node`. Integers/booleans show
/// up as plain literals here since the fixture stores them that way.
fn parse_lexical(dict: &Dictionary, text: &str) -> Node<'static> {
    if let Some(iri) = text.strip_prefix('<').and_then(|rest| rest.strip_suffix('>')) {
        return Node::iri(dict.intern(iri));
    }
    if let Some(rest) = text.strip_prefix("_:b") {
        let id: u64 = rest.parse().unwrap_or(0);
        return Node::blank(id);
    }
    if let Some(rest) = text.strip_prefix('"') {
        if let Some(at) = rest.rfind("\"@") {
            let (lexical, lang) = rest.split_at(at);
            return Node::literal_lang(dict.intern(lexical), dict.intern(&lang[2..]));
        }
        if let Some(dt_at) = rest.rfind("\"^^<") {
            let (lexical, dt) = rest.split_at(dt_at);
            let dt = dt.trim_start_matches("\"^^<").trim_end_matches('>');
            return Node::literal_typed(dict.intern(lexical), dict.intern(dt));
        }
        let lexical = rest.strip_suffix('"').unwrap_or(rest);
        return Node::literal_str(dict.intern(lexical));
    }
    Node::iri(dict.intern(text))
}

fn node_pattern<'a>(dict: &Dictionary, text: Option<&str>) -> NodePattern<'a> {
    match text {
        Some(t) => NodePattern::Concrete(parse_lexical(dict, t)),
        None => NodePattern::Any,
    }
}

struct VecEnumerator {
    rows: Vec<(String, String, String)>,
    idx: usize,
}

impl TripleEnumerator for VecEnumerator {
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

/// Read-only `TripleSource` view over an in-memory `QuadStore`. Graph and
/// temporal dimensions are not modeled by this backend, so
/// `query_graph`/`query_temporal` fall back to the trait's default
/// `query_current` delegation.
pub struct StoreAdapter {
    store: QuadStore<InMemoryBackend>,
}

impl StoreAdapter {
    pub fn new() -> Self {
        StoreAdapter { store: QuadStore::new_in_memory() }
    }

    /// Inserts one triple given as SPARQL lexical text, matching the form
    /// the executor itself passes across the `TripleSource` boundary.
    pub fn insert_lexical(&mut self, subject: &str, predicate: &str, object: &str) {
        let dict = self.store.dictionary().clone();
        let quad = rdf_model::Quad::new(
            parse_lexical(&dict, subject),
            parse_lexical(&dict, predicate),
            parse_lexical(&dict, object),
            None,
        );
        self.store.insert(quad).expect("insert into in-memory backend cannot fail");
    }
}

impl Default for StoreAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl TripleSource for StoreAdapter {
    fn query_current<'s>(
        &'s self,
        subject: Option<&str>,
        predicate: Option<&str>,
        object: Option<&str>,
    ) -> Box<dyn TripleEnumerator + 's> {
        let dict = self.store.dictionary().clone();
        let pattern = QuadPattern::new(
            node_pattern(&dict, subject),
            node_pattern(&dict, predicate),
            node_pattern(&dict, object),
            NodePattern::Any,
        );
        let rows = self
            .store
            .find(&pattern)
            .map(|quad| (quad.subject.to_string(), quad.predicate.to_string(), quad.object.to_string()))
            .collect();
        Box::new(VecEnumerator { rows, idx: 0 })
    }
}

/// Builds the five-triple fixture store: `<a> <p> "1"`, `<b> <p> "2"`,
/// `<c> <p> "3"`, `<a> <q> <b>`, `<b> <q> <c>`.
pub fn fixture_store() -> StoreAdapter {
    let mut store = StoreAdapter::new();
    store.insert_lexical("<a>", "<p>", "\"1\"");
    store.insert_lexical("<b>", "<p>", "\"2\"");
    store.insert_lexical("<c>", "<p>", "\"3\"");
    store.insert_lexical("<a>", "<q>", "<b>");
    store.insert_lexical("<b>", "<q>", "<c>");
    store
}

/// Parses and fully drains a SELECT/ASK-style query into owned rows, one
/// `Vec<(String, String)>` of `(variable, lexical value)` per solution.
pub fn run_select(store: &StoreAdapter, text: &str, vars: &[&str]) -> Vec<Vec<(String, String)>> {
    let query: Query = sparql::parse_query(text).expect("valid test query");
    let mut results = QueryResults::new(store, &query, text, ExecutorConfig::default());
    let mut rows = Vec::new();
    while results.move_next() {
        let row = vars
            .iter()
            .map(|name| (name.to_string(), sparql::eval::value_string_content(&results.get(name))))
            .collect();
        rows.push(row);
    }
    rows
}

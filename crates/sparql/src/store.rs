//! The single collaborator interface the executor consumes. Boxed-dyn,
//! matching a `Box<dyn Iterator<Item = _> + 'a>` idiom rather than GATs.
//!
//! Terms cross this boundary as plain `&str` SPARQL lexical text
//! (`<iri>`, `"literal"`, `_:b0`, …) rather than as AST `Term`s — the
//! store has no notion of source spans.

/// One matching triple, plus the ability to advance or release the scan.
/// Implementors must keep the spans returned by `current` valid until
/// the next call to `move_next` or until `dispose` runs.
pub trait TripleEnumerator {
    fn move_next(&mut self) -> bool;
    fn current(&self) -> (&str, &str, &str);

    /// Releases any resources the enumerator holds. The default no-op is
    /// correct for in-memory enumerators; a `dispose` pulled in from the
    /// reference design mostly matters for store-side cursors that pin a
    /// snapshot or a file handle.
    fn dispose(&mut self) {}
}

/// A resolved bound on a temporal clause (`AS OF`/`DURING`/`ALL
/// VERSIONS`) — the executor has already turned the AST's term spans
/// into plain text by the time it calls the store.
#[derive(Debug, Clone, Copy)]
pub enum TemporalQuery<'q> {
    AsOf(&'q str),
    During(&'q str, &'q str),
    AllVersions,
}

/// `queryCurrent(subject, predicate, object) → TripleEnumerator`
///. `None` in any position means wildcard; `Some(text)`
/// restricts the store to triples whose corresponding term equals that
/// text exactly.
///
/// The two extra methods expose the GRAPH-clause and temporal query
/// variants; both default to ignoring the extra dimension and falling
/// back to `query_current`, so a store with no notion of named graphs
/// or bitemporal versions only has to implement the base method.
pub trait TripleSource {
    fn query_current<'s>(
        &'s self,
        subject: Option<&str>,
        predicate: Option<&str>,
        object: Option<&str>,
    ) -> Box<dyn TripleEnumerator + 's>;

    fn query_graph<'s>(
        &'s self,
        graph: Option<&str>,
        subject: Option<&str>,
        predicate: Option<&str>,
        object: Option<&str>,
    ) -> Box<dyn TripleEnumerator + 's> {
        let _ = graph;
        self.query_current(subject, predicate, object)
    }

    fn query_temporal<'s>(
        &'s self,
        temporal: &TemporalQuery<'_>,
        subject: Option<&str>,
        predicate: Option<&str>,
        object: Option<&str>,
    ) -> Box<dyn TripleEnumerator + 's> {
        let _ = temporal;
        self.query_current(subject, predicate, object)
    }
}

/// Executor tunables: no hidden magic numbers,
/// just `Default` plus explicit override at `execute`/`execute_ask`
/// call sites.
#[derive(Debug, Clone, Copy)]
pub struct ExecutorConfig {
    /// `REGEX`/`REPLACE` pattern-compile timeout.
    pub regex_timeout_ms: u64,
    /// Advisory join-engine level budget. The engine itself sizes its
    /// level stack to whatever the parsed pattern actually needs rather
    /// than capping at this value; callers that want to reject
    /// pathologically wide queries before executing them can compare a
    /// query's pattern count against it themselves.
    pub join_levels: usize,
    /// Cycle-detection / BFS-frontier cap for property-path transitive
    /// closure.
    pub max_path_depth: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        ExecutorConfig { regex_timeout_ms: 100, join_levels: 4, max_path_depth: 64 }
    }
}

//! The AST produced by the query parser.
//!
//! Every node is either `Copy` (fixed-size, stack resident) or, for the
//! handful of genuinely recursive shapes (sub-selects), a boxed child.
//! Every fan-out below is capacity-bounded; exceeding any of them is a
//! `ParseError::CapacityExceeded`, never silent truncation.

use crate::path::PropertyPath;
use crate::span::Span;
use crate::term::Term;

pub const MAX_TRIPLE_PATTERNS: usize = 32;
pub const MAX_MINUS_BLOCKS: usize = 4;
pub const MAX_FILTERS: usize = 16;
pub const MAX_BINDS: usize = 16;
pub const MAX_VALUES_VARS: usize = 4;
pub const MAX_VALUES_ROWS: usize = 16;
pub const MAX_GRAPH_CLAUSES: usize = 8;
pub const MAX_SERVICE_CLAUSES: usize = 8;
pub const MAX_CLAUSE_PATTERNS: usize = 8;
pub const MAX_SUBSELECTS: usize = 2;
pub const MAX_PREFIXES: usize = 32;
pub const MAX_DATASETS: usize = 8;
pub const MAX_PROJECTIONS: usize = 16;
pub const MAX_ORDER_BY: usize = 4;
pub const MAX_GROUP_BY: usize = 8;
pub const MAX_DESCRIBE_TARGETS: usize = 16;

use crate::fixed::FixedVec;

/// `{Subject, Predicate, Object, Path}`. `path.is_present()`
/// iff the predicate position held a property-path expression rather than
/// a plain IRI; in that case `predicate` is still the path's simple IRI
/// head, kept for storage lookups that ignore path semantics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TriplePattern {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
    pub path: PropertyPath,
}

impl TriplePattern {
    pub fn has_property_path(&self) -> bool {
        self.path.is_present()
    }
}

/// A `FILTER` reference: the expression body's span plus the brace-nesting
/// depth it was captured at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterExpr {
    pub expr: Span,
    pub scope_depth: u32,
}

/// A `BIND (expr AS ?var)` reference. `after_pattern_index` is the number
/// of triple patterns that must already have matched before the bound
/// variable becomes visible to later patterns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BindExpr {
    pub expr: Span,
    pub var: Span,
    pub after_pattern_index: u32,
}

/// One row of a `VALUES` block. Columns beyond the clause's variable count
/// are `Span::UNDEF`; a present-but-`UNDEF` value is also `Span::UNDEF`.
pub type ValuesRow = FixedVec<Span, MAX_VALUES_VARS>;

#[derive(Debug, Clone, Copy, Default)]
pub struct Values {
    pub vars: FixedVec<Span, MAX_VALUES_VARS>,
    pub rows: FixedVec<ValuesRow, MAX_VALUES_ROWS>,
}

/// `GRAPH term { … }`. The child pattern list is flat — its own pattern
/// list, not a recursive `GraphPattern`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphClause {
    pub graph: Term,
    pub patterns: FixedVec<TriplePattern, MAX_CLAUSE_PATTERNS>,
}

/// `SERVICE [SILENT] term { … }`. Recorded, never dispatched.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServiceClause {
    pub silent: bool,
    pub endpoint: Term,
    pub union_branch: bool,
    pub is_optional: bool,
    pub patterns: FixedVec<TriplePattern, MAX_CLAUSE_PATTERNS>,
}

/// One `MINUS { … }` anti-join group: `[start, end)` into the parent
/// `GraphPattern`'s pattern list, plus an optional per-block `FILTER`.
/// A `FILTER [NOT] EXISTS { … }` inside the block is captured the same
/// way a plain `FILTER` is — `capture_constraint_expr` folds both into
/// one expression span the evaluator re-parses uniformly — rather than
/// as a distinct AST shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinusBlock {
    pub start: u32,
    pub end: u32,
    pub filter: Option<FilterExpr>,
}

/// The `WHERE`-clause algebra. One per `Query` or
/// sub-select; immutable once parsed.
#[derive(Debug, Default)]
pub struct GraphPattern {
    pub patterns: FixedVec<TriplePattern, MAX_TRIPLE_PATTERNS>,
    /// Bit `i` set means `patterns[i]` came from an `OPTIONAL { … }` block.
    pub optional_mask: u32,
    /// `Some(k)`: entries `[0, k)` are the `UNION`'s left branch and
    /// `[k, patterns.len())` are its right branch.
    pub union_start: Option<u32>,
    pub minus_blocks: FixedVec<MinusBlock, MAX_MINUS_BLOCKS>,
    pub filters: FixedVec<FilterExpr, MAX_FILTERS>,
    pub binds: FixedVec<BindExpr, MAX_BINDS>,
    pub values: Option<Values>,
    pub graphs: FixedVec<GraphClause, MAX_GRAPH_CLAUSES>,
    pub services: FixedVec<ServiceClause, MAX_SERVICE_CLAUSES>,
    pub sub_selects: [Option<Box<Query>>; MAX_SUBSELECTS],
}

impl GraphPattern {
    pub fn has_union(&self) -> bool {
        self.union_start.is_some()
    }

    pub fn is_optional(&self, pattern_index: usize) -> bool {
        pattern_index < 32 && (self.optional_mask & (1 << pattern_index)) != 0
    }

    pub fn mark_optional(&mut self, pattern_index: usize) {
        if pattern_index < 32 {
            self.optional_mask |= 1 << pattern_index;
        }
    }

    /// Number of non-optional patterns in the first (or only) branch —
    /// the join engine's `requiredCount`.
    pub fn required_count(&self) -> usize {
        let branch_end = self.union_start.unwrap_or(self.patterns.len() as u32) as usize;
        (0..branch_end).filter(|&i| !self.is_optional(i)).count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AggregateKind {
    #[default]
    None,
    Count,
    CountDistinct,
    Sum,
    Avg,
    Min,
    Max,
    GroupConcat,
    Sample,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionKind {
    Var(Span),
    Computed { expr: Span, alias: Span, aggregate: AggregateKind },
}

impl Default for ProjectionKind {
    fn default() -> Self {
        ProjectionKind::Var(Span::EMPTY)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Projection {
    pub kind: ProjectionKind,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SelectClause {
    pub distinct: bool,
    pub reduced: bool,
    pub select_all: bool,
    pub projections: FixedVec<Projection, MAX_PROJECTIONS>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OrderCondition {
    pub var: Span,
    pub descending: bool,
}

/// `AS OF`/`DURING`/`ALL VERSIONS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalModifier {
    AsOf(Span),
    During(Span, Span),
    AllVersions,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SolutionModifier {
    pub group_by: FixedVec<Projection, MAX_GROUP_BY>,
    pub having: Option<Span>,
    pub order_by: FixedVec<OrderCondition, MAX_ORDER_BY>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub temporal: Option<TemporalModifier>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PrefixDecl {
    pub prefix: Span,
    pub iri: Span,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Prologue {
    pub base: Option<Span>,
    pub prefixes: FixedVec<PrefixDecl, MAX_PREFIXES>,
}

impl Prologue {
    /// Resolve a `prefix:local` span against the declared prefixes.
    /// Returns `None` for an undeclared prefix — the caller passes the
    /// name through bracketed as-is rather than hard-failing.
    pub fn resolve_prefix<'a>(&self, source: &'a str, prefix: &str) -> Option<&'a str> {
        self.prefixes
            .iter()
            .find(|decl| decl.prefix.resolve(source) == prefix)
            .map(|decl| decl.iri.resolve(source))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DatasetClause {
    pub graph: Span,
    pub named: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    Select,
    Construct,
    Ask,
    Describe,
}

/// One parsed `SELECT`/`CONSTRUCT`/`ASK`/`DESCRIBE` query.
#[derive(Debug)]
pub struct Query {
    pub query_type: QueryType,
    pub prologue: Prologue,
    pub select: Option<SelectClause>,
    pub construct_template: FixedVec<TriplePattern, MAX_TRIPLE_PATTERNS>,
    pub describe_targets: FixedVec<Term, MAX_DESCRIBE_TARGETS>,
    pub describe_all: bool,
    pub datasets: FixedVec<DatasetClause, MAX_DATASETS>,
    pub where_clause: GraphPattern,
    pub solution_modifier: SolutionModifier,
    pub trailing_values: Option<Values>,
}

impl Query {
    pub fn new(query_type: QueryType) -> Self {
        Query {
            query_type,
            prologue: Prologue::default(),
            select: None,
            construct_template: FixedVec::new(),
            describe_targets: FixedVec::new(),
            describe_all: false,
            datasets: FixedVec::new(),
            where_clause: GraphPattern::default(),
            solution_modifier: SolutionModifier::default(),
            trailing_values: None,
        }
    }
}

/// Update-operation shapes.
pub mod update {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum GraphTarget {
        Default,
        Named(Term),
        All,
    }

    #[derive(Debug)]
    pub enum UpdateOperation {
        InsertData { quads: FixedVec<TriplePattern, MAX_TRIPLE_PATTERNS> },
        DeleteData { quads: FixedVec<TriplePattern, MAX_TRIPLE_PATTERNS> },
        DeleteInsert {
            delete: FixedVec<TriplePattern, MAX_TRIPLE_PATTERNS>,
            insert: FixedVec<TriplePattern, MAX_TRIPLE_PATTERNS>,
            pattern: GraphPattern,
        },
        Load { source: Span, into: Option<Term> },
        Clear { target: GraphTarget, silent: bool },
        Create { graph: Term, silent: bool },
        Drop { target: GraphTarget, silent: bool },
    }

    #[derive(Debug)]
    pub struct Update {
        pub prologue: Prologue,
        pub operations: Vec<UpdateOperation>,
    }
}

pub use update::{GraphTarget, Update, UpdateOperation};

//! SPARQL 1.1 query engine: a hand-written recursive-descent parser plus a
//! pull-based join engine over a minimal `TripleSource` collaborator.
//!
//! This crate has no storage of its own — the `storage` crate (or any other
//! `TripleSource` implementor) owns the data; this crate owns parsing
//! `SELECT`/`CONSTRUCT`/`ASK`/`DESCRIBE` queries into a fixed-capacity,
//! span-based AST (`ast`) and evaluating that AST against a store
//! (`executor`) one solution at a time.
//!
//! # Layout
//! - [`ast`] — the parsed query tree; every node is `Copy` except the
//!   boxed sub-select recursion.
//! - [`parser`] — the recursive-descent parser, one module per grammar
//!   layer (`term`, `path`, `pattern`, `query`).
//! - [`eval`] — the `FILTER`/`BIND` expression evaluator.
//! - [`pathexec`] — property-path transitive-closure walker.
//! - [`executor`] — the join engine: `execute`/`execute_ask` plus the
//!   `QueryResults` iterator.
//! - [`bindings`] — the append-only binding table rows flow through.
//! - [`store`] — the `TripleSource`/`TripleEnumerator` contract a backend
//!   implements to be queryable.
//!
//! SPARQL Update (`INSERT DATA`, `DELETE`, `LOAD`, …) is parsed (see
//! `ast::update`) but never executed here — update execution is store-side.

#![warn(missing_docs, rust_2018_idioms)]

pub mod ast;
pub mod bindings;
pub mod cursor;
pub mod error;
pub mod eval;
pub mod executor;
pub mod fixed;
pub mod parser;
pub mod path;
pub mod pathexec;
pub mod resolve;
pub mod span;
pub mod store;
pub mod term;

pub use ast::{GraphPattern, GraphTarget, Prologue, Query, QueryType, SolutionModifier, TriplePattern, Update, UpdateOperation};
pub use error::{ParseError, ParseResult};
pub use executor::{execute, execute_ask, CurrentRow, QueryResults};
pub use parser::query::parse_query;
pub use parser::update::parse_update;
pub use store::{ExecutorConfig, TemporalQuery, TripleEnumerator, TripleSource};

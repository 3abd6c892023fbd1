//! In-memory storage backend for RDF quad stores
//!
//! This crate provides a trait-based abstraction over storage backends and one
//! concrete in-memory implementation, used to exercise the `sparql` crate's
//! executor in tests. Persistent backends are out of scope here — physical
//! storage (B+Tree, mmap, WAL, on-disk atom interning) is the underlying
//! triple store's concern, not the query core's.
//!
//! # Design Principles
//!
//! 1. **Storage Trait**: Abstract interface so the quad store is backend-agnostic
//! 2. **Quad Indexes**: SPOC, POCS, OCSP, CSPO for optimal query patterns
//! 3. **Zero-Copy**: Minimize allocations in hot paths
//!
//! # Example
//!
//! ```rust
//! use storage::{QuadStore, QuadPattern};
//! use rdf_model::{Node, Quad};
//!
//! let mut store = QuadStore::new_in_memory();
//! let dict = store.dictionary().clone();
//!
//! let subject = Node::iri(dict.intern("http://example.org/s"));
//! let predicate = Node::iri(dict.intern("http://example.org/p"));
//! let object = Node::literal_str(dict.intern("value"));
//! let quad = Quad::new(subject, predicate, object, None);
//!
//! store.insert(quad).unwrap();
//!
//! let results: Vec<_> = store.find(&QuadPattern::default()).collect();
//! assert_eq!(results.len(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod backend;
mod indexes;
mod inmemory;
mod observability;
mod pattern;
mod quad_store;

pub use backend::{StorageBackend, StorageError, StorageResult, StorageStats};
pub use indexes::{Index, IndexType, QuadIndex};
pub use inmemory::InMemoryBackend;
pub use observability::{
    track_operation, record_error, track_batch, record_throughput,
    OperationType, HealthStatus, PerformanceMetrics,
};
pub use pattern::{NodePattern, QuadPattern};
pub use quad_store::QuadStore;

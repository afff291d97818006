//! # Termwalk
//!
//! Rule-based query tree rewriting with minimum-frequency and exact-token
//! matching, in the style of a Lucene query layer.
//!
//! ## Features
//!
//! - Chain-of-responsibility query traversal with pluggable handlers
//! - Minimum term frequency filtering for term and span queries
//! - Exact (payload-free) token matching through span queries
//! - Deferred traversal of range queries until they are bound to an index
//! - BM25 scoring, top-k search and score explanations
//! - An in-memory segmented index for tests and embedding

pub mod config;
pub mod error;
pub mod index;
pub mod mapping;
pub mod query;
pub mod traversal;

pub mod prelude {
    pub use crate::config::{ChainConfig, MarkContextRegistry, SearchSettings};
    pub use crate::error::{Result, TermwalkError};
    pub use crate::index::memory::{MemoryIndex, MemoryIndexBuilder};
    pub use crate::mapping::{FieldKind, Mapping, SearchExecutionContext};
    pub use crate::query::{IndexSearcher, Query};
    pub use crate::traversal::{QueryHandler, QueryTraverser, TraverserContext};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Rule-based rewriting of query trees.
//!
//! A [`QueryTraverser`] walks a query tree and offers every node to an ordered
//! chain of [`QueryHandler`]s. The built-in handlers in [`handlers`] turn
//! terms into their exact or minimum-frequency forms, mark terms for later
//! passes, and defer range queries until they can be expanded.
//!
//! ```
//! use std::sync::Arc;
//!
//! use termwalk::mapping::{FieldKind, Mapping, SearchExecutionContext};
//! use termwalk::config::SearchSettings;
//! use termwalk::query::Query;
//! use termwalk::traversal::{ExactTermQueryHandler, QueryTraverser, TraverserContext};
//!
//! let mapping = Mapping::new().with_field("body", FieldKind::Text);
//! let ctx = SearchExecutionContext::new(Arc::new(mapping), SearchSettings::default());
//! let traverser = QueryTraverser::new(vec![Arc::new(ExactTermQueryHandler::new())]);
//!
//! let exact = traverser
//!     .traverse(&TraverserContext::new(), &ctx, &Query::term("body", "fox"))
//!     .unwrap();
//! assert_eq!(exact.to_string(), "SpanEmptyPayloadCheck(body:fox)");
//! ```

pub mod booster;
pub mod context;
pub mod handler;
pub mod handlers;
pub mod traverser;

pub use booster::boost_exact;
pub use context::TraverserContext;
pub use handler::QueryHandler;
pub use handlers::{
    CloneOnChangeBoostQueryHandler, ExactMarkedTermQueryHandler,
    ExactMinFrequencyPrefixQueryHandler, ExactMinFrequencyTermQueryHandler,
    ExactMultiTermQueryHandler, ExactTermQueryHandler, LazyRangeQueryHandler,
    MarkTermQueryHandler, TransformTermQueryToMinFrequencyTermQueryHandler,
};
pub use traverser::QueryTraverser;

//! Query tree, weights and execution.

pub mod boolean;
pub mod boost;
pub mod collector;
pub mod explanation;
pub mod lazy;
pub mod marked;
pub mod matcher;
pub mod min_frequency;
pub mod multi_term;
pub mod node;
pub mod scorer;
pub mod searcher;
pub mod span;
pub mod spans;
pub mod term;
pub mod weight;

pub use boolean::{BooleanClause, BooleanQuery, Occur};
pub use boost::BoostQuery;
pub use collector::{ScoreDoc, TopDocs};
pub use explanation::Explanation;
pub use lazy::LazyTraverserQuery;
pub use marked::{MarkContext, MarkedTermQuery};
pub use min_frequency::{MinFrequencySpanTermQuery, MinFrequencyTermQuery};
pub use multi_term::{MultiTermKind, MultiTermQuery};
pub use node::Query;
pub use searcher::IndexSearcher;
pub use span::{
    SpanEmptyPayloadCheckQuery, SpanMinFrequencyFilterQuery, SpanMultiTermQuery, SpanNearQuery,
    SpanOrQuery, SpanTermQuery,
};
pub use term::TermQuery;
pub use weight::ScoreMode;

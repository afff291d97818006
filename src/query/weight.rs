//! Weights: queries bound to a searcher, ready to produce per-segment matchers.

use std::collections::BTreeSet;
use std::fmt::Debug;
use std::sync::Arc;

use ahash::AHashMap;

use crate::error::Result;
use crate::index::posting::PostingFlags;
use crate::index::reader::SegmentReader;
use crate::index::term::Term;
use crate::index::term_states::TermStates;
use crate::query::explanation::Explanation;
use crate::query::matcher::Matcher;
use crate::query::node::Query;
use crate::query::spans::Spans;

/// Whether the caller needs scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreMode {
    /// Matching documents and their scores.
    Complete,
    /// Matching documents only.
    CompleteNoScores,
}

impl ScoreMode {
    /// Whether scores are needed.
    pub fn needs_scores(self) -> bool {
        self == ScoreMode::Complete
    }
}

/// A query bound to one index snapshot.
///
/// Weights are built once per search and shared across segments (and threads).
pub trait Weight: Send + Sync + Debug {
    /// The query this weight was created from.
    fn query(&self) -> &Arc<Query>;

    /// A positioned matcher for `segment`, `None` when nothing can match there.
    fn matcher(&self, segment: &dyn SegmentReader) -> Result<Option<Box<dyn Matcher>>>;

    /// Explain the score of a segment-local document.
    fn explain(&self, segment: &dyn SegmentReader, doc: u64) -> Result<Explanation>;

    /// Whether per-segment results can be cached.
    fn is_cacheable(&self, _segment: &dyn SegmentReader) -> bool {
        true
    }

    /// Add the terms this weight matches on.
    fn extract_terms(&self, terms: &mut BTreeSet<Term>);
}

/// A positional query bound to one index snapshot.
pub trait SpanWeight: Send + Sync + Debug {
    /// The query this weight was created from.
    fn query(&self) -> &Arc<Query>;

    /// The field all spans come from.
    fn field(&self) -> &str;

    /// An unpositioned span cursor for `segment`, `None` when nothing can match there.
    fn spans(&self, segment: &dyn SegmentReader, flags: PostingFlags) -> Result<Option<Box<dyn Spans>>>;

    /// Add the term states this weight matches on.
    fn extract_term_states(&self, states: &mut AHashMap<Term, Arc<TermStates>>);
}

/// Weight of a query that matches nothing.
#[derive(Debug)]
pub struct MatchNoneWeight {
    query: Arc<Query>,
}

impl MatchNoneWeight {
    /// Create a new weight.
    pub fn new(query: Arc<Query>) -> Self {
        MatchNoneWeight { query }
    }
}

impl Weight for MatchNoneWeight {
    fn query(&self) -> &Arc<Query> {
        &self.query
    }

    fn matcher(&self, _segment: &dyn SegmentReader) -> Result<Option<Box<dyn Matcher>>> {
        Ok(None)
    }

    fn explain(&self, _segment: &dyn SegmentReader, _doc: u64) -> Result<Explanation> {
        Ok(Explanation::no_match(self.query.to_string()))
    }

    fn extract_terms(&self, _terms: &mut BTreeSet<Term>) {}
}

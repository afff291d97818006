//! Minimum-frequency term queries.
//!
//! Both queries bind a term to a threshold and only let through documents in
//! which the term occurs at least that many times. The check is made in one
//! place, the [`MinFrequencyPostingIterator`] wrapped around the raw postings,
//! so scoring and span enumeration see the same document set.
//!
//! [`MinFrequencyPostingIterator`]: crate::index::min_frequency::MinFrequencyPostingIterator

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::error::{Result, TermwalkError};
use crate::index::term::Term;
use crate::index::term_states::TermStates;
use crate::query::node::Query;
use crate::query::searcher::IndexSearcher;
use crate::query::span::SpanTermWeight;
use crate::query::term::TermWeight;
use crate::query::weight::ScoreMode;

fn check_threshold(min_frequency: u32) -> Result<u32> {
    if min_frequency == 0 {
        return Err(TermwalkError::invalid_argument(
            "minimum frequency must be at least 1",
        ));
    }
    Ok(min_frequency)
}

/// A term query that ignores documents where the term is too rare.
///
/// Term states carried by the query are a cache, not part of its identity:
/// two queries with the same term and threshold are equal.
#[derive(Debug, Clone)]
pub struct MinFrequencyTermQuery {
    term: Term,
    min_frequency: u32,
    term_states: Option<Arc<TermStates>>,
}

impl MinFrequencyTermQuery {
    /// Create a new query; a zero threshold is rejected.
    pub fn new(term: Term, min_frequency: u32) -> Result<Self> {
        Ok(MinFrequencyTermQuery {
            term,
            min_frequency: check_threshold(min_frequency)?,
            term_states: None,
        })
    }

    /// Attach pre-built term states. They are only used against the snapshot
    /// they were built for.
    pub fn with_term_states(mut self, states: Arc<TermStates>) -> Self {
        self.term_states = Some(states);
        self
    }

    /// Get the term.
    pub fn term(&self) -> &Term {
        &self.term
    }

    /// Get the threshold.
    pub fn min_frequency(&self) -> u32 {
        self.min_frequency
    }

    /// Pre-built term states, if any.
    pub fn term_states(&self) -> Option<&Arc<TermStates>> {
        self.term_states.as_ref()
    }

    /// Create the weight; `query` must be the node wrapping `self`.
    pub fn create_weight(
        &self,
        searcher: &IndexSearcher,
        query: Arc<Query>,
        score_mode: ScoreMode,
        boost: f32,
    ) -> Result<TermWeight> {
        TermWeight::new(
            searcher,
            query,
            self.term.clone(),
            self.term_states.as_ref(),
            score_mode,
            boost,
            Some(self.min_frequency),
        )
    }
}

impl PartialEq for MinFrequencyTermQuery {
    fn eq(&self, other: &Self) -> bool {
        self.term == other.term && self.min_frequency == other.min_frequency
    }
}

impl Eq for MinFrequencyTermQuery {}

impl Hash for MinFrequencyTermQuery {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.term.hash(state);
        self.min_frequency.hash(state);
    }
}

impl fmt::Display for MinFrequencyTermQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/a{}", self.term, self.min_frequency)
    }
}

/// The positional counterpart of [`MinFrequencyTermQuery`].
///
/// Yields every occurrence of the term as a span, but only in documents where
/// the term occurs at least `min_frequency` times.
#[derive(Debug, Clone)]
pub struct MinFrequencySpanTermQuery {
    term: Term,
    min_frequency: u32,
    term_states: Option<Arc<TermStates>>,
}

impl MinFrequencySpanTermQuery {
    /// Create a new query; a zero threshold is rejected.
    pub fn new(term: Term, min_frequency: u32) -> Result<Self> {
        Ok(MinFrequencySpanTermQuery {
            term,
            min_frequency: check_threshold(min_frequency)?,
            term_states: None,
        })
    }

    /// Attach pre-built term states.
    pub fn with_term_states(mut self, states: Arc<TermStates>) -> Self {
        self.term_states = Some(states);
        self
    }

    /// Get the term.
    pub fn term(&self) -> &Term {
        &self.term
    }

    /// Get the threshold.
    pub fn min_frequency(&self) -> u32 {
        self.min_frequency
    }

    /// Create the span weight; `query` must be the node wrapping `self`.
    pub fn create_span_weight(
        &self,
        searcher: &IndexSearcher,
        query: Arc<Query>,
        needs_stats: bool,
    ) -> Result<SpanTermWeight> {
        SpanTermWeight::new(
            searcher,
            query,
            self.term.clone(),
            self.term_states.as_ref(),
            needs_stats,
            Some(self.min_frequency),
        )
    }
}

impl PartialEq for MinFrequencySpanTermQuery {
    fn eq(&self, other: &Self) -> bool {
        self.term == other.term && self.min_frequency == other.min_frequency
    }
}

impl Eq for MinFrequencySpanTermQuery {}

impl Hash for MinFrequencySpanTermQuery {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.term.hash(state);
        self.min_frequency.hash(state);
    }
}

impl fmt::Display for MinFrequencySpanTermQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/a{}", self.term, self.min_frequency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::memory::{MemoryIndexBuilder, Token};
    use crate::index::posting::PostingFlags;
    use crate::index::reader::IndexOptions;
    use crate::query::weight::{SpanWeight, Weight};

    fn index(options: IndexOptions) -> Arc<crate::index::memory::MemoryIndex> {
        let mut builder = MemoryIndexBuilder::new().field("body", options);
        builder.add_text("body", "fox").unwrap();
        builder.add_text("body", "fox fox dog").unwrap();
        builder.add_text("body", "fox fox fox").unwrap();
        builder.add_text("body", "dog").unwrap();
        builder.build()
    }

    fn docs(weight: &dyn Weight, searcher: &IndexSearcher) -> Vec<u64> {
        let segment = searcher.snapshot().segments()[0].clone();
        let mut docs = Vec::new();
        if let Some(mut matcher) = weight.matcher(segment.as_ref()).unwrap() {
            while !matcher.is_exhausted() {
                docs.push(matcher.doc_id());
                matcher.next().unwrap();
            }
        }
        docs
    }

    #[test]
    fn test_zero_threshold_rejected() {
        assert!(MinFrequencyTermQuery::new(Term::new("body", "fox"), 0).is_err());
        assert!(MinFrequencySpanTermQuery::new(Term::new("body", "fox"), 0).is_err());
    }

    #[test]
    fn test_display_and_identity() {
        let query = MinFrequencyTermQuery::new(Term::new("body", "fox"), 2).unwrap();
        assert_eq!(query.to_string(), "body:fox/a2");

        let index = index(IndexOptions::Freqs);
        let states = Arc::new(
            TermStates::build(index.as_ref(), &Term::new("body", "fox"), true).unwrap(),
        );
        let with_states = query.clone().with_term_states(states);
        assert_eq!(query, with_states);

        let other = MinFrequencyTermQuery::new(Term::new("body", "fox"), 3).unwrap();
        assert_ne!(query, other);
    }

    #[test]
    fn test_filters_documents_below_threshold() {
        let searcher = IndexSearcher::new(index(IndexOptions::Freqs));
        for (min, expected) in [(1, vec![0, 1, 2]), (2, vec![1, 2]), (3, vec![2]), (4, vec![])] {
            let query = Query::min_frequency_term("body", "fox", min).unwrap();
            let weight = searcher
                .create_weight(&query, ScoreMode::CompleteNoScores, 1.0)
                .unwrap();
            assert_eq!(docs(weight.as_ref(), &searcher), expected, "min={min}");
        }
    }

    #[test]
    fn test_carried_term_states_reused_only_for_same_snapshot() {
        let index = index(IndexOptions::Freqs);
        let searcher = IndexSearcher::new(index.clone());
        let states = Arc::new(
            TermStates::build(index.as_ref(), &Term::new("body", "fox"), true).unwrap(),
        );
        let query = MinFrequencyTermQuery::new(Term::new("body", "fox"), 2)
            .unwrap()
            .with_term_states(states.clone());
        let node = Arc::new(Query::MinFrequencyTerm(query.clone()));

        let weight = query
            .create_weight(&searcher, node.clone(), ScoreMode::Complete, 1.0)
            .unwrap();
        assert!(Arc::ptr_eq(weight.term_states(), &states));

        // A second snapshot with the same content must not use the foreign states.
        let other = IndexSearcher::new(self::index(IndexOptions::Freqs));
        let weight = query
            .create_weight(&other, node, ScoreMode::Complete, 1.0)
            .unwrap();
        assert!(!Arc::ptr_eq(weight.term_states(), &states));
        assert!(weight.term_states().was_built_for(other.snapshot().id()));
        assert_eq!(docs(&weight, &other), vec![1, 2]);
    }

    #[test]
    fn test_explain() {
        let searcher = IndexSearcher::new(index(IndexOptions::Freqs));
        let query = Query::min_frequency_term("body", "fox", 2).unwrap();
        let explanation = searcher.explain(&query, 2).unwrap();
        assert!(explanation.is_match());
        assert_eq!(
            explanation.description(),
            "weight(body:fox/a2 in 2) [BM25], result of:"
        );

        let explanation = searcher.explain(&query, 0).unwrap();
        assert!(!explanation.is_match());
        assert_eq!(explanation.description(), "no matching term");
    }

    #[test]
    fn test_span_variant_requires_positions() {
        let searcher = IndexSearcher::new(index(IndexOptions::Freqs));
        let query = Query::min_frequency_span_term("body", "fox", 2).unwrap();
        let err = searcher.count(&query).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Indexing mismatch: field \"body\" was indexed without position data; \
             cannot run SpanTermQuery (term=fox)"
        );
    }

    #[test]
    fn test_span_variant_absent_term_matches_nothing() {
        let searcher = IndexSearcher::new(index(IndexOptions::Freqs));
        let absent = Query::min_frequency_span_term("body", "absent", 2).unwrap();
        assert_eq!(searcher.count(&absent).unwrap(), 0);

        let present = Query::min_frequency_span_term("body", "fox", 2).unwrap();
        assert!(matches!(
            searcher.count(&present),
            Err(TermwalkError::IndexingMismatch(_))
        ));
    }

    #[test]
    fn test_span_variant_keeps_all_occurrences() {
        let mut builder = MemoryIndexBuilder::new().field("body", IndexOptions::PositionsAndPayloads);
        builder
            .add_document(vec![(
                "body",
                vec![Token::new("fox", 0), Token::new("fox", 3).with_payload(b"syn")],
            )])
            .unwrap();
        builder
            .add_document(vec![("body", vec![Token::new("fox", 1)])])
            .unwrap();
        let searcher = IndexSearcher::new(builder.build());

        let query = Query::min_frequency_span_term("body", "fox", 2).unwrap();
        let Query::MinFrequencySpanTerm(inner) = query.as_ref() else {
            unreachable!()
        };
        let weight = inner.create_span_weight(&searcher, query.clone(), true).unwrap();
        let segment = searcher.snapshot().segments()[0].clone();
        let mut spans = weight
            .spans(segment.as_ref(), PostingFlags::Payloads)
            .unwrap()
            .unwrap();

        assert!(spans.next().unwrap());
        assert_eq!(spans.doc_id(), 0);
        assert_eq!(spans.current_spans().len(), 2);
        assert!(!spans.next().unwrap());
    }
}

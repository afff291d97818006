//! Term query implementation for exact term matching.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::index::min_frequency::MinFrequencyPostingIterator;
use crate::index::posting::{PostingFlags, PostingIterator};
use crate::index::reader::SegmentReader;
use crate::index::term::Term;
use crate::index::term_states::TermStates;
use crate::query::explanation::Explanation;
use crate::query::matcher::{Matcher, PostingMatcher};
use crate::query::node::Query;
use crate::query::scorer::BM25Scorer;
use crate::query::searcher::IndexSearcher;
use crate::query::weight::{ScoreMode, Weight};

/// A query that matches documents containing a specific term.
///
/// Like Lucene's `TermQuery`, the term is not analyzed; it must already be
/// in its indexed form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TermQuery {
    term: Term,
}

impl TermQuery {
    /// Create a new term query.
    pub fn new(term: Term) -> Self {
        TermQuery { term }
    }

    /// Get the term.
    pub fn term(&self) -> &Term {
        &self.term
    }
}

impl fmt::Display for TermQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.term)
    }
}

/// Weight shared by term, marked-term and minimum-frequency term queries.
///
/// Enumerates frequencies only, so it works on fields indexed without
/// positions. With a minimum frequency, postings are wrapped in a
/// [`MinFrequencyPostingIterator`] before they reach the matcher.
#[derive(Debug)]
pub struct TermWeight {
    query: Arc<Query>,
    term: Term,
    states: Arc<TermStates>,
    scorer: Option<BM25Scorer>,
    min_frequency: Option<u32>,
}

impl TermWeight {
    /// Bind a term to the searcher's snapshot.
    ///
    /// `carried` states are reused when they were built for the same snapshot.
    pub fn new(
        searcher: &IndexSearcher,
        query: Arc<Query>,
        term: Term,
        carried: Option<&Arc<TermStates>>,
        score_mode: ScoreMode,
        boost: f32,
        min_frequency: Option<u32>,
    ) -> Result<Self> {
        let states = searcher.resolve_term_states(&term, carried, score_mode.needs_scores())?;
        let scorer = if score_mode.needs_scores() {
            let collection = searcher.collection_statistics(term.field());
            Some(match (collection, states.term_statistics()) {
                (Some(collection), Some(stats)) => BM25Scorer::new(
                    stats.doc_freq,
                    collection.avg_field_length(),
                    collection.max_doc,
                    boost,
                ),
                _ => BM25Scorer::new(0, 0.0, 0, boost),
            })
        } else {
            None
        };

        Ok(TermWeight {
            query,
            term,
            states,
            scorer,
            min_frequency,
        })
    }

    /// The term states this weight reads.
    pub fn term_states(&self) -> &Arc<TermStates> {
        &self.states
    }

    fn posting_matcher(&self, segment: &dyn SegmentReader) -> Result<Option<PostingMatcher>> {
        let Some(state) = self.states.get(segment)? else {
            return Ok(None);
        };

        let postings = segment.postings(&self.term, state, PostingFlags::Freqs)?;
        let postings: Box<dyn PostingIterator> = match self.min_frequency {
            Some(min) => Box::new(MinFrequencyPostingIterator::new(postings, min)?),
            None => postings,
        };
        Ok(Some(PostingMatcher::new(postings, self.scorer.clone())?))
    }
}

impl Weight for TermWeight {
    fn query(&self) -> &Arc<Query> {
        &self.query
    }

    fn matcher(&self, segment: &dyn SegmentReader) -> Result<Option<Box<dyn Matcher>>> {
        Ok(self
            .posting_matcher(segment)?
            .map(|m| Box::new(m) as Box<dyn Matcher>))
    }

    fn explain(&self, segment: &dyn SegmentReader, doc: u64) -> Result<Explanation> {
        if let Some(mut matcher) = self.posting_matcher(segment)?
            && matcher.skip_to(doc)?
            && matcher.doc_id() == doc
        {
            let freq = matcher.term_freq() as f32;
            let freq = Explanation::matched(freq, format!("termFreq={freq}"));
            let scorer = self
                .scorer
                .clone()
                .unwrap_or_else(|| BM25Scorer::new(0, 0.0, 0, 1.0));
            let score = scorer.explain(freq);
            return Ok(Explanation::matched(
                score.value(),
                format!("weight({} in {doc}) [BM25], result of:", self.query),
            )
            .with_detail(score));
        }
        Ok(Explanation::no_match("no matching term"))
    }

    fn extract_terms(&self, terms: &mut BTreeSet<Term>) {
        terms.insert(self.term.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::memory::MemoryIndexBuilder;
    use crate::index::reader::IndexOptions;

    fn searcher() -> IndexSearcher {
        let mut builder = MemoryIndexBuilder::new().field("tag", IndexOptions::Freqs);
        builder.add_text("tag", "red green").unwrap();
        builder.add_text("tag", "blue").unwrap();
        builder.add_text("tag", "red red").unwrap();
        IndexSearcher::new(builder.build())
    }

    #[test]
    fn test_term_query_display() {
        let query = TermQuery::new(Term::new("title", "hello"));
        assert_eq!(query.to_string(), "title:hello");
    }

    #[test]
    fn test_term_weight_on_freq_only_field() {
        let searcher = searcher();
        let query = Query::term("tag", "red");
        let weight = searcher.create_weight(&query, ScoreMode::Complete, 1.0).unwrap();

        let segment = searcher.snapshot().segments()[0].clone();
        let mut matcher = weight.matcher(segment.as_ref()).unwrap().unwrap();
        let mut docs = Vec::new();
        while !matcher.is_exhausted() {
            assert!(matcher.score() > 0.0);
            docs.push(matcher.doc_id());
            matcher.next().unwrap();
        }
        assert_eq!(docs, vec![0, 2]);
    }

    #[test]
    fn test_missing_term_has_no_matcher() {
        let searcher = searcher();
        let query = Query::term("tag", "purple");
        let weight = searcher.create_weight(&query, ScoreMode::Complete, 1.0).unwrap();
        let segment = searcher.snapshot().segments()[0].clone();
        assert!(weight.matcher(segment.as_ref()).unwrap().is_none());
    }

    #[test]
    fn test_explain() {
        let searcher = searcher();
        let query = Query::term("tag", "red");
        let weight = searcher.create_weight(&query, ScoreMode::Complete, 1.0).unwrap();
        let segment = searcher.snapshot().segments()[0].clone();

        let explanation = weight.explain(segment.as_ref(), 2).unwrap();
        assert!(explanation.is_match());
        assert_eq!(explanation.description(), "weight(tag:red in 2) [BM25], result of:");

        let explanation = weight.explain(segment.as_ref(), 1).unwrap();
        assert!(!explanation.is_match());
        assert_eq!(explanation.description(), "no matching term");

        let mut terms = BTreeSet::new();
        weight.extract_terms(&mut terms);
        assert!(terms.contains(&Term::new("tag", "red")));
    }
}

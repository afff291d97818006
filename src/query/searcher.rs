//! Index searcher: rewriting, weight creation and collection.
//!
//! Executing a query takes three steps. The query is first rewritten against
//! the snapshot until it stops changing (multi-term queries are expanded to
//! their concrete terms and lazy nodes are bound). A [`Weight`] is then built
//! once for the rewritten tree. Finally every segment gets its own matcher,
//! whose documents are fed into a collector.

use std::sync::Arc;

use ahash::AHashMap;
use log::{debug, trace};
use parking_lot::RwLock;
use rayon::prelude::*;

use crate::config::SearchSettings;
use crate::error::{Result, TermwalkError};
use crate::index::reader::{CollectionStatistics, IndexSnapshot, SegmentReader};
use crate::index::term::Term;
use crate::index::term_states::TermStates;
use crate::query::boolean::{BooleanClause, BooleanQuery, BooleanWeight};
use crate::query::collector::{Collector, CountCollector, TopDocs, TopDocsCollector};
use crate::query::explanation::Explanation;
use crate::query::min_frequency::{MinFrequencySpanTermQuery, MinFrequencyTermQuery};
use crate::query::multi_term::MultiTermQuery;
use crate::query::node::Query;
use crate::query::span::{
    SpanEmptyPayloadCheckQuery, SpanFilterWeight, SpanMinFrequencyFilterQuery, SpanNearQuery,
    SpanNearWeight, SpanOrQuery, SpanOrWeight, SpanScoringWeight, SpanTermQuery, SpanTermWeight,
};
use crate::query::spans::SpanFilter;
use crate::query::term::{TermQuery, TermWeight};
use crate::query::weight::{MatchNoneWeight, ScoreMode, SpanWeight, Weight};

/// Searches one index snapshot.
///
/// Term states are cached per searcher; the cache is safe to share between
/// threads searching the same snapshot.
#[derive(Debug)]
pub struct IndexSearcher {
    snapshot: Arc<dyn IndexSnapshot>,
    settings: SearchSettings,
    term_states: RwLock<AHashMap<Term, Arc<TermStates>>>,
}

impl IndexSearcher {
    /// Create a searcher with default settings.
    pub fn new(snapshot: Arc<dyn IndexSnapshot>) -> Self {
        Self::with_settings(snapshot, SearchSettings::default())
    }

    /// Create a searcher with the given settings.
    pub fn with_settings(snapshot: Arc<dyn IndexSnapshot>, settings: SearchSettings) -> Self {
        IndexSearcher {
            snapshot,
            settings,
            term_states: RwLock::new(AHashMap::new()),
        }
    }

    /// The snapshot being searched.
    pub fn snapshot(&self) -> &Arc<dyn IndexSnapshot> {
        &self.snapshot
    }

    /// The settings in effect.
    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// Snapshot-wide statistics of a field.
    pub fn collection_statistics(&self, field: &str) -> Option<CollectionStatistics> {
        self.snapshot.collection_statistics(field)
    }

    /// Term states for `term`, built at most once per searcher.
    ///
    /// A cached entry without statistics is rebuilt when statistics are needed.
    pub fn term_states(&self, term: &Term, needs_stats: bool) -> Result<Arc<TermStates>> {
        {
            let cache = self.term_states.read();
            if let Some(states) = cache.get(term)
                && (states.has_stats() || !needs_stats)
            {
                return Ok(states.clone());
            }
        }

        let states = Arc::new(TermStates::build(self.snapshot.as_ref(), term, needs_stats)?);
        self.term_states
            .write()
            .insert(term.clone(), states.clone());
        Ok(states)
    }

    /// Term states carried by a query when they fit this snapshot, cached ones otherwise.
    pub fn resolve_term_states(
        &self,
        term: &Term,
        carried: Option<&Arc<TermStates>>,
        needs_stats: bool,
    ) -> Result<Arc<TermStates>> {
        if let Some(states) = carried {
            if states.was_built_for(self.snapshot.id()) && (states.has_stats() || !needs_stats) {
                return Ok(states.clone());
            }
            debug!("term states carried for {term} do not fit snapshot {}, rebuilding", self.snapshot.id());
        }
        self.term_states(term, needs_stats)
    }

    /// Rewrite `query` until it stops changing.
    pub fn rewrite(&self, query: &Arc<Query>) -> Result<Arc<Query>> {
        let mut current = query.clone();
        for pass in 0..self.settings.max_rewrite_passes {
            let next = self.rewrite_step(&current)?;
            if Arc::ptr_eq(&next, &current) {
                return Ok(current);
            }
            trace!("rewrite pass {pass}: [{current}] -> [{next}]");
            current = next;
        }
        Err(TermwalkError::invariant(format!(
            "rewrite of [{query}] did not converge after {} passes",
            self.settings.max_rewrite_passes
        )))
    }

    /// One rewrite step over the whole tree. Returns the same `Arc` when nothing changed.
    pub fn rewrite_step(&self, query: &Arc<Query>) -> Result<Arc<Query>> {
        match query.as_ref() {
            Query::MultiTerm(multi) => self.expand_multi_term(multi),
            Query::SpanMultiTerm(span) => self.expand_span_multi_term(span.query()),
            Query::Lazy(lazy) => lazy.bind(self),
            Query::Boost(boost) => {
                let inner = self.rewrite_step(boost.query())?;
                if Arc::ptr_eq(&inner, boost.query()) {
                    Ok(query.clone())
                } else {
                    Ok(Arc::new(Query::Boost(boost.with_query(inner))))
                }
            }
            Query::Boolean(boolean) => {
                let queries: Vec<Arc<Query>> =
                    boolean.clauses().iter().map(|c| c.query.clone()).collect();
                match self.rewrite_all(&queries)? {
                    None => Ok(query.clone()),
                    Some(rewritten) => {
                        let clauses = boolean
                            .clauses()
                            .iter()
                            .zip(rewritten)
                            .map(|(clause, q)| BooleanClause::new(q, clause.occur))
                            .collect();
                        Ok(Arc::new(Query::Boolean(BooleanQuery::from_clauses(clauses))))
                    }
                }
            }
            Query::SpanOr(or) => match self.rewrite_all(or.clauses())? {
                None => Ok(query.clone()),
                Some(clauses) => Ok(Arc::new(Query::SpanOr(SpanOrQuery::new(
                    or.field(),
                    clauses,
                )?))),
            },
            Query::SpanNear(near) => match self.rewrite_all(near.clauses())? {
                None => Ok(query.clone()),
                Some(clauses) => Ok(Arc::new(Query::SpanNear(SpanNearQuery::new(
                    clauses,
                    near.slop(),
                    near.in_order(),
                )?))),
            },
            Query::SpanEmptyPayloadCheck(check) => {
                let inner = self.rewrite_step(check.inner())?;
                if Arc::ptr_eq(&inner, check.inner()) {
                    Ok(query.clone())
                } else {
                    Ok(Arc::new(Query::SpanEmptyPayloadCheck(
                        SpanEmptyPayloadCheckQuery::new(inner)?,
                    )))
                }
            }
            Query::SpanMinFrequencyFilter(filter) => {
                let inner = self.rewrite_step(filter.inner())?;
                if Arc::ptr_eq(&inner, filter.inner()) {
                    Ok(query.clone())
                } else {
                    Ok(Arc::new(Query::SpanMinFrequencyFilter(
                        SpanMinFrequencyFilterQuery::new(inner, filter.min_frequency())?,
                    )))
                }
            }
            _ => Ok(query.clone()),
        }
    }

    /// Rewrite every query; `None` when none of them changed.
    fn rewrite_all(&self, queries: &[Arc<Query>]) -> Result<Option<Vec<Arc<Query>>>> {
        let mut changed = false;
        let mut rewritten = Vec::with_capacity(queries.len());
        for query in queries {
            let next = self.rewrite_step(query)?;
            changed |= !Arc::ptr_eq(&next, query);
            rewritten.push(next);
        }
        Ok(changed.then_some(rewritten))
    }

    fn expand_multi_term(&self, multi: &MultiTermQuery) -> Result<Arc<Query>> {
        let terms = multi.expand(self.snapshot.as_ref(), self.settings.max_clause_count)?;
        debug!("expanded [{multi}] to {} terms", terms.len());
        if terms.is_empty() {
            return Ok(Query::match_none());
        }

        let clauses = terms
            .into_iter()
            .map(|term| {
                let query = match multi.min_frequency() {
                    Some(min) => Query::MinFrequencyTerm(MinFrequencyTermQuery::new(term, min)?),
                    None => Query::Term(TermQuery::new(term)),
                };
                Ok(BooleanClause::should(Arc::new(query)))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Query::boolean(clauses))
    }

    fn expand_span_multi_term(&self, multi: &MultiTermQuery) -> Result<Arc<Query>> {
        let terms = multi.expand(self.snapshot.as_ref(), self.settings.max_clause_count)?;
        debug!("expanded span [{multi}] to {} terms", terms.len());

        let clauses = terms
            .into_iter()
            .map(|term| {
                let query = match multi.min_frequency() {
                    Some(min) => {
                        Query::MinFrequencySpanTerm(MinFrequencySpanTermQuery::new(term, min)?)
                    }
                    None => Query::SpanTerm(SpanTermQuery::new(term)),
                };
                Ok(Arc::new(query))
            })
            .collect::<Result<Vec<_>>>()?;
        if clauses.is_empty() {
            return Ok(Arc::new(Query::SpanOr(SpanOrQuery::empty(multi.field()))));
        }
        Ok(Arc::new(Query::SpanOr(SpanOrQuery::new(multi.field(), clauses)?)))
    }

    /// Create the weight of a rewritten query.
    pub fn create_weight(
        &self,
        query: &Arc<Query>,
        score_mode: ScoreMode,
        boost: f32,
    ) -> Result<Box<dyn Weight>> {
        Ok(match query.as_ref() {
            Query::MultiTerm(_) | Query::SpanMultiTerm(_) | Query::Lazy(_) => {
                return Err(TermwalkError::invariant(format!(
                    "query [{query}] must be rewritten before a weight is created"
                )));
            }
            Query::Term(q) => Box::new(TermWeight::new(
                self,
                query.clone(),
                q.term().clone(),
                None,
                score_mode,
                boost,
                None,
            )?),
            Query::MarkedTerm(q) => Box::new(TermWeight::new(
                self,
                query.clone(),
                q.term().clone(),
                None,
                score_mode,
                boost,
                None,
            )?),
            Query::MinFrequencyTerm(q) => {
                Box::new(q.create_weight(self, query.clone(), score_mode, boost)?)
            }
            Query::Boost(q) => return self.create_weight(q.query(), score_mode, boost * q.boost()),
            Query::Boolean(q) => Box::new(BooleanWeight::new(
                self,
                query.clone(),
                q,
                score_mode,
                boost,
            )?),
            Query::MatchNone => Box::new(MatchNoneWeight::new(query.clone())),
            Query::SpanTerm(_)
            | Query::MinFrequencySpanTerm(_)
            | Query::SpanOr(_)
            | Query::SpanNear(_)
            | Query::SpanEmptyPayloadCheck(_)
            | Query::SpanMinFrequencyFilter(_) => {
                let span = self.create_span_weight(query, score_mode.needs_scores())?;
                Box::new(SpanScoringWeight::new(
                    self,
                    query.clone(),
                    span,
                    score_mode,
                    boost,
                ))
            }
        })
    }

    /// Create the span weight of a rewritten span query.
    pub fn create_span_weight(
        &self,
        query: &Arc<Query>,
        needs_stats: bool,
    ) -> Result<Box<dyn SpanWeight>> {
        Ok(match query.as_ref() {
            Query::SpanTerm(q) => Box::new(SpanTermWeight::new(
                self,
                query.clone(),
                q.term().clone(),
                None,
                needs_stats,
                None,
            )?),
            Query::MinFrequencySpanTerm(q) => {
                Box::new(q.create_span_weight(self, query.clone(), needs_stats)?)
            }
            Query::SpanOr(q) => Box::new(SpanOrWeight::new(self, query.clone(), q, needs_stats)?),
            Query::SpanNear(q) => {
                Box::new(SpanNearWeight::new(self, query.clone(), q, needs_stats)?)
            }
            Query::SpanEmptyPayloadCheck(q) => Box::new(SpanFilterWeight::new(
                query.clone(),
                self.create_span_weight(q.inner(), needs_stats)?,
                SpanFilter::EmptyPayload,
            )),
            Query::SpanMinFrequencyFilter(q) => Box::new(SpanFilterWeight::new(
                query.clone(),
                self.create_span_weight(q.inner(), needs_stats)?,
                SpanFilter::MinFrequency(q.min_frequency()),
            )),
            Query::SpanMultiTerm(_) | Query::Lazy(_) => {
                return Err(TermwalkError::invariant(format!(
                    "query [{query}] must be rewritten before a weight is created"
                )));
            }
            _ => {
                return Err(TermwalkError::invalid_argument(format!(
                    "[{query}] is not a span query"
                )));
            }
        })
    }

    /// Feed every match of `weight` in `segment` into `collector`.
    fn collect_segment(
        &self,
        weight: &dyn Weight,
        segment: &dyn SegmentReader,
        collector: &mut dyn Collector,
    ) -> Result<()> {
        let Some(mut matcher) = weight.matcher(segment)? else {
            trace!("segment {} has no matches", segment.ord());
            return Ok(());
        };

        let doc_base = segment.doc_base();
        while !matcher.is_exhausted() {
            collector.collect(doc_base + matcher.doc_id(), matcher.score())?;
            matcher.next()?;
        }
        Ok(())
    }

    /// Rewrite and run `query`, returning the `top_k` best hits.
    pub fn search(&self, query: &Arc<Query>, top_k: usize) -> Result<TopDocs> {
        let rewritten = self.rewrite(query)?;
        debug!("searching [{rewritten}] for top {top_k}");
        let weight = self.create_weight(&rewritten, ScoreMode::Complete, 1.0)?;

        let run = |segment: &Arc<dyn SegmentReader>| -> Result<TopDocsCollector> {
            let mut collector = TopDocsCollector::new(top_k);
            self.collect_segment(weight.as_ref(), segment.as_ref(), &mut collector)?;
            Ok(collector)
        };

        let segments = self.snapshot.segments();
        let collectors = if self.settings.parallel {
            segments.par_iter().map(run).collect::<Result<Vec<_>>>()?
        } else {
            segments.iter().map(run).collect::<Result<Vec<_>>>()?
        };

        let mut merged = TopDocsCollector::new(top_k);
        for collector in collectors {
            merged.merge(collector);
        }
        Ok(merged.into_top_docs())
    }

    /// Rewrite and run `query`, counting its matches.
    pub fn count(&self, query: &Arc<Query>) -> Result<u64> {
        let rewritten = self.rewrite(query)?;
        let weight = self.create_weight(&rewritten, ScoreMode::CompleteNoScores, 1.0)?;

        let mut collector = CountCollector::new();
        for segment in self.snapshot.segments() {
            self.collect_segment(weight.as_ref(), segment.as_ref(), &mut collector)?;
        }
        Ok(collector.count())
    }

    /// Explain the score of a global document id.
    pub fn explain(&self, query: &Arc<Query>, doc: u64) -> Result<Explanation> {
        let segment = self
            .snapshot
            .segments()
            .iter()
            .find(|s| s.doc_base() <= doc && doc < s.doc_base() + s.max_doc())
            .ok_or_else(|| {
                TermwalkError::invalid_argument(format!("document {doc} does not exist"))
            })?;

        let rewritten = self.rewrite(query)?;
        let weight = self.create_weight(&rewritten, ScoreMode::Complete, 1.0)?;
        weight.explain(segment.as_ref(), doc - segment.doc_base())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::memory::MemoryIndexBuilder;
    use crate::index::reader::IndexOptions;
    use crate::query::span::SpanMultiTermQuery;

    fn searcher(settings: SearchSettings) -> IndexSearcher {
        let mut builder = MemoryIndexBuilder::new()
            .field("body", IndexOptions::Positions)
            .field("tag", IndexOptions::Freqs);
        builder.add_text("body", "quick quiet fox").unwrap();
        builder.add_text("tag", "alpha").unwrap();
        builder.commit_segment();
        builder.add_text("body", "quill quick quick").unwrap();
        builder.add_text("tag", "beta").unwrap();
        builder.add_text("tag", "gamma").unwrap();
        IndexSearcher::with_settings(builder.build(), settings)
    }

    #[test]
    fn test_rewrite_expands_multi_term() {
        let searcher = searcher(SearchSettings::default());
        let query = Query::multi_term(MultiTermQuery::prefix("body", "qui"));
        let rewritten = searcher.rewrite(&query).unwrap();
        assert_eq!(
            rewritten.to_string(),
            "body:quick body:quiet body:quill"
        );

        let none = Query::multi_term(MultiTermQuery::prefix("body", "zzz"));
        assert_eq!(*searcher.rewrite(&none).unwrap(), Query::MatchNone);
    }

    #[test]
    fn test_rewrite_without_change_returns_same_arc() {
        let searcher = searcher(SearchSettings::default());
        let query = Query::boolean(vec![
            BooleanClause::must(Query::term("body", "quick")),
            BooleanClause::should(Query::boost(Query::term("body", "fox"), 2.0)),
        ]);
        assert!(Arc::ptr_eq(&searcher.rewrite(&query).unwrap(), &query));
    }

    #[test]
    fn test_expansion_honours_max_clause_count() {
        let settings = SearchSettings {
            max_clause_count: 2,
            ..SearchSettings::default()
        };
        let searcher = searcher(settings);
        let query = Query::multi_term(MultiTermQuery::prefix("body", "qui"));
        let err = searcher.search(&query, 10).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_span_multi_term_expansion() {
        let searcher = searcher(SearchSettings::default());
        let query = Arc::new(Query::SpanMultiTerm(SpanMultiTermQuery::new(
            MultiTermQuery::min_frequency_prefix("body", "qui", 2).unwrap(),
        )));
        let rewritten = searcher.rewrite(&query).unwrap();
        assert_eq!(
            rewritten.to_string(),
            "spanOr([body:quick/a2, body:quiet/a2, body:quill/a2])"
        );

        let top = searcher.search(&query, 10).unwrap();
        let docs: Vec<u64> = top.hits.iter().map(|h| h.doc_id).collect();
        assert_eq!(docs, vec![2]);
    }

    #[test]
    fn test_unrewritten_query_rejected_by_create_weight() {
        let searcher = searcher(SearchSettings::default());
        let query = Query::multi_term(MultiTermQuery::prefix("body", "qui"));
        let err = searcher
            .create_weight(&query, ScoreMode::Complete, 1.0)
            .unwrap_err();
        assert!(matches!(err, TermwalkError::InvariantViolation(_)));
    }

    #[test]
    fn test_search_across_segments() {
        for parallel in [false, true] {
            let searcher = searcher(SearchSettings {
                parallel,
                ..SearchSettings::default()
            });
            let top = searcher.search(&Query::term("body", "quick"), 10).unwrap();
            assert_eq!(top.total_hits, 2);
            // Doc 2 holds the term twice.
            assert_eq!(top.hits[0].doc_id, 2);
            assert_eq!(top.hits[1].doc_id, 0);
            assert_eq!(top.max_score, Some(top.hits[0].score));

            assert_eq!(searcher.count(&Query::term("tag", "beta")).unwrap(), 1);
        }
    }

    #[test]
    fn test_term_states_cached() {
        let searcher = searcher(SearchSettings::default());
        let term = Term::new("body", "quick");
        let first = searcher.term_states(&term, false).unwrap();
        let second = searcher.term_states(&term, false).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        // Statistics were not collected the first time.
        let with_stats = searcher.term_states(&term, true).unwrap();
        assert!(!Arc::ptr_eq(&first, &with_stats));
        assert_eq!(with_stats.doc_freq(), 2);
        assert!(Arc::ptr_eq(&with_stats, &searcher.term_states(&term, false).unwrap()));
    }

    #[test]
    fn test_explain_unknown_document() {
        let searcher = searcher(SearchSettings::default());
        assert!(searcher.explain(&Query::term("body", "quick"), 99).is_err());
    }
}

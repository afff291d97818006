//! Span queries for positional and proximity-based searching.
//!
//! Span queries match term positions rather than whole documents. They are
//! composed into trees whose operands must all be span queries on the same
//! field; the constructors check this. A span tree is executed through a
//! [`SpanScoringWeight`], which turns the spans of each document into a
//! sloppy frequency and scores it with BM25.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use ahash::AHashMap;

use crate::error::{Result, TermwalkError};
use crate::index::min_frequency::MinFrequencyPostingIterator;
use crate::index::posting::{NO_MORE_DOCS, PostingFlags, PostingIterator};
use crate::index::reader::SegmentReader;
use crate::index::term::Term;
use crate::index::term_states::TermStates;
use crate::query::explanation::Explanation;
use crate::query::matcher::Matcher;
use crate::query::multi_term::MultiTermQuery;
use crate::query::node::Query;
use crate::query::scorer::{BM25Scorer, Scorer};
use crate::query::searcher::IndexSearcher;
use crate::query::spans::{FilterSpans, NearSpans, OrSpans, SpanFilter, Spans, TermSpans};
use crate::query::weight::{ScoreMode, SpanWeight, Weight};

/// Check that `operand` is a span query, on `field` when one is given.
fn span_operand_field<'a>(operand: &'a Arc<Query>, field: Option<&str>) -> Result<&'a str> {
    let Some(operand_field) = operand.span_field() else {
        return Err(TermwalkError::invalid_argument(format!(
            "span operand must be a span query, got [{operand}]"
        )));
    };
    match field {
        Some(field) if field != operand_field => Err(TermwalkError::invalid_argument(format!(
            "span clauses must all be on field [{field}], got [{operand}]"
        ))),
        _ => Ok(operand_field),
    }
}

fn write_clauses(f: &mut fmt::Formatter<'_>, clauses: &[Arc<Query>]) -> fmt::Result {
    f.write_str("[")?;
    for (i, clause) in clauses.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{clause}")?;
    }
    f.write_str("]")
}

/// A span query that matches a single term.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpanTermQuery {
    term: Term,
}

impl SpanTermQuery {
    /// Create a new span term query.
    pub fn new(term: Term) -> Self {
        SpanTermQuery { term }
    }

    /// Get the term.
    pub fn term(&self) -> &Term {
        &self.term
    }
}

impl fmt::Display for SpanTermQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.term)
    }
}

/// A multi-term query enumerated as spans.
///
/// Expanded by the searcher into a [`SpanOrQuery`] of span terms.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpanMultiTermQuery {
    query: MultiTermQuery,
}

impl SpanMultiTermQuery {
    /// Wrap a multi-term query.
    pub fn new(query: MultiTermQuery) -> Self {
        SpanMultiTermQuery { query }
    }

    /// Get the wrapped query.
    pub fn query(&self) -> &MultiTermQuery {
        &self.query
    }
}

impl fmt::Display for SpanMultiTermQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SpanMultiTermQueryWrapper({})", self.query)
    }
}

/// Union of span queries on one field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpanOrQuery {
    field: String,
    clauses: Vec<Arc<Query>>,
}

impl SpanOrQuery {
    /// Create a union; every clause must be a span query on `field`.
    pub fn new(field: &str, clauses: Vec<Arc<Query>>) -> Result<Self> {
        for clause in &clauses {
            span_operand_field(clause, Some(field))?;
        }
        Ok(SpanOrQuery {
            field: field.to_string(),
            clauses,
        })
    }

    /// The union of nothing.
    pub fn empty(field: &str) -> Self {
        SpanOrQuery {
            field: field.to_string(),
            clauses: Vec::new(),
        }
    }

    /// Get the field.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Get the clauses.
    pub fn clauses(&self) -> &[Arc<Query>] {
        &self.clauses
    }
}

impl fmt::Display for SpanOrQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("spanOr(")?;
        write_clauses(f, &self.clauses)?;
        f.write_str(")")
    }
}

/// Span queries that occur within `slop` positions of each other.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpanNearQuery {
    field: String,
    clauses: Vec<Arc<Query>>,
    slop: u32,
    in_order: bool,
}

impl SpanNearQuery {
    /// Create a proximity query over at least one span clause, all on one field.
    pub fn new(clauses: Vec<Arc<Query>>, slop: u32, in_order: bool) -> Result<Self> {
        let Some(first) = clauses.first() else {
            return Err(TermwalkError::invalid_argument(
                "span near query needs at least one clause",
            ));
        };
        let field = span_operand_field(first, None)?.to_string();
        for clause in &clauses[1..] {
            span_operand_field(clause, Some(&field))?;
        }
        Ok(SpanNearQuery {
            field,
            clauses,
            slop,
            in_order,
        })
    }

    /// Get the field.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Get the clauses.
    pub fn clauses(&self) -> &[Arc<Query>] {
        &self.clauses
    }

    /// Get the slop.
    pub fn slop(&self) -> u32 {
        self.slop
    }

    /// Whether clauses must match in order.
    pub fn in_order(&self) -> bool {
        self.in_order
    }
}

impl fmt::Display for SpanNearQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("spanNear(")?;
        write_clauses(f, &self.clauses)?;
        write!(f, ", {}, {})", self.slop, self.in_order)
    }
}

/// Keeps only the spans whose occurrences carry no payload.
///
/// Indexing marks non-exact tokens (synonyms, stems, ...) with a payload, so
/// this is what makes a span query "exact".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpanEmptyPayloadCheckQuery {
    inner: Arc<Query>,
}

impl SpanEmptyPayloadCheckQuery {
    /// Wrap a span query.
    pub fn new(inner: Arc<Query>) -> Result<Self> {
        span_operand_field(&inner, None)?;
        Ok(SpanEmptyPayloadCheckQuery { inner })
    }

    /// Get the wrapped query.
    pub fn inner(&self) -> &Arc<Query> {
        &self.inner
    }
}

impl fmt::Display for SpanEmptyPayloadCheckQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SpanEmptyPayloadCheck({})", self.inner)
    }
}

/// Keeps a document only when the wrapped query has at least
/// `min_frequency` spans in it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpanMinFrequencyFilterQuery {
    inner: Arc<Query>,
    min_frequency: u32,
}

impl SpanMinFrequencyFilterQuery {
    /// Wrap a span query; a zero threshold is rejected.
    pub fn new(inner: Arc<Query>, min_frequency: u32) -> Result<Self> {
        span_operand_field(&inner, None)?;
        if min_frequency == 0 {
            return Err(TermwalkError::invalid_argument(
                "minimum frequency must be at least 1",
            ));
        }
        Ok(SpanMinFrequencyFilterQuery {
            inner,
            min_frequency,
        })
    }

    /// Get the wrapped query.
    pub fn inner(&self) -> &Arc<Query> {
        &self.inner
    }

    /// Get the threshold.
    pub fn min_frequency(&self) -> u32 {
        self.min_frequency
    }
}

impl fmt::Display for SpanMinFrequencyFilterQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SpanMinFrequencyFilter({}, {})", self.inner, self.min_frequency)
    }
}

/// Span weight of a single term, optionally gated by a minimum frequency.
#[derive(Debug)]
pub struct SpanTermWeight {
    query: Arc<Query>,
    term: Term,
    states: Arc<TermStates>,
    min_frequency: Option<u32>,
}

impl SpanTermWeight {
    /// Bind a term to the searcher's snapshot.
    pub fn new(
        searcher: &IndexSearcher,
        query: Arc<Query>,
        term: Term,
        carried: Option<&Arc<TermStates>>,
        needs_stats: bool,
        min_frequency: Option<u32>,
    ) -> Result<Self> {
        let states = searcher.resolve_term_states(&term, carried, needs_stats)?;
        Ok(SpanTermWeight {
            query,
            term,
            states,
            min_frequency,
        })
    }

    /// The term states this weight reads.
    pub fn term_states(&self) -> &Arc<TermStates> {
        &self.states
    }
}

impl SpanWeight for SpanTermWeight {
    fn query(&self) -> &Arc<Query> {
        &self.query
    }

    fn field(&self) -> &str {
        self.term.field()
    }

    fn spans(&self, segment: &dyn SegmentReader, flags: PostingFlags) -> Result<Option<Box<dyn Spans>>> {
        let Some(state) = self.states.get(segment)? else {
            return Ok(None);
        };
        // Only segments that hold the term need positions.
        let has_positions = segment
            .index_options(self.term.field())
            .is_some_and(|options| options.has_positions());
        if !has_positions {
            return Err(TermwalkError::indexing_mismatch(format!(
                "field \"{}\" was indexed without position data; cannot run SpanTermQuery (term={})",
                self.term.field(),
                self.term.text()
            )));
        }

        let flags = flags.max(PostingFlags::Positions);
        let postings = segment.postings(&self.term, state, flags)?;
        let postings: Box<dyn PostingIterator> = match self.min_frequency {
            Some(min) => Box::new(MinFrequencyPostingIterator::new(postings, min)?),
            None => postings,
        };
        Ok(Some(Box::new(TermSpans::new(postings))))
    }

    fn extract_term_states(&self, states: &mut AHashMap<Term, Arc<TermStates>>) {
        states.insert(self.term.clone(), self.states.clone());
    }
}

/// Span weight of a [`SpanOrQuery`].
#[derive(Debug)]
pub struct SpanOrWeight {
    query: Arc<Query>,
    field: String,
    subs: Vec<Box<dyn SpanWeight>>,
}

impl SpanOrWeight {
    /// Create weights for every clause.
    pub fn new(
        searcher: &IndexSearcher,
        query: Arc<Query>,
        or: &SpanOrQuery,
        needs_stats: bool,
    ) -> Result<Self> {
        let subs = or
            .clauses()
            .iter()
            .map(|clause| searcher.create_span_weight(clause, needs_stats))
            .collect::<Result<Vec<_>>>()?;
        Ok(SpanOrWeight {
            query,
            field: or.field().to_string(),
            subs,
        })
    }
}

impl SpanWeight for SpanOrWeight {
    fn query(&self) -> &Arc<Query> {
        &self.query
    }

    fn field(&self) -> &str {
        &self.field
    }

    fn spans(&self, segment: &dyn SegmentReader, flags: PostingFlags) -> Result<Option<Box<dyn Spans>>> {
        let mut subs = Vec::with_capacity(self.subs.len());
        for weight in &self.subs {
            if let Some(spans) = weight.spans(segment, flags)? {
                subs.push(spans);
            }
        }
        match subs.len() {
            0 => Ok(None),
            1 => Ok(subs.pop()),
            _ => Ok(Some(Box::new(OrSpans::new(subs)))),
        }
    }

    fn extract_term_states(&self, states: &mut AHashMap<Term, Arc<TermStates>>) {
        for weight in &self.subs {
            weight.extract_term_states(states);
        }
    }
}

/// Span weight of a [`SpanNearQuery`].
#[derive(Debug)]
pub struct SpanNearWeight {
    query: Arc<Query>,
    field: String,
    subs: Vec<Box<dyn SpanWeight>>,
    slop: u32,
    in_order: bool,
}

impl SpanNearWeight {
    /// Create weights for every clause.
    pub fn new(
        searcher: &IndexSearcher,
        query: Arc<Query>,
        near: &SpanNearQuery,
        needs_stats: bool,
    ) -> Result<Self> {
        let subs = near
            .clauses()
            .iter()
            .map(|clause| searcher.create_span_weight(clause, needs_stats))
            .collect::<Result<Vec<_>>>()?;
        Ok(SpanNearWeight {
            query,
            field: near.field().to_string(),
            subs,
            slop: near.slop(),
            in_order: near.in_order(),
        })
    }
}

impl SpanWeight for SpanNearWeight {
    fn query(&self) -> &Arc<Query> {
        &self.query
    }

    fn field(&self) -> &str {
        &self.field
    }

    fn spans(&self, segment: &dyn SegmentReader, flags: PostingFlags) -> Result<Option<Box<dyn Spans>>> {
        let mut subs = Vec::with_capacity(self.subs.len());
        for weight in &self.subs {
            // Every clause has to match somewhere in the segment.
            match weight.spans(segment, flags)? {
                Some(spans) => subs.push(spans),
                None => return Ok(None),
            }
        }
        Ok(Some(Box::new(NearSpans::new(subs, self.slop, self.in_order))))
    }

    fn extract_term_states(&self, states: &mut AHashMap<Term, Arc<TermStates>>) {
        for weight in &self.subs {
            weight.extract_term_states(states);
        }
    }
}

/// Span weight of the payload check and minimum-frequency filter queries.
#[derive(Debug)]
pub struct SpanFilterWeight {
    query: Arc<Query>,
    inner: Box<dyn SpanWeight>,
    filter: SpanFilter,
}

impl SpanFilterWeight {
    /// Wrap the weight of the filtered query.
    pub fn new(query: Arc<Query>, inner: Box<dyn SpanWeight>, filter: SpanFilter) -> Self {
        SpanFilterWeight {
            query,
            inner,
            filter,
        }
    }
}

impl SpanWeight for SpanFilterWeight {
    fn query(&self) -> &Arc<Query> {
        &self.query
    }

    fn field(&self) -> &str {
        self.inner.field()
    }

    fn spans(&self, segment: &dyn SegmentReader, flags: PostingFlags) -> Result<Option<Box<dyn Spans>>> {
        let flags = match self.filter {
            SpanFilter::EmptyPayload => flags.max(PostingFlags::Payloads),
            SpanFilter::MinFrequency(_) => flags,
        };
        Ok(self
            .inner
            .spans(segment, flags)?
            .map(|spans| Box::new(FilterSpans::new(spans, self.filter)) as Box<dyn Spans>))
    }

    fn extract_term_states(&self, states: &mut AHashMap<Term, Arc<TermStates>>) {
        self.inner.extract_term_states(states);
    }
}

/// Document-level weight over a span tree.
#[derive(Debug)]
pub struct SpanScoringWeight {
    query: Arc<Query>,
    span: Box<dyn SpanWeight>,
    scorer: Option<BM25Scorer>,
}

impl SpanScoringWeight {
    /// Wrap a span weight, computing BM25 statistics over all of its terms.
    pub fn new(
        searcher: &IndexSearcher,
        query: Arc<Query>,
        span: Box<dyn SpanWeight>,
        score_mode: ScoreMode,
        boost: f32,
    ) -> Self {
        let scorer = score_mode.needs_scores().then(|| {
            let mut states = AHashMap::new();
            span.extract_term_states(&mut states);
            let mut stats: Vec<_> = states
                .values()
                .filter_map(|states| states.term_statistics())
                .collect();
            stats.sort_by(|a, b| a.term.cmp(&b.term));

            match searcher.collection_statistics(span.field()) {
                Some(collection) if !stats.is_empty() => {
                    BM25Scorer::for_terms(&stats, &collection, boost)
                }
                _ => BM25Scorer::new(0, 0.0, 0, boost),
            }
        });

        SpanScoringWeight {
            query,
            span,
            scorer,
        }
    }

    fn span_matcher(&self, segment: &dyn SegmentReader) -> Result<Option<SpanMatcher>> {
        match self.span.spans(segment, PostingFlags::Positions)? {
            Some(spans) => Ok(Some(SpanMatcher::new(spans, self.scorer.clone())?)),
            None => Ok(None),
        }
    }
}

impl Weight for SpanScoringWeight {
    fn query(&self) -> &Arc<Query> {
        &self.query
    }

    fn matcher(&self, segment: &dyn SegmentReader) -> Result<Option<Box<dyn Matcher>>> {
        Ok(self
            .span_matcher(segment)?
            .map(|m| Box::new(m) as Box<dyn Matcher>))
    }

    fn explain(&self, segment: &dyn SegmentReader, doc: u64) -> Result<Explanation> {
        if let Some(mut matcher) = self.span_matcher(segment)?
            && matcher.skip_to(doc)?
            && matcher.doc_id() == doc
        {
            let freq = matcher.sloppy_freq();
            let freq = Explanation::matched(freq, format!("phraseFreq={freq}"));
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
        Ok(Explanation::no_match("no matching spans"))
    }

    fn extract_terms(&self, terms: &mut BTreeSet<Term>) {
        let mut states = AHashMap::new();
        self.span.extract_term_states(&mut states);
        terms.extend(states.into_keys());
    }
}

/// A matcher over the documents of a span cursor.
#[derive(Debug)]
pub struct SpanMatcher {
    spans: Box<dyn Spans>,
    scorer: Option<BM25Scorer>,
    exhausted: bool,
    cost: u64,
}

impl SpanMatcher {
    /// Create a matcher positioned on the first document with spans.
    pub fn new(mut spans: Box<dyn Spans>, scorer: Option<BM25Scorer>) -> Result<Self> {
        let cost = spans.cost();
        let exhausted = !spans.next()?;
        Ok(SpanMatcher {
            spans,
            scorer,
            exhausted,
            cost,
        })
    }

    /// Sloppy frequency of the current document.
    pub fn sloppy_freq(&self) -> f32 {
        if self.exhausted {
            0.0
        } else {
            self.spans.sloppy_freq()
        }
    }
}

impl Matcher for SpanMatcher {
    fn doc_id(&self) -> u64 {
        if self.exhausted {
            NO_MORE_DOCS
        } else {
            self.spans.doc_id()
        }
    }

    fn next(&mut self) -> Result<bool> {
        if self.exhausted {
            return Ok(false);
        }
        self.exhausted = !self.spans.next()?;
        Ok(!self.exhausted)
    }

    fn skip_to(&mut self, target: u64) -> Result<bool> {
        if self.exhausted || target <= self.spans.doc_id() {
            return Ok(!self.exhausted);
        }
        self.exhausted = !self.spans.skip_to(target)?;
        Ok(!self.exhausted)
    }

    fn cost(&self) -> u64 {
        self.cost
    }

    fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    fn term_freq(&self) -> u64 {
        if self.exhausted {
            0
        } else {
            self.spans.current_spans().len() as u64
        }
    }

    fn score(&self) -> f32 {
        match &self.scorer {
            Some(scorer) if !self.exhausted => scorer.score(self.doc_id(), self.spans.sloppy_freq()),
            _ => 0.0,
        }
    }
}

//! The query tree.
//!
//! Queries are immutable and shared as `Arc<Query>`. A rewrite that changes
//! nothing hands back the very same `Arc`, so callers detect "no change" with
//! [`Arc::ptr_eq`] rather than a structural comparison.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::mem;
use std::sync::Arc;

use crate::error::Result;
use crate::index::term::Term;
use crate::query::boolean::{BooleanClause, BooleanQuery};
use crate::query::boost::BoostQuery;
use crate::query::lazy::LazyTraverserQuery;
use crate::query::marked::{MarkContext, MarkedTermQuery};
use crate::query::min_frequency::{MinFrequencySpanTermQuery, MinFrequencyTermQuery};
use crate::query::multi_term::MultiTermQuery;
use crate::query::span::{
    SpanEmptyPayloadCheckQuery, SpanMinFrequencyFilterQuery, SpanMultiTermQuery, SpanNearQuery,
    SpanOrQuery, SpanTermQuery,
};
use crate::query::term::TermQuery;

/// A node of the query tree.
#[derive(Debug, Clone)]
pub enum Query {
    /// Documents containing a term.
    Term(TermQuery),
    /// A term query tagged by a marking pass.
    MarkedTerm(MarkedTermQuery),
    /// Documents containing a term at least a given number of times.
    MinFrequencyTerm(MinFrequencyTermQuery),
    /// Prefix, wildcard or range; expanded against the index before execution.
    MultiTerm(MultiTermQuery),
    /// Multiplies the score of the inner query.
    Boost(BoostQuery),
    /// Must / should / must-not combination.
    Boolean(BooleanQuery),
    /// Every occurrence of a term, as a span.
    SpanTerm(SpanTermQuery),
    /// Occurrences of a term in documents where it occurs often enough.
    MinFrequencySpanTerm(MinFrequencySpanTermQuery),
    /// A multi-term query enumerated as spans.
    SpanMultiTerm(SpanMultiTermQuery),
    /// Union of span queries on one field.
    SpanOr(SpanOrQuery),
    /// Span queries within a slop of each other.
    SpanNear(SpanNearQuery),
    /// Spans whose occurrences carry no payload.
    SpanEmptyPayloadCheck(SpanEmptyPayloadCheckQuery),
    /// Documents with at least a given number of spans.
    SpanMinFrequencyFilter(SpanMinFrequencyFilterQuery),
    /// A query whose traversal is deferred until it is bound to an index.
    Lazy(LazyTraverserQuery),
    /// Matches nothing.
    MatchNone,
}

impl Query {
    /// `field:text`.
    pub fn term(field: &str, text: &str) -> Arc<Query> {
        Arc::new(Query::Term(TermQuery::new(Term::new(field, text))))
    }

    /// `field:text#label`.
    pub fn marked_term(field: &str, text: &str, context: MarkContext) -> Arc<Query> {
        Arc::new(Query::MarkedTerm(MarkedTermQuery::new(
            Term::new(field, text),
            context,
        )))
    }

    /// `field:text/a<min>`; the threshold must be at least one.
    pub fn min_frequency_term(field: &str, text: &str, min_frequency: u32) -> Result<Arc<Query>> {
        Ok(Arc::new(Query::MinFrequencyTerm(MinFrequencyTermQuery::new(
            Term::new(field, text),
            min_frequency,
        )?)))
    }

    /// A span over every occurrence of `field:text`.
    pub fn span_term(field: &str, text: &str) -> Arc<Query> {
        Arc::new(Query::SpanTerm(SpanTermQuery::new(Term::new(field, text))))
    }

    /// Span occurrences of `field:text` in documents where it occurs at least `min_frequency` times.
    pub fn min_frequency_span_term(
        field: &str,
        text: &str,
        min_frequency: u32,
    ) -> Result<Arc<Query>> {
        Ok(Arc::new(Query::MinFrequencySpanTerm(
            MinFrequencySpanTermQuery::new(Term::new(field, text), min_frequency)?,
        )))
    }

    /// Wrap a multi-term query.
    pub fn multi_term(query: MultiTermQuery) -> Arc<Query> {
        Arc::new(Query::MultiTerm(query))
    }

    /// `(inner)^boost`.
    pub fn boost(inner: Arc<Query>, boost: f32) -> Arc<Query> {
        Arc::new(Query::Boost(BoostQuery::new(inner, boost)))
    }

    /// A boolean query over the given clauses.
    pub fn boolean(clauses: Vec<BooleanClause>) -> Arc<Query> {
        Arc::new(Query::Boolean(BooleanQuery::from_clauses(clauses)))
    }

    /// The query that matches nothing.
    pub fn match_none() -> Arc<Query> {
        Arc::new(Query::MatchNone)
    }

    /// Whether this node enumerates spans.
    pub fn is_span(&self) -> bool {
        match self {
            Query::SpanTerm(_)
            | Query::MinFrequencySpanTerm(_)
            | Query::SpanMultiTerm(_)
            | Query::SpanOr(_)
            | Query::SpanNear(_)
            | Query::SpanEmptyPayloadCheck(_)
            | Query::SpanMinFrequencyFilter(_) => true,
            Query::Lazy(lazy) => lazy.query().is_span(),
            _ => false,
        }
    }

    /// The field of a span node, `None` for everything else.
    pub fn span_field(&self) -> Option<&str> {
        match self {
            Query::SpanTerm(q) => Some(q.term().field()),
            Query::MinFrequencySpanTerm(q) => Some(q.term().field()),
            Query::SpanMultiTerm(q) => Some(q.query().field()),
            Query::SpanOr(q) => Some(q.field()),
            Query::SpanNear(q) => Some(q.field()),
            Query::SpanEmptyPayloadCheck(q) => q.inner().span_field(),
            Query::SpanMinFrequencyFilter(q) => q.inner().span_field(),
            Query::Lazy(lazy) => lazy.query().span_field(),
            _ => None,
        }
    }
}

impl PartialEq for Query {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            // A lazy wrapper is indistinguishable from the query it wraps.
            (Query::Lazy(a), _) => a.query().as_ref() == other,
            (_, Query::Lazy(b)) => self == b.query().as_ref(),
            (Query::Term(a), Query::Term(b)) => a == b,
            (Query::MarkedTerm(a), Query::MarkedTerm(b)) => a == b,
            (Query::MinFrequencyTerm(a), Query::MinFrequencyTerm(b)) => a == b,
            (Query::MultiTerm(a), Query::MultiTerm(b)) => a == b,
            (Query::Boost(a), Query::Boost(b)) => a == b,
            (Query::Boolean(a), Query::Boolean(b)) => a == b,
            (Query::SpanTerm(a), Query::SpanTerm(b)) => a == b,
            (Query::MinFrequencySpanTerm(a), Query::MinFrequencySpanTerm(b)) => a == b,
            (Query::SpanMultiTerm(a), Query::SpanMultiTerm(b)) => a == b,
            (Query::SpanOr(a), Query::SpanOr(b)) => a == b,
            (Query::SpanNear(a), Query::SpanNear(b)) => a == b,
            (Query::SpanEmptyPayloadCheck(a), Query::SpanEmptyPayloadCheck(b)) => a == b,
            (Query::SpanMinFrequencyFilter(a), Query::SpanMinFrequencyFilter(b)) => a == b,
            (Query::MatchNone, Query::MatchNone) => true,
            _ => false,
        }
    }
}

impl Eq for Query {}

impl Hash for Query {
    fn hash<H: Hasher>(&self, state: &mut H) {
        if let Query::Lazy(lazy) = self {
            lazy.query().hash(state);
            return;
        }

        mem::discriminant(self).hash(state);
        match self {
            Query::Term(q) => q.hash(state),
            Query::MarkedTerm(q) => q.hash(state),
            Query::MinFrequencyTerm(q) => q.hash(state),
            Query::MultiTerm(q) => q.hash(state),
            Query::Boost(q) => q.hash(state),
            Query::Boolean(q) => q.hash(state),
            Query::SpanTerm(q) => q.hash(state),
            Query::MinFrequencySpanTerm(q) => q.hash(state),
            Query::SpanMultiTerm(q) => q.hash(state),
            Query::SpanOr(q) => q.hash(state),
            Query::SpanNear(q) => q.hash(state),
            Query::SpanEmptyPayloadCheck(q) => q.hash(state),
            Query::SpanMinFrequencyFilter(q) => q.hash(state),
            Query::Lazy(_) | Query::MatchNone => {}
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::Term(q) => q.fmt(f),
            Query::MarkedTerm(q) => q.fmt(f),
            Query::MinFrequencyTerm(q) => q.fmt(f),
            Query::MultiTerm(q) => q.fmt(f),
            Query::Boost(q) => q.fmt(f),
            Query::Boolean(q) => q.fmt(f),
            Query::SpanTerm(q) => q.fmt(f),
            Query::MinFrequencySpanTerm(q) => q.fmt(f),
            Query::SpanMultiTerm(q) => q.fmt(f),
            Query::SpanOr(q) => q.fmt(f),
            Query::SpanNear(q) => q.fmt(f),
            Query::SpanEmptyPayloadCheck(q) => q.fmt(f),
            Query::SpanMinFrequencyFilter(q) => q.fmt(f),
            Query::Lazy(q) => q.fmt(f),
            Query::MatchNone => f.write_str("MatchNoDocsQuery"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::query::boolean::Occur;

    #[test]
    fn test_display() {
        let boolean = Query::boolean(vec![
            BooleanClause::must(Query::term("body", "a")),
            BooleanClause::should(Query::boost(Query::term("body", "b"), 2.0)),
            BooleanClause::must_not(Query::term("body", "c")),
        ]);
        assert_eq!(boolean.to_string(), "+body:a (body:b)^2 -body:c");
        assert_eq!(Query::match_none().to_string(), "MatchNoDocsQuery");
        assert_eq!(
            Query::min_frequency_term("body", "a", 3).unwrap().to_string(),
            "body:a/a3"
        );
    }

    #[test]
    fn test_structural_equality() {
        assert_eq!(Query::term("body", "a"), Query::term("body", "a"));
        assert_ne!(Query::term("body", "a"), Query::span_term("body", "a"));
        assert_ne!(
            Query::boost(Query::term("body", "a"), 2.0),
            Query::boost(Query::term("body", "a"), 3.0)
        );

        let set: HashSet<Arc<Query>> = [Query::term("body", "a"), Query::term("body", "a")]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_marked_terms_compare_by_context() {
        let first = MarkContext::new("pass");
        let second = MarkContext::new("pass");
        assert_eq!(
            Query::marked_term("body", "a", first.clone()),
            Query::marked_term("body", "a", first.clone())
        );
        assert_ne!(
            Query::marked_term("body", "a", first),
            Query::marked_term("body", "a", second)
        );
    }

    #[test]
    fn test_span_classification() {
        let span = Query::span_term("body", "a");
        assert!(span.is_span());
        assert_eq!(span.span_field(), Some("body"));
        assert!(!Query::term("body", "a").is_span());
        assert_eq!(Query::term("body", "a").span_field(), None);

        let boolean = Query::boolean(vec![BooleanClause::new(span, Occur::Should)]);
        assert!(!boolean.is_span());
    }
}

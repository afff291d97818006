//! Requiring a minimum frequency for every term.

use std::sync::Arc;

use crate::error::{Result, TermwalkError};
use crate::mapping::context::SearchExecutionContext;
use crate::query::min_frequency::MinFrequencyTermQuery;
use crate::query::node::Query;
use crate::traversal::context::TraverserContext;
use crate::traversal::handler::QueryHandler;
use crate::traversal::handlers::{exact_span_term, min_frequency_filter};
use crate::traversal::traverser::QueryTraverser;

/// Turns every plain term query into one that requires `min_frequency`
/// occurrences.
///
/// On tokenized fields only payload-free occurrences are counted; on other
/// fields the term becomes a [`MinFrequencyTermQuery`].
#[derive(Debug, Clone, Copy)]
pub struct TransformTermQueryToMinFrequencyTermQueryHandler {
    min_frequency: u32,
}

impl TransformTermQueryToMinFrequencyTermQueryHandler {
    pub fn new(min_frequency: u32) -> Result<Self> {
        if min_frequency == 0 {
            return Err(TermwalkError::invalid_argument(
                "minimum frequency must be at least 1",
            ));
        }
        Ok(TransformTermQueryToMinFrequencyTermQueryHandler { min_frequency })
    }

    pub fn min_frequency(&self) -> u32 {
        self.min_frequency
    }
}

impl QueryHandler for TransformTermQueryToMinFrequencyTermQueryHandler {
    fn accept(
        &self,
        _traverser_ctx: &TraverserContext,
        _ctx: &SearchExecutionContext,
        query: &Arc<Query>,
    ) -> bool {
        matches!(query.as_ref(), Query::Term(_))
    }

    fn transform(
        &self,
        _traverser_ctx: &TraverserContext,
        ctx: &SearchExecutionContext,
        query: &Arc<Query>,
        _traverser: &QueryTraverser,
    ) -> Result<Arc<Query>> {
        let Query::Term(q) = query.as_ref() else {
            return Ok(query.clone());
        };
        if ctx.is_tokenized(q.term().field()) {
            return min_frequency_filter(exact_span_term(q.term())?, self.min_frequency);
        }
        Ok(Arc::new(Query::MinFrequencyTerm(MinFrequencyTermQuery::new(
            q.term().clone(),
            self.min_frequency,
        )?)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traversal::handlers::test_support::context;

    #[test]
    fn test_zero_rejected() {
        assert!(TransformTermQueryToMinFrequencyTermQueryHandler::new(0).is_err());
    }

    #[test]
    fn test_transform() {
        let ctx = context();
        let tctx = TraverserContext::new();
        let handler = TransformTermQueryToMinFrequencyTermQueryHandler::new(2).unwrap();
        let traverser = QueryTraverser::new(vec![Arc::new(handler)]);

        let body = traverser
            .traverse(&tctx, &ctx, &Query::term("body", "fox"))
            .unwrap();
        assert_eq!(
            body.to_string(),
            "SpanMinFrequencyFilter(SpanEmptyPayloadCheck(body:fox), 2)"
        );

        let tag = traverser
            .traverse(&tctx, &ctx, &Query::term("tag", "fox"))
            .unwrap();
        assert_eq!(tag, Query::min_frequency_term("tag", "fox", 2).unwrap());
    }
}

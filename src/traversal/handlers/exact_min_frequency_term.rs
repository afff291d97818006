//! Exact matching of minimum-frequency term queries.

use std::sync::Arc;

use crate::error::Result;
use crate::mapping::context::SearchExecutionContext;
use crate::query::node::Query;
use crate::traversal::context::TraverserContext;
use crate::traversal::handler::QueryHandler;
use crate::traversal::handlers::{exact_span_term, min_frequency_filter};
use crate::traversal::traverser::QueryTraverser;

/// Replaces a minimum-frequency term query on a tokenized field with a filter
/// that counts only payload-free occurrences of the term.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactMinFrequencyTermQueryHandler;

impl ExactMinFrequencyTermQueryHandler {
    pub fn new() -> Self {
        ExactMinFrequencyTermQueryHandler
    }
}

impl QueryHandler for ExactMinFrequencyTermQueryHandler {
    fn accept(
        &self,
        _traverser_ctx: &TraverserContext,
        _ctx: &SearchExecutionContext,
        query: &Arc<Query>,
    ) -> bool {
        matches!(query.as_ref(), Query::MinFrequencyTerm(_))
    }

    fn transform(
        &self,
        _traverser_ctx: &TraverserContext,
        ctx: &SearchExecutionContext,
        query: &Arc<Query>,
        _traverser: &QueryTraverser,
    ) -> Result<Arc<Query>> {
        match query.as_ref() {
            Query::MinFrequencyTerm(q) if ctx.is_tokenized(q.term().field()) => {
                min_frequency_filter(exact_span_term(q.term())?, q.min_frequency())
            }
            _ => Ok(query.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traversal::handlers::test_support::context;

    #[test]
    fn test_min_frequency_term() {
        let ctx = context();
        let tctx = TraverserContext::new();
        let traverser =
            QueryTraverser::new(vec![Arc::new(ExactMinFrequencyTermQueryHandler::new())]);

        let query = Query::min_frequency_term("body", "fox", 3).unwrap();
        let result = traverser.traverse(&tctx, &ctx, &query).unwrap();
        assert_eq!(
            result.to_string(),
            "SpanMinFrequencyFilter(SpanEmptyPayloadCheck(body:fox), 3)"
        );

        let keyword = Query::min_frequency_term("tag", "fox", 3).unwrap();
        assert!(Arc::ptr_eq(&traverser.traverse(&tctx, &ctx, &keyword).unwrap(), &keyword));
    }
}

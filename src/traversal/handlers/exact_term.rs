//! Exact matching of term queries.

use std::sync::Arc;

use crate::error::Result;
use crate::mapping::context::SearchExecutionContext;
use crate::query::marked::MarkContext;
use crate::query::node::Query;
use crate::traversal::booster::boost_exact;
use crate::traversal::context::TraverserContext;
use crate::traversal::handler::QueryHandler;
use crate::traversal::handlers::exact_span_term;
use crate::traversal::traverser::QueryTraverser;

/// Replaces term and marked term queries on tokenized fields with their exact
/// form, the occurrences that carry no payload.
///
/// When the traverser context asks for exact-token boosting, the original term
/// is kept and the exact form becomes a boosted optional clause instead.
/// Terms marked as coming from a phrase are always made exact.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactTermQueryHandler;

impl ExactTermQueryHandler {
    pub fn new() -> Self {
        ExactTermQueryHandler
    }
}

impl QueryHandler for ExactTermQueryHandler {
    fn accept(
        &self,
        _traverser_ctx: &TraverserContext,
        _ctx: &SearchExecutionContext,
        query: &Arc<Query>,
    ) -> bool {
        matches!(query.as_ref(), Query::Term(_) | Query::MarkedTerm(_))
    }

    fn transform(
        &self,
        traverser_ctx: &TraverserContext,
        ctx: &SearchExecutionContext,
        query: &Arc<Query>,
        _traverser: &QueryTraverser,
    ) -> Result<Arc<Query>> {
        let (term, phrase) = match query.as_ref() {
            Query::Term(q) => (q.term(), false),
            Query::MarkedTerm(q) => (q.term(), *q.context() == MarkContext::phrase()),
            _ => return Ok(query.clone()),
        };
        if !ctx.is_tokenized(term.field()) {
            return Ok(query.clone());
        }

        let exact = exact_span_term(term)?;
        match traverser_ctx.boost_exact_tokens() {
            Some(factor) if !phrase => Ok(boost_exact(query.clone(), exact, factor)),
            _ => Ok(exact),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traversal::handlers::test_support::context;

    fn traverser() -> QueryTraverser {
        QueryTraverser::new(vec![Arc::new(ExactTermQueryHandler::new())])
    }

    #[test]
    fn test_exact_span_for_tokenized_field() {
        let ctx = context();
        let result = traverser()
            .traverse(&TraverserContext::new(), &ctx, &Query::term("body", "fox"))
            .unwrap();
        assert_eq!(result.to_string(), "SpanEmptyPayloadCheck(body:fox)");
    }

    #[test]
    fn test_keyword_field_unchanged() {
        let ctx = context();
        let query = Query::term("tag", "fox");
        let result = traverser()
            .traverse(&TraverserContext::new(), &ctx, &query)
            .unwrap();
        assert!(Arc::ptr_eq(&result, &query));
    }

    #[test]
    fn test_boost_exact_tokens() {
        let ctx = context();
        let tctx = TraverserContext::new().with_boost_exact_tokens(2.0);
        let result = traverser()
            .traverse(&tctx, &ctx, &Query::term("body", "fox"))
            .unwrap();
        assert_eq!(
            result.to_string(),
            "body:fox (SpanEmptyPayloadCheck(body:fox))^2"
        );
    }

    #[test]
    fn test_phrase_terms_are_never_boosted() {
        let ctx = context();
        let tctx = TraverserContext::new().with_boost_exact_tokens(2.0);
        let query = Query::marked_term("body", "fox", MarkContext::phrase());
        let result = traverser().traverse(&tctx, &ctx, &query).unwrap();
        assert_eq!(result.to_string(), "SpanEmptyPayloadCheck(body:fox)");
    }
}

//! Exact matching of terms marked by an earlier pass.

use std::sync::Arc;

use crate::error::Result;
use crate::mapping::context::SearchExecutionContext;
use crate::query::marked::MarkContext;
use crate::query::node::Query;
use crate::traversal::context::TraverserContext;
use crate::traversal::handler::QueryHandler;
use crate::traversal::handlers::exact_span_term;
use crate::traversal::traverser::QueryTraverser;

/// Turns terms marked with one particular context into exact span terms.
///
/// Terms marked with any other context are left alone.
#[derive(Debug, Clone)]
pub struct ExactMarkedTermQueryHandler {
    context: MarkContext,
}

impl ExactMarkedTermQueryHandler {
    pub fn new(context: MarkContext) -> Self {
        ExactMarkedTermQueryHandler { context }
    }
}

impl QueryHandler for ExactMarkedTermQueryHandler {
    fn accept(
        &self,
        _traverser_ctx: &TraverserContext,
        _ctx: &SearchExecutionContext,
        query: &Arc<Query>,
    ) -> bool {
        matches!(query.as_ref(), Query::MarkedTerm(_))
    }

    fn transform(
        &self,
        _traverser_ctx: &TraverserContext,
        ctx: &SearchExecutionContext,
        query: &Arc<Query>,
        _traverser: &QueryTraverser,
    ) -> Result<Arc<Query>> {
        match query.as_ref() {
            Query::MarkedTerm(marked)
                if *marked.context() == self.context && ctx.is_tokenized(marked.term().field()) =>
            {
                exact_span_term(marked.term())
            }
            _ => Ok(query.clone()),
        }
    }
}

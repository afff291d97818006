//! Exact matching of prefix and wildcard queries.

use std::sync::Arc;

use crate::error::Result;
use crate::mapping::context::SearchExecutionContext;
use crate::query::node::Query;
use crate::traversal::context::TraverserContext;
use crate::traversal::handler::QueryHandler;
use crate::traversal::handlers::exact_span_multi_term;
use crate::traversal::traverser::QueryTraverser;

/// Replaces prefix and wildcard queries on tokenized fields with span queries
/// over their payload-free occurrences.
///
/// Ranges, and multi-term queries carrying a minimum frequency, are left to
/// other handlers.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactMultiTermQueryHandler;

impl ExactMultiTermQueryHandler {
    pub fn new() -> Self {
        ExactMultiTermQueryHandler
    }
}

impl QueryHandler for ExactMultiTermQueryHandler {
    fn accept(
        &self,
        _traverser_ctx: &TraverserContext,
        _ctx: &SearchExecutionContext,
        query: &Arc<Query>,
    ) -> bool {
        match query.as_ref() {
            Query::MultiTerm(q) => !q.is_range() && q.min_frequency().is_none(),
            _ => false,
        }
    }

    fn transform(
        &self,
        _traverser_ctx: &TraverserContext,
        ctx: &SearchExecutionContext,
        query: &Arc<Query>,
        _traverser: &QueryTraverser,
    ) -> Result<Arc<Query>> {
        match query.as_ref() {
            Query::MultiTerm(q) if ctx.is_tokenized(q.field()) => exact_span_multi_term(q.clone()),
            _ => Ok(query.clone()),
        }
    }
}

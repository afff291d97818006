//! Exact matching of prefix queries with a minimum frequency.

use std::sync::Arc;

use crate::error::Result;
use crate::mapping::context::SearchExecutionContext;
use crate::query::node::Query;
use crate::traversal::context::TraverserContext;
use crate::traversal::handler::QueryHandler;
use crate::traversal::handlers::{exact_span_multi_term, min_frequency_filter};
use crate::traversal::traverser::QueryTraverser;

/// Replaces a multi-term query carrying a minimum frequency with a filter that
/// counts only payload-free occurrences of its expansions.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactMinFrequencyPrefixQueryHandler;

impl ExactMinFrequencyPrefixQueryHandler {
    pub fn new() -> Self {
        ExactMinFrequencyPrefixQueryHandler
    }
}

impl QueryHandler for ExactMinFrequencyPrefixQueryHandler {
    fn accept(
        &self,
        _traverser_ctx: &TraverserContext,
        _ctx: &SearchExecutionContext,
        query: &Arc<Query>,
    ) -> bool {
        matches!(query.as_ref(), Query::MultiTerm(q) if q.min_frequency().is_some())
    }

    fn transform(
        &self,
        _traverser_ctx: &TraverserContext,
        ctx: &SearchExecutionContext,
        query: &Arc<Query>,
        _traverser: &QueryTraverser,
    ) -> Result<Arc<Query>> {
        let Query::MultiTerm(q) = query.as_ref() else {
            return Ok(query.clone());
        };
        match q.min_frequency() {
            Some(min_frequency) if ctx.is_tokenized(q.field()) => {
                let exact = exact_span_multi_term(q.without_min_frequency())?;
                min_frequency_filter(exact, min_frequency)
            }
            _ => Ok(query.clone()),
        }
    }
}

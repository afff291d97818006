//! Deferring traversal of range queries until they are bound to an index.

use std::sync::Arc;

use crate::error::Result;
use crate::mapping::context::SearchExecutionContext;
use crate::query::lazy::LazyTraverserQuery;
use crate::query::node::Query;
use crate::traversal::context::TraverserContext;
use crate::traversal::handler::QueryHandler;
use crate::traversal::traverser::QueryTraverser;

/// Wraps range queries so that the chain runs over their expanded terms.
#[derive(Debug, Clone, Copy, Default)]
pub struct LazyRangeQueryHandler;

impl LazyRangeQueryHandler {
    pub fn new() -> Self {
        LazyRangeQueryHandler
    }
}

impl QueryHandler for LazyRangeQueryHandler {
    fn accept(
        &self,
        _traverser_ctx: &TraverserContext,
        _ctx: &SearchExecutionContext,
        query: &Arc<Query>,
    ) -> bool {
        matches!(query.as_ref(), Query::MultiTerm(q) if q.is_range())
    }

    fn transform(
        &self,
        traverser_ctx: &TraverserContext,
        ctx: &SearchExecutionContext,
        query: &Arc<Query>,
        traverser: &QueryTraverser,
    ) -> Result<Arc<Query>> {
        Ok(Arc::new(Query::Lazy(LazyTraverserQuery::new(
            query.clone(),
            traverser.clone(),
            *traverser_ctx,
            ctx.clone(),
        ))))
    }
}

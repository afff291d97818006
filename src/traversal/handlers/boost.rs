//! Traversal of boost wrappers.

use std::sync::Arc;

use crate::error::Result;
use crate::mapping::context::SearchExecutionContext;
use crate::query::node::Query;
use crate::traversal::context::TraverserContext;
use crate::traversal::handler::QueryHandler;
use crate::traversal::traverser::QueryTraverser;

/// Traverses the inner query of a boost and rebuilds the wrapper only if the
/// inner query changed.
#[derive(Debug, Clone, Copy, Default)]
pub struct CloneOnChangeBoostQueryHandler;

impl CloneOnChangeBoostQueryHandler {
    pub fn new() -> Self {
        CloneOnChangeBoostQueryHandler
    }
}

impl QueryHandler for CloneOnChangeBoostQueryHandler {
    fn accept(
        &self,
        _traverser_ctx: &TraverserContext,
        _ctx: &SearchExecutionContext,
        query: &Arc<Query>,
    ) -> bool {
        matches!(query.as_ref(), Query::Boost(_))
    }

    fn transform(
        &self,
        traverser_ctx: &TraverserContext,
        ctx: &SearchExecutionContext,
        query: &Arc<Query>,
        traverser: &QueryTraverser,
    ) -> Result<Arc<Query>> {
        let Query::Boost(boost) = query.as_ref() else {
            return Ok(query.clone());
        };
        let inner = traverser.traverse(traverser_ctx, ctx, boost.query())?;
        if Arc::ptr_eq(&inner, boost.query()) {
            return Ok(query.clone());
        }
        Ok(Arc::new(Query::Boost(boost.with_query(inner))))
    }
}

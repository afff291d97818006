//! Tagging term queries with a mark context.

use std::sync::Arc;

use crate::error::Result;
use crate::mapping::context::SearchExecutionContext;
use crate::query::marked::{MarkContext, MarkedTermQuery};
use crate::query::node::Query;
use crate::traversal::context::TraverserContext;
use crate::traversal::handler::QueryHandler;
use crate::traversal::traverser::QueryTraverser;

/// Turns plain term queries on tokenized fields into marked term queries.
#[derive(Debug, Clone)]
pub struct MarkTermQueryHandler {
    context: MarkContext,
}

impl MarkTermQueryHandler {
    /// Mark terms with `context`.
    pub fn new(context: MarkContext) -> Self {
        MarkTermQueryHandler { context }
    }

    pub fn context(&self) -> &MarkContext {
        &self.context
    }
}

impl QueryHandler for MarkTermQueryHandler {
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
        match query.as_ref() {
            Query::Term(term) if ctx.is_tokenized(term.term().field()) => Ok(Arc::new(
                Query::MarkedTerm(MarkedTermQuery::new(term.term().clone(), self.context.clone())),
            )),
            _ => Ok(query.clone()),
        }
    }
}

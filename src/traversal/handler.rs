//! The query handler trait.

use std::fmt::Debug;
use std::sync::Arc;

use crate::error::Result;
use crate::mapping::context::SearchExecutionContext;
use crate::query::node::Query;
use crate::traversal::context::TraverserContext;
use crate::traversal::traverser::QueryTraverser;

/// A single rewrite rule in a traversal chain.
///
/// `accept` decides whether the handler is responsible for a node; it must be
/// pure. `transform` is only called after `accept` returned true. A handler
/// that decides not to change the node returns the same `Arc` it was given.
pub trait QueryHandler: Send + Sync + Debug {
    /// Whether this handler is responsible for `query`.
    fn accept(
        &self,
        traverser_ctx: &TraverserContext,
        ctx: &SearchExecutionContext,
        query: &Arc<Query>,
    ) -> bool;

    /// Rewrite `query`.
    ///
    /// Handlers for composite nodes may call back into `traverser` for the
    /// children they own.
    fn transform(
        &self,
        traverser_ctx: &TraverserContext,
        ctx: &SearchExecutionContext,
        query: &Arc<Query>,
        traverser: &QueryTraverser,
    ) -> Result<Arc<Query>>;
}

//! Deferred traversal.
//!
//! Some queries can only be rewritten meaningfully once they are bound to an
//! index: a range query, for example, does not know its terms before it is
//! expanded against the term dictionary. [`LazyTraverserQuery`] carries the
//! traverser and both contexts along with such a query and runs the traversal
//! at bind time, on the expanded form.

use std::fmt;
use std::sync::Arc;

use log::{debug, trace};

use crate::error::Result;
use crate::mapping::context::SearchExecutionContext;
use crate::query::node::Query;
use crate::query::searcher::IndexSearcher;
use crate::traversal::context::TraverserContext;
use crate::traversal::traverser::QueryTraverser;

/// A query whose traversal runs when it is bound to an index.
///
/// Compares and hashes as the wrapped query.
#[derive(Debug, Clone)]
pub struct LazyTraverserQuery {
    query: Arc<Query>,
    traverser: QueryTraverser,
    traverser_ctx: TraverserContext,
    ctx: SearchExecutionContext,
}

impl LazyTraverserQuery {
    /// Defer the traversal of `query`.
    pub fn new(
        query: Arc<Query>,
        traverser: QueryTraverser,
        traverser_ctx: TraverserContext,
        ctx: SearchExecutionContext,
    ) -> Self {
        LazyTraverserQuery {
            query,
            traverser,
            traverser_ctx,
            ctx,
        }
    }

    /// Get the wrapped query.
    pub fn query(&self) -> &Arc<Query> {
        &self.query
    }

    /// Get the deferred traverser.
    pub fn traverser(&self) -> &QueryTraverser {
        &self.traverser
    }

    /// Bind to `searcher`.
    ///
    /// The wrapped query takes one rewrite step against the index. When that
    /// changes it, the traverser runs over the result; otherwise the wrapped
    /// query is returned as is.
    pub fn bind(&self, searcher: &IndexSearcher) -> Result<Arc<Query>> {
        let rewritten = searcher.rewrite_step(&self.query)?;
        if Arc::ptr_eq(&rewritten, &self.query) || rewritten == self.query {
            trace!("lazy query [{}] unchanged by binding", self.query);
            return Ok(self.query.clone());
        }

        debug!(
            "lazy query [{}] bound to [{}], traversing",
            self.query, rewritten
        );
        self.traverser
            .traverse(&self.traverser_ctx, &self.ctx, &rewritten)
    }
}

impl fmt::Display for LazyTraverserQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LazyTraverserQuery({})", self.query)
    }
}

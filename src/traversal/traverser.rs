//! Chain-of-responsibility traversal over the query tree.

use std::sync::Arc;

use log::{debug, trace};

use crate::error::{Result, TermwalkError};
use crate::mapping::context::SearchExecutionContext;
use crate::query::boolean::{BooleanClause, BooleanQuery};
use crate::query::node::Query;
use crate::traversal::context::TraverserContext;
use crate::traversal::handler::QueryHandler;

/// Runs a query tree through an ordered chain of handlers.
///
/// The first handler that accepts a node rewrites it. Its output is handed to
/// the next accepting handler other than itself, until nothing accepts it or a
/// handler leaves it unchanged. Nodes no handler accepts are left as they are,
/// except that the children of boost and boolean nodes are traversed.
///
/// Cloning is cheap; the chain is shared.
#[derive(Debug, Clone)]
pub struct QueryTraverser {
    handlers: Arc<[Arc<dyn QueryHandler>]>,
}

impl QueryTraverser {
    /// Create a traverser over `handlers`, tried in order.
    pub fn new(handlers: Vec<Arc<dyn QueryHandler>>) -> Self {
        QueryTraverser {
            handlers: handlers.into(),
        }
    }

    /// The handler chain.
    pub fn handlers(&self) -> &[Arc<dyn QueryHandler>] {
        &self.handlers
    }

    /// Rewrite `query`. Returns the same `Arc` when nothing changed.
    pub fn traverse(
        &self,
        traverser_ctx: &TraverserContext,
        ctx: &SearchExecutionContext,
        query: &Arc<Query>,
    ) -> Result<Arc<Query>> {
        match self.find_handler(traverser_ctx, ctx, query, None) {
            Some(index) => self.dispatch(traverser_ctx, ctx, query, index),
            None => self.traverse_children(traverser_ctx, ctx, query),
        }
    }

    fn find_handler(
        &self,
        traverser_ctx: &TraverserContext,
        ctx: &SearchExecutionContext,
        query: &Arc<Query>,
        skip: Option<usize>,
    ) -> Option<usize> {
        self.handlers
            .iter()
            .enumerate()
            .find(|(i, handler)| Some(*i) != skip && handler.accept(traverser_ctx, ctx, query))
            .map(|(i, _)| i)
    }

    fn dispatch(
        &self,
        traverser_ctx: &TraverserContext,
        ctx: &SearchExecutionContext,
        query: &Arc<Query>,
        mut index: usize,
    ) -> Result<Arc<Query>> {
        let max_passes = ctx.settings().max_rewrite_passes;
        let mut current = query.clone();

        for _ in 0..max_passes {
            let handler = &self.handlers[index];
            let next = handler.transform(traverser_ctx, ctx, &current, self)?;
            if Arc::ptr_eq(&next, &current) {
                trace!("{handler:?} left [{current}] unchanged");
                return Ok(current);
            }
            debug!("{handler:?} rewrote [{current}] to [{next}]");

            match self.find_handler(traverser_ctx, ctx, &next, Some(index)) {
                Some(next_index) => {
                    index = next_index;
                    current = next;
                }
                None => return Ok(next),
            }
        }

        Err(TermwalkError::invariant(format!(
            "traversal of [{query}] did not converge after {max_passes} passes"
        )))
    }

    fn traverse_children(
        &self,
        traverser_ctx: &TraverserContext,
        ctx: &SearchExecutionContext,
        query: &Arc<Query>,
    ) -> Result<Arc<Query>> {
        match query.as_ref() {
            Query::Boost(boost) => {
                let inner = self.traverse(traverser_ctx, ctx, boost.query())?;
                if Arc::ptr_eq(&inner, boost.query()) {
                    return Ok(query.clone());
                }
                Ok(Arc::new(Query::Boost(boost.with_query(inner))))
            }
            Query::Boolean(boolean) => {
                let mut changed = false;
                let mut clauses = Vec::with_capacity(boolean.clauses().len());
                for clause in boolean.clauses() {
                    let rewritten = self.traverse(traverser_ctx, ctx, &clause.query)?;
                    changed |= !Arc::ptr_eq(&rewritten, &clause.query);
                    clauses.push(BooleanClause::new(rewritten, clause.occur));
                }
                if !changed {
                    return Ok(query.clone());
                }
                Ok(Arc::new(Query::Boolean(BooleanQuery::from_clauses(clauses))))
            }
            _ => {
                trace!("no handler for [{query}]");
                Ok(query.clone())
            }
        }
    }
}

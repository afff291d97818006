//! Combining a query with a boosted exact form of itself.

use std::sync::Arc;

use crate::query::boolean::BooleanClause;
use crate::query::node::Query;

/// `original` OR `(exact)^factor`.
///
/// Documents matching the original still match; those that also match the
/// exact form score higher.
pub fn boost_exact(original: Arc<Query>, exact: Arc<Query>, factor: f32) -> Arc<Query> {
    Query::boolean(vec![
        BooleanClause::should(original),
        BooleanClause::should(Query::boost(exact, factor)),
    ])
}

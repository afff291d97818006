//! Score boosting.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::query::node::Query;

/// Multiplies the scores of the wrapped query by a constant factor.
#[derive(Debug, Clone)]
pub struct BoostQuery {
    query: Arc<Query>,
    boost: f32,
}

impl BoostQuery {
    /// Create a new boost query.
    pub fn new(query: Arc<Query>, boost: f32) -> Self {
        BoostQuery { query, boost }
    }

    /// Get the wrapped query.
    pub fn query(&self) -> &Arc<Query> {
        &self.query
    }

    /// Get the boost factor.
    pub fn boost(&self) -> f32 {
        self.boost
    }

    /// The same boost around another query.
    pub fn with_query(&self, query: Arc<Query>) -> Self {
        BoostQuery {
            query,
            boost: self.boost,
        }
    }
}

impl PartialEq for BoostQuery {
    fn eq(&self, other: &Self) -> bool {
        self.boost.to_bits() == other.boost.to_bits() && self.query == other.query
    }
}

impl Eq for BoostQuery {}

impl Hash for BoostQuery {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.boost.to_bits().hash(state);
        self.query.hash(state);
    }
}

impl fmt::Display for BoostQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})^{}", self.query, self.boost)
    }
}

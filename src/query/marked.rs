//! Marked term queries.
//!
//! A [`MarkedTermQuery`] matches exactly like a term query but carries a
//! [`MarkContext`] so that a later rewrite pass can recognize terms that went
//! through an earlier one.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use lazy_static::lazy_static;
use uuid::Uuid;

use crate::index::term::Term;

lazy_static! {
    static ref PHRASE: MarkContext = MarkContext::new("phrase");
}

/// An identity token for a marking pass.
///
/// Contexts compare by identity only; two contexts created with the same
/// label are different. Clone a context to share it.
#[derive(Debug, Clone)]
pub struct MarkContext {
    id: Uuid,
    label: Arc<str>,
}

impl MarkContext {
    /// Create a fresh context. The label is only used for display.
    pub fn new(label: &str) -> Self {
        MarkContext {
            id: Uuid::new_v4(),
            label: Arc::from(label),
        }
    }

    /// The shared context for terms that came from phrase expansion.
    pub fn phrase() -> MarkContext {
        PHRASE.clone()
    }

    /// The display label.
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl PartialEq for MarkContext {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for MarkContext {}

impl Hash for MarkContext {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for MarkContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// A term query tagged with a [`MarkContext`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MarkedTermQuery {
    term: Term,
    context: MarkContext,
}

impl MarkedTermQuery {
    /// Create a new marked term query.
    pub fn new(term: Term, context: MarkContext) -> Self {
        MarkedTermQuery { term, context }
    }

    /// The term.
    pub fn term(&self) -> &Term {
        &self.term
    }

    /// The mark.
    pub fn context(&self) -> &MarkContext {
        &self.context
    }
}

impl fmt::Display for MarkedTermQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.term, self.context)
    }
}

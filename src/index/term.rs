//! Terms: the (field, text) pairs the index is keyed by.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single indexed term in a field.
///
/// Like Lucene's `Term`, the text is expected to be in its indexed
/// (already analyzed) form; nothing here lowercases or tokenizes it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Term {
    /// The field the term lives in.
    field: String,
    /// The term text.
    text: String,
}

impl Term {
    /// Create a new term.
    pub fn new<F, T>(field: F, text: T) -> Self
    where
        F: Into<String>,
        T: Into<String>,
    {
        Term {
            field: field.into(),
            text: text.into(),
        }
    }

    /// Get the field name.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Get the term text.
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.field, self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_display() {
        let term = Term::new("title", "hello");
        assert_eq!(term.field(), "title");
        assert_eq!(term.text(), "hello");
        assert_eq!(term.to_string(), "title:hello");
    }

    #[test]
    fn test_term_ordering() {
        let a = Term::new("body", "zebra");
        let b = Term::new("title", "apple");
        let c = Term::new("title", "banana");
        assert!(a < b);
        assert!(b < c);
    }
}

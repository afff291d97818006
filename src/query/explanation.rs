//! Score explanations.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A tree describing how a document's score was computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    matched: bool,
    value: f32,
    description: String,
    details: Vec<Explanation>,
}

impl Explanation {
    /// A matching node.
    pub fn matched<S: Into<String>>(value: f32, description: S) -> Self {
        Explanation {
            matched: true,
            value,
            description: description.into(),
            details: Vec::new(),
        }
    }

    /// A non-matching node; its value is zero.
    pub fn no_match<S: Into<String>>(description: S) -> Self {
        Explanation {
            matched: false,
            value: 0.0,
            description: description.into(),
            details: Vec::new(),
        }
    }

    /// Attach a detail.
    pub fn with_detail(mut self, detail: Explanation) -> Self {
        self.details.push(detail);
        self
    }

    /// Attach several details.
    pub fn with_details(mut self, details: Vec<Explanation>) -> Self {
        self.details.extend(details);
        self
    }

    /// Whether the document matched.
    pub fn is_match(&self) -> bool {
        self.matched
    }

    /// The score.
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Description of this node.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Child nodes.
    pub fn details(&self) -> &[Explanation] {
        &self.details
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        writeln!(f, "{:indent$}{} = {}", "", self.value, self.description, indent = depth * 2)?;
        for detail in &self.details {
            detail.write_indented(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for Explanation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}

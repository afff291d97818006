//! Per-traversal options.

use serde::{Deserialize, Serialize};

/// Options that apply to one traversal run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraverserContext {
    /// When set, exact-token handlers keep the original term and add the
    /// exact form as an optional clause boosted by this factor.
    boost_exact_tokens: Option<f32>,
}

impl TraverserContext {
    /// A context with no options set.
    pub fn new() -> Self {
        TraverserContext::default()
    }

    /// Boost exact tokens by `factor` instead of requiring them.
    pub fn with_boost_exact_tokens(mut self, factor: f32) -> Self {
        self.boost_exact_tokens = Some(factor);
        self
    }

    /// The exact-token boost factor, if any.
    pub fn boost_exact_tokens(&self) -> Option<f32> {
        self.boost_exact_tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json() {
        let ctx: TraverserContext = serde_json::from_str(r#"{"boost_exact_tokens": 2.5}"#).unwrap();
        assert_eq!(ctx.boost_exact_tokens(), Some(2.5));

        let empty: TraverserContext = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, TraverserContext::new());
    }
}

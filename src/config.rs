//! Configuration for searching and rewriting.
//!
//! Both [`SearchSettings`] and [`ChainConfig`] are plain serde types, so they can
//! be embedded in a host application's JSON configuration.

use std::sync::Arc;

use ahash::AHashMap;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TermwalkError};
use crate::query::marked::MarkContext;
use crate::traversal::handler::QueryHandler;
use crate::traversal::handlers::{
    CloneOnChangeBoostQueryHandler, ExactMarkedTermQueryHandler,
    ExactMinFrequencyPrefixQueryHandler, ExactMinFrequencyTermQueryHandler,
    ExactMultiTermQueryHandler, ExactTermQueryHandler, LazyRangeQueryHandler,
    MarkTermQueryHandler, TransformTermQueryToMinFrequencyTermQueryHandler,
};
use crate::traversal::traverser::QueryTraverser;

/// Limits and switches for query rewriting and execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Maximum number of boolean clauses produced by multi-term expansion,
    /// and maximum number of fields a field pattern may expand to.
    pub max_clause_count: usize,

    /// Maximum number of rewrite passes before a rewrite is declared
    /// non-converging. Bounds both handler re-dispatch and the searcher's
    /// rewrite fixpoint loop.
    pub max_rewrite_passes: usize,

    /// Search segments in parallel.
    pub parallel: bool,
}

impl Default for SearchSettings {
    fn default() -> Self {
        SearchSettings {
            max_clause_count: 1024,
            max_rewrite_passes: 16,
            parallel: false,
        }
    }
}

impl SearchSettings {
    /// Parse settings from JSON; missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Mark contexts by name, so that chain configurations can refer to them.
///
/// The shared phrase context is always registered as `"phrase"`.
#[derive(Debug, Clone)]
pub struct MarkContextRegistry {
    contexts: AHashMap<String, MarkContext>,
}

impl Default for MarkContextRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkContextRegistry {
    pub fn new() -> Self {
        let mut contexts = AHashMap::new();
        contexts.insert("phrase".to_string(), MarkContext::phrase());
        MarkContextRegistry { contexts }
    }

    /// Get the context registered under `name`, creating it first if needed.
    pub fn register(&mut self, name: &str) -> MarkContext {
        self.contexts
            .entry(name.to_string())
            .or_insert_with(|| MarkContext::new(name))
            .clone()
    }

    /// Get the context registered under `name`.
    pub fn get(&self, name: &str) -> Option<&MarkContext> {
        self.contexts.get(name)
    }

    fn resolve(&self, name: &str) -> Result<MarkContext> {
        self.get(name)
            .cloned()
            .ok_or_else(|| TermwalkError::config(format!("unknown mark context [{name}]")))
    }
}

/// One entry of a handler chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HandlerConfig {
    CloneOnChangeBoost,
    ExactTerm,
    MarkTerm { context: String },
    ExactMarkedTerm { context: String },
    ExactMultiTerm,
    ExactMinFrequencyPrefix,
    ExactMinFrequencyTerm,
    TransformTermToMinFrequency { min_frequency: u32 },
    LazyRange,
}

impl HandlerConfig {
    fn build(&self, registry: &MarkContextRegistry) -> Result<Arc<dyn QueryHandler>> {
        let handler: Arc<dyn QueryHandler> = match self {
            HandlerConfig::CloneOnChangeBoost => Arc::new(CloneOnChangeBoostQueryHandler::new()),
            HandlerConfig::ExactTerm => Arc::new(ExactTermQueryHandler::new()),
            HandlerConfig::MarkTerm { context } => {
                Arc::new(MarkTermQueryHandler::new(registry.resolve(context)?))
            }
            HandlerConfig::ExactMarkedTerm { context } => {
                Arc::new(ExactMarkedTermQueryHandler::new(registry.resolve(context)?))
            }
            HandlerConfig::ExactMultiTerm => Arc::new(ExactMultiTermQueryHandler::new()),
            HandlerConfig::ExactMinFrequencyPrefix => {
                Arc::new(ExactMinFrequencyPrefixQueryHandler::new())
            }
            HandlerConfig::ExactMinFrequencyTerm => {
                Arc::new(ExactMinFrequencyTermQueryHandler::new())
            }
            HandlerConfig::TransformTermToMinFrequency { min_frequency } => Arc::new(
                TransformTermQueryToMinFrequencyTermQueryHandler::new(*min_frequency)
                    .map_err(|e| TermwalkError::config(e.to_string()))?,
            ),
            HandlerConfig::LazyRange => Arc::new(LazyRangeQueryHandler::new()),
        };
        Ok(handler)
    }
}

/// An ordered handler chain, as configured.
///
/// ```
/// use termwalk::config::{ChainConfig, MarkContextRegistry};
///
/// let config = ChainConfig::from_json(r#"{
///     "handlers": [
///         {"type": "clone_on_change_boost"},
///         {"type": "mark_term", "context": "synonym"},
///         {"type": "exact_marked_term", "context": "synonym"}
///     ]
/// }"#).unwrap();
///
/// let mut registry = MarkContextRegistry::new();
/// registry.register("synonym");
/// let traverser = config.build(&registry).unwrap();
/// assert_eq!(traverser.handlers().len(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    pub handlers: Vec<HandlerConfig>,
}

impl ChainConfig {
    /// Parse a chain from JSON. Unknown handler types are configuration errors.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| TermwalkError::config(format!("invalid handler chain: {e}")))
    }

    /// Build a traverser. Mark contexts are looked up in `registry`; an
    /// unknown name is a configuration error.
    pub fn build(&self, registry: &MarkContextRegistry) -> Result<QueryTraverser> {
        let handlers = self
            .handlers
            .iter()
            .map(|config| config.build(registry))
            .collect::<Result<Vec<_>>>()?;
        debug!("built handler chain of {} handlers", handlers.len());
        Ok(QueryTraverser::new(handlers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_defaults() {
        let settings = SearchSettings::from_json(r#"{"parallel": true}"#).unwrap();
        assert!(settings.parallel);
        assert_eq!(settings.max_clause_count, 1024);
        assert_eq!(settings.max_rewrite_passes, 16);
    }

    #[test]
    fn test_registry() {
        let mut registry = MarkContextRegistry::new();
        assert_eq!(registry.get("phrase"), Some(&MarkContext::phrase()));

        let first = registry.register("synonym");
        let second = registry.register("synonym");
        assert_eq!(first, second);
        assert!(registry.get("other").is_none());
    }

    #[test]
    fn test_build_chain() {
        let config = ChainConfig::from_json(
            r#"{"handlers": [
                {"type": "lazy_range"},
                {"type": "transform_term_to_min_frequency", "min_frequency": 2},
                {"type": "exact_term"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(
            config.handlers[1],
            HandlerConfig::TransformTermToMinFrequency { min_frequency: 2 }
        );

        let traverser = config.build(&MarkContextRegistry::new()).unwrap();
        assert_eq!(traverser.handlers().len(), 3);
    }

    #[test]
    fn test_unknown_context() {
        let config = ChainConfig {
            handlers: vec![HandlerConfig::MarkTerm {
                context: "synonym".to_string(),
            }],
        };
        let error = config.build(&MarkContextRegistry::new()).unwrap_err();
        assert!(error.is_config());
        assert!(error.to_string().contains("unknown mark context [synonym]"));
    }

    #[test]
    fn test_unknown_handler_type() {
        let error = ChainConfig::from_json(r#"{"handlers": [{"type": "nope"}]}"#).unwrap_err();
        assert!(error.is_config());
    }

    #[test]
    fn test_zero_min_frequency_is_config_error() {
        let config = ChainConfig {
            handlers: vec![HandlerConfig::TransformTermToMinFrequency { min_frequency: 0 }],
        };
        assert!(config.build(&MarkContextRegistry::new()).unwrap_err().is_config());
    }
}

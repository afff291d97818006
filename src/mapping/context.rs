//! Read-only environment for query rewriting and execution.

use std::sync::Arc;

use crate::config::SearchSettings;
use crate::mapping::field_type::MappedFieldType;
use crate::mapping::mapper::Mapping;

/// Field metadata plus search settings, shared by every rewrite and search call.
///
/// Cloning is cheap; the mapping is reference counted.
#[derive(Debug, Clone, Default)]
pub struct SearchExecutionContext {
    mapping: Arc<Mapping>,
    settings: SearchSettings,
}

impl SearchExecutionContext {
    /// Create a context over a mapping.
    pub fn new(mapping: Arc<Mapping>, settings: SearchSettings) -> Self {
        SearchExecutionContext { mapping, settings }
    }

    /// The mapping.
    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    /// The settings.
    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// Resolve a field name or alias.
    pub fn field_type(&self, name: &str) -> Option<MappedFieldType> {
        self.mapping.field_type(name)
    }

    /// Whether the field exists and is tokenized.
    pub fn is_tokenized(&self, name: &str) -> bool {
        self.field_type(name)
            .is_some_and(|ft| ft.text_search_info().is_tokenized())
    }

    /// Whether the name is mapped.
    pub fn is_field_mapped(&self, name: &str) -> bool {
        self.mapping.is_field_mapped(name)
    }

    /// Maximum number of clauses (and expanded fields) a query may produce.
    pub fn max_clause_count(&self) -> usize {
        self.settings.max_clause_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::field_type::FieldKind;

    #[test]
    fn test_is_tokenized() {
        let mapping = Mapping::new()
            .with_field("body", FieldKind::Text)
            .with_field("tag", FieldKind::Keyword)
            .with_alias("text", "body");
        let ctx = SearchExecutionContext::new(Arc::new(mapping), SearchSettings::default());

        assert!(ctx.is_tokenized("body"));
        assert!(ctx.is_tokenized("text"));
        assert!(!ctx.is_tokenized("tag"));
        assert!(!ctx.is_tokenized("missing"));
        assert_eq!(ctx.max_clause_count(), 1024);
    }
}

//! Field mappings with alias resolution and field-name patterns.
//!
//! A [`Mapping`] can be built in code or loaded from JSON:
//!
//! ```
//! use termwalk::mapping::Mapping;
//!
//! let mapping = Mapping::from_json(r#"{
//!     "fields": { "title": "text", "tag": "keyword" },
//!     "aliases": { "headline": "title" }
//! }"#).unwrap();
//!
//! assert_eq!(mapping.field_type("headline").unwrap().name(), "title");
//! ```

use std::collections::{BTreeMap, BTreeSet};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TermwalkError};
use crate::mapping::field_type::{FieldKind, MappedFieldType};

/// Field name → kind, plus aliases pointing at concrete fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mapping {
    #[serde(default)]
    fields: BTreeMap<String, FieldKind>,
    #[serde(default)]
    aliases: BTreeMap<String, String>,
}

impl Mapping {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a concrete field.
    pub fn with_field<S: Into<String>>(mut self, name: S, kind: FieldKind) -> Self {
        self.fields.insert(name.into(), kind);
        self
    }

    /// Add an alias for a concrete field.
    pub fn with_alias<A: Into<String>, T: Into<String>>(mut self, alias: A, target: T) -> Self {
        self.aliases.insert(alias.into(), target.into());
        self
    }

    /// Parse a mapping from JSON and check that every alias targets a concrete field.
    pub fn from_json(json: &str) -> Result<Self> {
        let mapping: Mapping = serde_json::from_str(json)?;
        mapping.validate()?;
        Ok(mapping)
    }

    /// Check that aliases point at concrete fields and do not shadow them.
    pub fn validate(&self) -> Result<()> {
        for (alias, target) in &self.aliases {
            if self.fields.contains_key(alias) {
                return Err(TermwalkError::config(format!(
                    "alias [{alias}] shadows a concrete field"
                )));
            }
            if !self.fields.contains_key(target) {
                return Err(TermwalkError::config(format!(
                    "alias [{alias}] points to unmapped field [{target}]"
                )));
            }
        }
        Ok(())
    }

    /// Resolve a field name or alias to its concrete type.
    pub fn field_type(&self, name: &str) -> Option<MappedFieldType> {
        let concrete = self.aliases.get(name).map(String::as_str).unwrap_or(name);
        self.fields
            .get(concrete)
            .map(|&kind| MappedFieldType::new(concrete, kind))
    }

    /// Whether the name is a concrete field or an alias.
    pub fn is_field_mapped(&self, name: &str) -> bool {
        self.fields.contains_key(name) || self.aliases.contains_key(name)
    }

    /// All field and alias names matching `pattern`.
    ///
    /// A pattern without `*` matches only itself, and only when mapped.
    pub fn matching_field_names(&self, pattern: &str) -> Result<BTreeSet<String>> {
        if !is_simple_match_pattern(pattern) {
            let mut names = BTreeSet::new();
            if self.is_field_mapped(pattern) {
                names.insert(pattern.to_string());
            }
            return Ok(names);
        }

        let regex = compile_field_pattern(pattern)?;
        Ok(self
            .fields
            .keys()
            .chain(self.aliases.keys())
            .filter(|name| regex.is_match(name))
            .cloned()
            .collect())
    }
}

/// Whether the pattern is `*`.
pub fn is_match_all_pattern(pattern: &str) -> bool {
    pattern == "*"
}

/// Whether the pattern contains a `*` wildcard.
pub fn is_simple_match_pattern(pattern: &str) -> bool {
    pattern.contains('*')
}

/// Compile a `*`-glob into an anchored regex; everything else matches literally.
fn compile_field_pattern(pattern: &str) -> Result<Regex> {
    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    Regex::new(&format!("^{body}$"))
        .map_err(|e| TermwalkError::query(format!("invalid field pattern [{pattern}]: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Mapping {
        Mapping::new()
            .with_field("title", FieldKind::Text)
            .with_field("title.raw", FieldKind::Keyword)
            .with_field("body", FieldKind::Text)
            .with_field("_id", FieldKind::Keyword)
            .with_alias("headline", "title")
    }

    #[test]
    fn test_alias_resolution() {
        let mapping = sample();
        let ft = mapping.field_type("headline").unwrap();
        assert_eq!(ft.name(), "title");
        assert_eq!(ft.kind(), FieldKind::Text);
        assert!(mapping.field_type("missing").is_none());
        assert!(mapping.is_field_mapped("headline"));
    }

    #[test]
    fn test_matching_field_names() {
        let mapping = sample();

        let names: Vec<_> = mapping.matching_field_names("title*").unwrap().into_iter().collect();
        assert_eq!(names, vec!["title", "title.raw"]);

        let names = mapping.matching_field_names("*").unwrap();
        assert_eq!(names.len(), 5);

        // Dots are literal, not regex wildcards.
        assert!(mapping.matching_field_names("titleXraw").unwrap().is_empty());
        assert_eq!(mapping.matching_field_names("body").unwrap().len(), 1);
        assert!(mapping.matching_field_names("nope").unwrap().is_empty());
    }

    #[test]
    fn test_from_json() {
        let mapping = Mapping::from_json(
            r#"{"fields": {"title": "text", "n": "long"}, "aliases": {"t": "title"}}"#,
        )
        .unwrap();
        assert_eq!(mapping.field_type("t").unwrap().name(), "title");
        assert_eq!(mapping.field_type("n").unwrap().kind(), FieldKind::Long);
    }

    #[test]
    fn test_from_json_rejects_dangling_alias() {
        let err = Mapping::from_json(r#"{"fields": {}, "aliases": {"t": "title"}}"#).unwrap_err();
        assert!(err.is_config());
    }
}

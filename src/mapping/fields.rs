//! Field-name and boost expansion helpers.
//!
//! Multi-field queries name their fields as strings with optional boosts
//! (`title^2`, `body`, `meta.*^0.5`). These helpers parse such lists and
//! expand names and patterns against the mapping, capped by the maximum
//! clause count.

use std::collections::HashMap;

use log::debug;

use crate::error::{Result, TermwalkError};
use crate::mapping::context::SearchExecutionContext;
use crate::mapping::field_type::TextSearchInfo;
use crate::mapping::mapper::{is_match_all_pattern, is_simple_match_pattern};

/// Parse `name^boost` entries into a field → boost map.
///
/// Repeated names multiply their boosts.
pub fn parse_fields_and_weights<S: AsRef<str>>(fields: &[S]) -> Result<HashMap<String, f32>> {
    let mut weights: HashMap<String, f32> = HashMap::new();
    for field in fields {
        let field = field.as_ref();
        let (name, mut boost) = match field.split_once('^') {
            Some((name, boost)) => {
                let boost = boost.parse::<f32>().map_err(|_| {
                    TermwalkError::query(format!("invalid boost [{boost}] for field [{name}]"))
                })?;
                (name, boost)
            }
            None => (field, 1.0),
        };
        if let Some(previous) = weights.get(name) {
            boost *= previous;
        }
        weights.insert(name.to_string(), boost);
    }
    Ok(weights)
}

/// Expand every name or pattern of `fields_and_weights` against the mapping.
///
/// Exact names keep every field type; patterns keep searchable types only.
/// `*` also excludes metadata fields. When `field_suffix` is set and
/// `name + suffix` is mapped, the suffixed field replaces the original.
/// Fields reached from several entries multiply their boosts.
pub fn resolve_mapping_fields(
    ctx: &SearchExecutionContext,
    fields_and_weights: &HashMap<String, f32>,
    field_suffix: Option<&str>,
) -> Result<HashMap<String, f32>> {
    let mut resolved: HashMap<String, f32> = HashMap::new();
    for (pattern, &weight) in fields_and_weights {
        let all_fields = is_match_all_pattern(pattern);
        let multi_field = is_simple_match_pattern(pattern);
        let expanded =
            resolve_mapping_field(ctx, pattern, weight, !multi_field, !all_fields, field_suffix)?;
        for (name, boost) in expanded {
            let boost = resolved.get(&name).map_or(boost, |previous| boost * previous);
            resolved.insert(name, boost);
        }
    }
    check_for_too_many_fields(resolved.len(), ctx, None)?;
    Ok(resolved)
}

/// Expand one name or pattern into concrete field names with their boost.
///
/// Aliases whose concrete field is also matched collapse onto the concrete name.
pub fn resolve_mapping_field(
    ctx: &SearchExecutionContext,
    field_or_pattern: &str,
    weight: f32,
    accept_all_types: bool,
    accept_metadata_field: bool,
    field_suffix: Option<&str>,
) -> Result<HashMap<String, f32>> {
    let all_fields = ctx.mapping().matching_field_names(field_or_pattern)?;
    let mut fields: HashMap<String, f32> = HashMap::new();

    for name in &all_fields {
        let mut field_name = name.clone();
        if let Some(suffix) = field_suffix {
            let suffixed = format!("{name}{suffix}");
            if ctx.is_field_mapped(&suffixed) {
                field_name = suffixed;
            }
        }

        let Some(field_type) = ctx.field_type(&field_name) else {
            continue;
        };
        if !accept_metadata_field && field_type.is_metadata() {
            continue;
        }
        if !accept_all_types && field_type.text_search_info() == TextSearchInfo::None {
            continue;
        }

        if all_fields.contains(field_type.name()) {
            field_name = field_type.name().to_string();
        }
        let w = fields.get(&field_name).copied().unwrap_or(1.0);
        fields.insert(field_name, w * weight);
    }

    debug!(
        "resolved field pattern [{field_or_pattern}] to {} field(s)",
        fields.len()
    );
    Ok(fields)
}

/// Fail with a configuration error when more fields were expanded than clauses are allowed.
pub fn check_for_too_many_fields(
    number_of_fields: usize,
    ctx: &SearchExecutionContext,
    input_pattern: Option<&str>,
) -> Result<()> {
    let limit = ctx.max_clause_count();
    if number_of_fields > limit {
        let mut msg = String::from("field expansion ");
        if let Some(pattern) = input_pattern {
            msg.push_str(&format!("for [{pattern}] "));
        }
        msg.push_str(&format!(
            "matches too many fields, limit: {limit}, got: {number_of_fields}"
        ));
        return Err(TermwalkError::config(msg));
    }
    Ok(())
}

/// Whether any of the names is the `*` wildcard.
pub fn has_all_fields_wildcard<S: AsRef<str>>(fields: &[S]) -> bool {
    fields.iter().any(|f| is_match_all_pattern(f.as_ref()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::SearchSettings;
    use crate::mapping::field_type::FieldKind;
    use crate::mapping::mapper::Mapping;

    fn context(max_clause_count: usize) -> SearchExecutionContext {
        let mapping = Mapping::new()
            .with_field("title", FieldKind::Text)
            .with_field("title.exact", FieldKind::Text)
            .with_field("body", FieldKind::Text)
            .with_field("blob", FieldKind::Binary)
            .with_field("_id", FieldKind::Keyword)
            .with_alias("headline", "title");
        let settings = SearchSettings {
            max_clause_count,
            ..Default::default()
        };
        SearchExecutionContext::new(Arc::new(mapping), settings)
    }

    #[test]
    fn test_parse_fields_and_weights() {
        let parsed = parse_fields_and_weights(&["title^2", "body", "title^1.5"]).unwrap();
        assert_eq!(parsed["title"], 3.0);
        assert_eq!(parsed["body"], 1.0);

        assert!(parse_fields_and_weights(&["title^x"]).is_err());
    }

    #[test]
    fn test_resolve_pattern_skips_unsearchable_and_metadata() {
        let ctx = context(1024);
        let weights = parse_fields_and_weights(&["*"]).unwrap();
        let resolved = resolve_mapping_fields(&ctx, &weights, None).unwrap();

        assert!(resolved.contains_key("title"));
        assert!(resolved.contains_key("body"));
        assert!(!resolved.contains_key("blob"));
        assert!(!resolved.contains_key("_id"));
        // The alias collapses onto its concrete field.
        assert!(!resolved.contains_key("headline"));
        assert_eq!(resolved["title"], 1.0);
    }

    #[test]
    fn test_exact_name_accepts_all_types() {
        let ctx = context(1024);
        let resolved = resolve_mapping_field(&ctx, "blob", 2.0, true, true, None).unwrap();
        assert_eq!(resolved["blob"], 2.0);
    }

    #[test]
    fn test_alias_alone_keeps_alias_name() {
        let ctx = context(1024);
        let resolved = resolve_mapping_field(&ctx, "headline", 1.0, true, true, None).unwrap();
        assert_eq!(resolved.len(), 1);
        assert!(resolved.contains_key("headline"));
    }

    #[test]
    fn test_suffix_resolution() {
        let ctx = context(1024);
        let weights = parse_fields_and_weights(&["title", "body"]).unwrap();
        let resolved = resolve_mapping_fields(&ctx, &weights, Some(".exact")).unwrap();
        assert!(resolved.contains_key("title.exact"));
        assert!(resolved.contains_key("body"));
        assert!(!resolved.contains_key("title"));
    }

    #[test]
    fn test_too_many_fields() {
        let ctx = context(2);
        let weights = parse_fields_and_weights(&["t*", "body"]).unwrap();
        let err = resolve_mapping_fields(&ctx, &weights, None).unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("limit: 2, got: 3"));

        let err = check_for_too_many_fields(5, &ctx, Some("meta.*")).unwrap_err();
        assert!(
            err.to_string()
                .contains("field expansion for [meta.*] matches too many fields, limit: 2, got: 5")
        );
    }

    #[test]
    fn test_has_all_fields_wildcard() {
        assert!(has_all_fields_wildcard(&["title", "*"]));
        assert!(!has_all_fields_wildcard(&["title*"]));
    }
}

//! Integration tests for field-name expansion against a mapping.

use std::sync::Arc;

use termwalk::mapping::fields::{
    check_for_too_many_fields, has_all_fields_wildcard, parse_fields_and_weights,
    resolve_mapping_fields,
};
use termwalk::prelude::*;

fn context(max_clause_count: usize) -> SearchExecutionContext {
    let mapping = Mapping::new()
        .with_field("f1", FieldKind::Text)
        .with_field("f2", FieldKind::Text)
        .with_field("f3", FieldKind::Keyword)
        .with_field("f4", FieldKind::Text)
        .with_field("f5", FieldKind::Text)
        .with_field("other", FieldKind::Text);
    let settings = SearchSettings {
        max_clause_count,
        ..SearchSettings::default()
    };
    SearchExecutionContext::new(Arc::new(mapping), settings)
}

#[test]
fn test_pattern_expansion_within_limit() -> Result<()> {
    let ctx = context(10);
    let weights = parse_fields_and_weights(&["f*^2", "other"])?;
    let resolved = resolve_mapping_fields(&ctx, &weights, None)?;

    assert_eq!(resolved.len(), 6);
    assert_eq!(resolved["f1"], 2.0);
    assert_eq!(resolved["other"], 1.0);
    Ok(())
}

#[test]
fn test_pattern_expansion_over_limit() -> Result<()> {
    let ctx = context(3);
    let weights = parse_fields_and_weights(&["f*"])?;
    let error = resolve_mapping_fields(&ctx, &weights, None).unwrap_err();
    assert!(error.is_config());
    assert!(
        error
            .to_string()
            .contains("field expansion matches too many fields, limit: 3, got: 5")
    );

    let error = check_for_too_many_fields(5, &ctx, Some("f*")).unwrap_err();
    assert!(
        error
            .to_string()
            .contains("field expansion for [f*] matches too many fields, limit: 3, got: 5")
    );
    Ok(())
}

#[test]
fn test_all_fields_wildcard() {
    assert!(has_all_fields_wildcard(&["title", "*"]));
    assert!(!has_all_fields_wildcard(&["title", "f*"]));
}

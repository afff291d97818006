//! Multi-term queries: prefix, wildcard and range.
//!
//! A multi-term query names a set of terms by pattern instead of listing them.
//! It cannot be executed directly; the searcher first expands it against the
//! term dictionaries of a snapshot into a boolean disjunction of the concrete
//! terms (or a span union when wrapped for positional matching).

use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use regex::Regex;

use crate::error::{Result, TermwalkError};
use crate::index::reader::IndexSnapshot;
use crate::index::term::Term;

/// A compiled wildcard pattern.
///
/// Supports `*` (zero or more characters), `?` (exactly one character) and
/// `\` escapes. Compares by pattern text.
#[derive(Debug, Clone)]
pub struct WildcardPattern {
    pattern: String,
    regex: Arc<Regex>,
}

impl WildcardPattern {
    /// Compile a wildcard pattern.
    pub fn new(pattern: &str) -> Result<Self> {
        let mut regex_pattern = String::from("^");
        let mut chars = pattern.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some(escaped) => regex_pattern.push_str(&regex::escape(&escaped.to_string())),
                    None => regex_pattern.push_str("\\\\"),
                },
                '*' => regex_pattern.push_str(".*"),
                '?' => regex_pattern.push('.'),
                c => regex_pattern.push_str(&regex::escape(&c.to_string())),
            }
        }
        regex_pattern.push('$');

        let regex = Regex::new(&regex_pattern)
            .map_err(|e| TermwalkError::query(format!("Invalid wildcard pattern: {e}")))?;
        Ok(WildcardPattern {
            pattern: pattern.to_string(),
            regex: Arc::new(regex),
        })
    }

    /// The pattern text.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Whether `text` matches the pattern.
    pub fn matches(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl PartialEq for WildcardPattern {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

impl Eq for WildcardPattern {}

impl Hash for WildcardPattern {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.pattern.hash(state);
    }
}

/// How a multi-term query selects its terms.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MultiTermKind {
    /// Terms starting with a prefix.
    Prefix(String),
    /// Terms matching a wildcard pattern.
    Wildcard(WildcardPattern),
    /// Terms between two bounds in lexicographic order; `None` is unbounded.
    Range {
        lower: Option<String>,
        upper: Option<String>,
        include_lower: bool,
        include_upper: bool,
    },
}

/// A query over every term of a field that matches a pattern.
///
/// When a minimum frequency is set (the "min-frequency prefix query"), every
/// expanded term carries that threshold.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MultiTermQuery {
    field: String,
    kind: MultiTermKind,
    min_frequency: Option<u32>,
}

impl MultiTermQuery {
    /// Terms of `field` starting with `prefix`.
    pub fn prefix(field: &str, prefix: &str) -> Self {
        MultiTermQuery {
            field: field.to_string(),
            kind: MultiTermKind::Prefix(prefix.to_string()),
            min_frequency: None,
        }
    }

    /// Terms of `field` matching a wildcard pattern.
    pub fn wildcard(field: &str, pattern: &str) -> Result<Self> {
        Ok(MultiTermQuery {
            field: field.to_string(),
            kind: MultiTermKind::Wildcard(WildcardPattern::new(pattern)?),
            min_frequency: None,
        })
    }

    /// Terms of `field` between `lower` and `upper`.
    pub fn range(
        field: &str,
        lower: Option<&str>,
        upper: Option<&str>,
        include_lower: bool,
        include_upper: bool,
    ) -> Self {
        MultiTermQuery {
            field: field.to_string(),
            kind: MultiTermKind::Range {
                lower: lower.map(str::to_string),
                upper: upper.map(str::to_string),
                include_lower,
                include_upper,
            },
            min_frequency: None,
        }
    }

    /// Terms of `field` starting with `prefix`, each required `min_frequency` times.
    pub fn min_frequency_prefix(field: &str, prefix: &str, min_frequency: u32) -> Result<Self> {
        Self::prefix(field, prefix).with_min_frequency(min_frequency)
    }

    /// Require every expanded term to occur at least `min_frequency` times.
    pub fn with_min_frequency(mut self, min_frequency: u32) -> Result<Self> {
        if min_frequency == 0 {
            return Err(TermwalkError::invalid_argument(
                "minimum frequency must be at least 1",
            ));
        }
        self.min_frequency = Some(min_frequency);
        Ok(self)
    }

    /// The same selection without a frequency threshold.
    pub fn without_min_frequency(&self) -> Self {
        MultiTermQuery {
            min_frequency: None,
            ..self.clone()
        }
    }

    /// Get the field name.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Get the selection.
    pub fn kind(&self) -> &MultiTermKind {
        &self.kind
    }

    /// Get the threshold, if any.
    pub fn min_frequency(&self) -> Option<u32> {
        self.min_frequency
    }

    /// Whether this is a range query.
    pub fn is_range(&self) -> bool {
        matches!(self.kind, MultiTermKind::Range { .. })
    }

    /// Whether a term text of this query's field is selected.
    pub fn matches(&self, text: &str) -> bool {
        match &self.kind {
            MultiTermKind::Prefix(prefix) => text.starts_with(prefix.as_str()),
            MultiTermKind::Wildcard(pattern) => pattern.matches(text),
            MultiTermKind::Range {
                lower,
                upper,
                include_lower,
                include_upper,
            } => {
                let above = match lower {
                    Some(lower) if *include_lower => text >= lower.as_str(),
                    Some(lower) => text > lower.as_str(),
                    None => true,
                };
                let below = match upper {
                    Some(upper) if *include_upper => text <= upper.as_str(),
                    Some(upper) => text < upper.as_str(),
                    None => true,
                };
                above && below
            }
        }
    }

    /// Expand against every segment of `snapshot` into the sorted set of matching terms.
    ///
    /// More than `max_clause_count` terms is a configuration error.
    pub fn expand(&self, snapshot: &dyn IndexSnapshot, max_clause_count: usize) -> Result<Vec<Term>> {
        let mut texts = BTreeSet::new();
        for segment in snapshot.segments() {
            for text in segment.terms(&self.field)? {
                if self.matches(&text) {
                    texts.insert(text);
                }
            }
        }

        if texts.len() > max_clause_count {
            return Err(TermwalkError::config(format!(
                "query [{self}] expanded to {} terms, more than maxClauseCount {max_clause_count}",
                texts.len()
            )));
        }

        Ok(texts
            .into_iter()
            .map(|text| Term::new(self.field.as_str(), text))
            .collect())
    }
}

impl fmt::Display for MultiTermQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.field)?;
        match &self.kind {
            MultiTermKind::Prefix(prefix) => write!(f, "{prefix}*")?,
            MultiTermKind::Wildcard(pattern) => f.write_str(pattern.pattern())?,
            MultiTermKind::Range {
                lower,
                upper,
                include_lower,
                include_upper,
            } => write!(
                f,
                "{}{} TO {}{}",
                if *include_lower { '[' } else { '{' },
                lower.as_deref().unwrap_or("*"),
                upper.as_deref().unwrap_or("*"),
                if *include_upper { ']' } else { '}' },
            )?,
        }
        if let Some(min) = self.min_frequency {
            write!(f, "/a{min}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::memory::MemoryIndexBuilder;
    use crate::index::reader::IndexOptions;

    #[test]
    fn test_wildcard_matching() {
        let pattern = WildcardPattern::new("te?t*").unwrap();
        assert!(pattern.matches("test"));
        assert!(pattern.matches("texting"));
        assert!(!pattern.matches("tet"));

        let literal = WildcardPattern::new("a.b\\*").unwrap();
        assert!(literal.matches("a.b*"));
        assert!(!literal.matches("axb*"));
        assert!(!literal.matches("a.bc"));
    }

    #[test]
    fn test_range_bounds() {
        let inclusive = MultiTermQuery::range("tag", Some("b"), Some("d"), true, true);
        assert!(inclusive.matches("b"));
        assert!(inclusive.matches("d"));
        assert!(!inclusive.matches("e"));

        let exclusive = MultiTermQuery::range("tag", Some("b"), Some("d"), false, false);
        assert!(!exclusive.matches("b"));
        assert!(exclusive.matches("c"));
        assert!(!exclusive.matches("d"));

        let open = MultiTermQuery::range("tag", None, Some("c"), true, false);
        assert!(open.matches("a"));
        assert!(!open.matches("c"));
    }

    #[test]
    fn test_display() {
        assert_eq!(MultiTermQuery::prefix("body", "qu").to_string(), "body:qu*");
        assert_eq!(
            MultiTermQuery::min_frequency_prefix("body", "qu", 3)
                .unwrap()
                .to_string(),
            "body:qu*/a3"
        );
        assert_eq!(
            MultiTermQuery::range("tag", Some("a"), None, true, false).to_string(),
            "tag:[a TO *}"
        );
        assert_eq!(MultiTermQuery::wildcard("body", "f?x").unwrap().to_string(), "body:f?x");
    }

    #[test]
    fn test_min_frequency_validation() {
        assert!(MultiTermQuery::min_frequency_prefix("body", "qu", 0).is_err());
        let query = MultiTermQuery::min_frequency_prefix("body", "qu", 2).unwrap();
        assert_eq!(query.without_min_frequency(), MultiTermQuery::prefix("body", "qu"));
    }

    #[test]
    fn test_expand_unions_segments() {
        let mut builder = MemoryIndexBuilder::new().field("body", IndexOptions::Freqs);
        builder.add_text("body", "quick quiet").unwrap();
        builder.commit_segment();
        builder.add_text("body", "quick quill brown").unwrap();
        let index = builder.build();

        let query = MultiTermQuery::prefix("body", "qui");
        let terms = query.expand(index.as_ref(), 1024).unwrap();
        let texts: Vec<&str> = terms.iter().map(|t| t.text()).collect();
        assert_eq!(texts, vec!["quick", "quiet", "quill"]);

        let err = query.expand(index.as_ref(), 2).unwrap_err();
        assert!(err.is_config());
    }
}

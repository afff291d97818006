//! Mapped field types.

use serde::{Deserialize, Serialize};

/// The kind of a mapped field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Analyzed full text.
    Text,
    /// A single untokenized value.
    Keyword,
    /// 64-bit integer.
    Long,
    /// 64-bit float.
    Double,
    /// true / false.
    Boolean,
    /// Opaque bytes; not searchable.
    Binary,
}

/// How a field can be searched with text queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextSearchInfo {
    /// Not searchable with text queries.
    None,
    /// Searchable as whole values.
    Untokenized,
    /// Searchable token by token; positions are available.
    Tokenized,
}

impl TextSearchInfo {
    /// Whether the field was tokenized by analysis.
    pub fn is_tokenized(self) -> bool {
        self == TextSearchInfo::Tokenized
    }
}

impl FieldKind {
    /// Text search capabilities of this kind.
    pub fn text_search_info(self) -> TextSearchInfo {
        match self {
            FieldKind::Text => TextSearchInfo::Tokenized,
            FieldKind::Keyword | FieldKind::Long | FieldKind::Double | FieldKind::Boolean => {
                TextSearchInfo::Untokenized
            }
            FieldKind::Binary => TextSearchInfo::None,
        }
    }
}

/// A concrete mapped field, with aliases already resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedFieldType {
    name: String,
    kind: FieldKind,
}

impl MappedFieldType {
    /// Create a new field type.
    pub fn new<S: Into<String>>(name: S, kind: FieldKind) -> Self {
        MappedFieldType {
            name: name.into(),
            kind,
        }
    }

    /// The concrete field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The field kind.
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Text search capabilities.
    pub fn text_search_info(&self) -> TextSearchInfo {
        self.kind.text_search_info()
    }

    /// Metadata fields start with an underscore.
    pub fn is_metadata(&self) -> bool {
        self.name.starts_with('_')
    }
}

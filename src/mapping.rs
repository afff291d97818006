//! Field metadata consulted while rewriting queries.

pub mod context;
pub mod field_type;
pub mod fields;
pub mod mapper;

pub use context::SearchExecutionContext;
pub use field_type::{FieldKind, MappedFieldType, TextSearchInfo};
pub use mapper::Mapping;

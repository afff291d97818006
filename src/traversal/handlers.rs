//! The built-in query handlers.

pub mod boost;
pub mod exact_marked_term;
pub mod exact_min_frequency_prefix;
pub mod exact_min_frequency_term;
pub mod exact_multi_term;
pub mod exact_term;
pub mod lazy_range;
pub mod mark_term;
pub mod min_frequency_term;

pub use boost::CloneOnChangeBoostQueryHandler;
pub use exact_marked_term::ExactMarkedTermQueryHandler;
pub use exact_min_frequency_prefix::ExactMinFrequencyPrefixQueryHandler;
pub use exact_min_frequency_term::ExactMinFrequencyTermQueryHandler;
pub use exact_multi_term::ExactMultiTermQueryHandler;
pub use exact_term::ExactTermQueryHandler;
pub use lazy_range::LazyRangeQueryHandler;
pub use mark_term::MarkTermQueryHandler;
pub use min_frequency_term::TransformTermQueryToMinFrequencyTermQueryHandler;

use std::sync::Arc;

use crate::error::Result;
use crate::index::term::Term;
use crate::query::multi_term::MultiTermQuery;
use crate::query::node::Query;
use crate::query::span::{
    SpanEmptyPayloadCheckQuery, SpanMinFrequencyFilterQuery, SpanMultiTermQuery, SpanTermQuery,
};

/// Occurrences of `term` that carry no payload.
pub(crate) fn exact_span_term(term: &Term) -> Result<Arc<Query>> {
    let span = Arc::new(Query::SpanTerm(SpanTermQuery::new(term.clone())));
    Ok(Arc::new(Query::SpanEmptyPayloadCheck(
        SpanEmptyPayloadCheckQuery::new(span)?,
    )))
}

/// Occurrences of any expansion of `query` that carry no payload.
pub(crate) fn exact_span_multi_term(query: MultiTermQuery) -> Result<Arc<Query>> {
    let span = Arc::new(Query::SpanMultiTerm(SpanMultiTermQuery::new(query)));
    Ok(Arc::new(Query::SpanEmptyPayloadCheck(
        SpanEmptyPayloadCheckQuery::new(span)?,
    )))
}

/// Keep only documents with at least `min_frequency` spans of `exact`.
pub(crate) fn min_frequency_filter(exact: Arc<Query>, min_frequency: u32) -> Result<Arc<Query>> {
    Ok(Arc::new(Query::SpanMinFrequencyFilter(
        SpanMinFrequencyFilterQuery::new(exact, min_frequency)?,
    )))
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use crate::config::SearchSettings;
    use crate::mapping::context::SearchExecutionContext;
    use crate::mapping::field_type::FieldKind;
    use crate::mapping::mapper::Mapping;

    /// `body` is text, `tag` is a keyword.
    pub fn context() -> SearchExecutionContext {
        let mapping = Mapping::new()
            .with_field("body", FieldKind::Text)
            .with_field("tag", FieldKind::Keyword);
        SearchExecutionContext::new(Arc::new(mapping), SearchSettings::default())
    }
}

//! End-to-end tests for minimum-frequency matching.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use termwalk::index::{IndexOptions, Token};
use termwalk::prelude::*;
use termwalk::query::{
    MultiTermQuery, SpanEmptyPayloadCheckQuery, SpanMinFrequencyFilterQuery, SpanNearQuery,
};
use termwalk::traversal::TransformTermQueryToMinFrequencyTermQueryHandler;

fn plain(text: &str, position: u32) -> Token {
    Token::new(text, position)
}

fn synonym(text: &str, position: u32) -> Token {
    Token::new(text, position).with_payload(b"syn")
}

/// doc0: fox x3, doc1: fox dog, doc2: fox + two synonym foxes, doc3: fox x2,
/// doc4: fox fox dog.
fn searcher() -> Result<IndexSearcher> {
    let mut builder = MemoryIndexBuilder::new()
        .field("body", IndexOptions::PositionsAndPayloads)
        .field("tag", IndexOptions::Freqs);
    builder.add_text("body", "fox fox fox")?;
    builder.add_text("body", "fox dog")?;
    builder.add_document(vec![(
        "body",
        vec![plain("fox", 0), synonym("fox", 1), synonym("fox", 2)],
    )])?;
    builder.commit_segment();
    builder.add_text("body", "fox fox")?;
    builder.add_text("body", "fox fox dog")?;
    Ok(IndexSearcher::new(builder.build()))
}

fn doc_ids(searcher: &IndexSearcher, query: &Arc<Query>) -> Result<Vec<u64>> {
    let mut docs: Vec<u64> = searcher
        .search(query, 1000)?
        .hits
        .iter()
        .map(|h| h.doc_id)
        .collect();
    docs.sort();
    Ok(docs)
}

fn context() -> SearchExecutionContext {
    let mapping = Mapping::new()
        .with_field("body", FieldKind::Text)
        .with_field("tag", FieldKind::Keyword);
    SearchExecutionContext::new(Arc::new(mapping), SearchSettings::default())
}

#[test]
fn test_min_frequency_term_counts_every_occurrence() -> Result<()> {
    let searcher = searcher()?;
    let query = Query::min_frequency_term("body", "fox", 2)?;
    assert_eq!(doc_ids(&searcher, &query)?, vec![0, 2, 3, 4]);

    let query = Query::min_frequency_term("body", "fox", 3)?;
    assert_eq!(doc_ids(&searcher, &query)?, vec![0, 2]);
    assert_eq!(searcher.count(&query)?, 2);
    Ok(())
}

#[test]
fn test_traversed_terms_count_exact_occurrences_only() -> Result<()> {
    let searcher = searcher()?;
    let traverser = QueryTraverser::new(vec![Arc::new(
        TransformTermQueryToMinFrequencyTermQueryHandler::new(2)?,
    )]);

    let query = traverser.traverse(&TraverserContext::new(), &context(), &Query::term("body", "fox"))?;
    assert_eq!(
        query.to_string(),
        "SpanMinFrequencyFilter(SpanEmptyPayloadCheck(body:fox), 2)"
    );
    // doc2 has three foxes but only one without a payload.
    assert_eq!(doc_ids(&searcher, &query)?, vec![0, 3, 4]);
    Ok(())
}

#[test]
fn test_span_term_needs_positions() -> Result<()> {
    let mut builder = MemoryIndexBuilder::new().field("body", IndexOptions::Freqs);
    builder.add_text("body", "fox")?;
    let searcher = IndexSearcher::new(builder.build());

    let error = searcher
        .search(&Query::span_term("body", "fox"), 10)
        .unwrap_err();
    assert!(matches!(error, TermwalkError::IndexingMismatch(_)));
    assert!(
        error
            .to_string()
            .contains("field \"body\" was indexed without position data; cannot run SpanTermQuery (term=fox)")
    );

    // Frequencies alone are enough for the non-positional variant.
    assert_eq!(searcher.count(&Query::min_frequency_term("body", "fox", 1)?)?, 1);
    Ok(())
}

#[test]
fn test_min_frequency_span_term_inside_near() -> Result<()> {
    let searcher = searcher()?;
    let near = Arc::new(Query::SpanNear(SpanNearQuery::new(
        vec![
            Query::min_frequency_span_term("body", "fox", 2)?,
            Query::span_term("body", "dog"),
        ],
        0,
        true,
    )?));
    assert_eq!(doc_ids(&searcher, &near)?, vec![4]);

    let near_any = Arc::new(Query::SpanNear(SpanNearQuery::new(
        vec![Query::span_term("body", "fox"), Query::span_term("body", "dog")],
        0,
        true,
    )?));
    assert_eq!(doc_ids(&searcher, &near_any)?, vec![1, 4]);
    Ok(())
}

#[test]
fn test_too_many_clauses() -> Result<()> {
    let mut builder = MemoryIndexBuilder::new().field("body", IndexOptions::Positions);
    builder.add_text("body", "quick quiet quill")?;
    let settings = SearchSettings {
        max_clause_count: 2,
        ..SearchSettings::default()
    };
    let searcher = IndexSearcher::with_settings(builder.build(), settings);

    let prefix = Query::multi_term(MultiTermQuery::prefix("body", "qu"));
    let error = searcher.search(&prefix, 10).unwrap_err();
    assert!(error.is_config());
    Ok(())
}

#[test]
fn test_randomized_exact_frequency_filter() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(42);
    let mut builder = MemoryIndexBuilder::new().field("body", IndexOptions::PositionsAndPayloads);
    let mut exact_counts = Vec::new();
    let mut total_counts = Vec::new();

    for doc in 0..200u32 {
        let mut tokens = vec![plain("filler", 0)];
        let mut exact = 0;
        let mut total = 0;
        for position in 1..rng.random_range(1..8u32) {
            if rng.random_bool(0.5) {
                if rng.random_bool(0.3) {
                    tokens.push(synonym("x", position));
                } else {
                    tokens.push(plain("x", position));
                    exact += 1;
                }
                total += 1;
            }
        }
        builder.add_document(vec![("body", tokens)])?;
        exact_counts.push(exact);
        total_counts.push(total);
        if doc % 50 == 49 {
            builder.commit_segment();
        }
    }
    let searcher = IndexSearcher::new(builder.build());

    for min in 1..=4u32 {
        let filter = Arc::new(Query::SpanMinFrequencyFilter(SpanMinFrequencyFilterQuery::new(
            Arc::new(Query::SpanEmptyPayloadCheck(SpanEmptyPayloadCheckQuery::new(
                Query::span_term("body", "x"),
            )?)),
            min,
        )?));
        let expected: Vec<u64> = (0..exact_counts.len() as u64)
            .filter(|&doc| exact_counts[doc as usize] >= min)
            .collect();
        let mut actual: Vec<u64> = searcher
            .search(&filter, 1000)?
            .hits
            .iter()
            .map(|h| h.doc_id)
            .collect();
        actual.sort();
        assert_eq!(actual, expected, "exact min {min}");

        let term = Query::min_frequency_term("body", "x", min)?;
        let expected: Vec<u64> = (0..total_counts.len() as u64)
            .filter(|&doc| total_counts[doc as usize] >= min)
            .collect();
        assert_eq!(doc_ids(&searcher, &term)?, expected, "total min {min}");
    }
    Ok(())
}

//! In-memory index.
//!
//! A small, fully functional implementation of [`IndexSnapshot`] and
//! [`SegmentReader`] that keeps postings in memory. It is the index the crate's
//! tests and benchmarks run against, and a reference for plugging in a real
//! segment store.
//!
//! # Example
//!
//! ```
//! use termwalk::index::memory::{MemoryIndexBuilder, Token};
//! use termwalk::index::reader::{IndexOptions, IndexSnapshot};
//!
//! let mut builder = MemoryIndexBuilder::new()
//!     .field("body", IndexOptions::PositionsAndPayloads)
//!     .field("tag", IndexOptions::Freqs);
//!
//! builder.add_text("body", "the quick brown fox").unwrap();
//! builder
//!     .add_document(vec![
//!         ("body", vec![Token::new("fast", 0), Token::new("quick", 0).with_payload(b"syn")]),
//!         ("tag", vec![Token::new("animal", 0)]),
//!     ])
//!     .unwrap();
//!
//! let index = builder.build();
//! assert_eq!(index.max_doc(), 2);
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use ahash::AHashMap;
use unicode_segmentation::UnicodeSegmentation;

use crate::error::{Result, TermwalkError};
use crate::index::posting::{
    Posting, PostingFlags, PostingIterator, TermPosition, VecPostingIterator,
};
use crate::index::reader::{
    FieldStats, IndexOptions, IndexSnapshot, SegmentReader, SnapshotId, TermState,
};
use crate::index::term::Term;

/// An analyzed token ready for indexing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Token text.
    pub text: String,
    /// Token position.
    pub position: u32,
    /// Optional payload; synonyms injected by analysis typically carry one.
    pub payload: Option<Vec<u8>>,
}

impl Token {
    /// Create a token without payload.
    pub fn new<T: Into<String>>(text: T, position: u32) -> Self {
        Token {
            text: text.into(),
            position,
            payload: None,
        }
    }

    /// Attach a payload.
    pub fn with_payload(mut self, payload: &[u8]) -> Self {
        self.payload = Some(payload.to_vec());
        self
    }
}

/// Postings of one field in one segment.
#[derive(Debug, Default)]
struct FieldPostings {
    /// Term text -> ordinal into `postings`.
    terms: BTreeMap<String, usize>,
    postings: Vec<Arc<Vec<Posting>>>,
    stats: FieldStats,
}

/// A finished, immutable in-memory segment.
#[derive(Debug)]
pub struct MemorySegment {
    ord: usize,
    snapshot: SnapshotId,
    doc_base: u64,
    max_doc: u64,
    options: Arc<AHashMap<String, IndexOptions>>,
    fields: AHashMap<String, FieldPostings>,
}

impl SegmentReader for MemorySegment {
    fn ord(&self) -> usize {
        self.ord
    }

    fn snapshot_id(&self) -> SnapshotId {
        self.snapshot
    }

    fn doc_base(&self) -> u64 {
        self.doc_base
    }

    fn max_doc(&self) -> u64 {
        self.max_doc
    }

    fn index_options(&self, field: &str) -> Option<IndexOptions> {
        if self.fields.contains_key(field) {
            self.options.get(field).copied()
        } else {
            None
        }
    }

    fn term_state(&self, term: &Term) -> Result<Option<TermState>> {
        let Some(field) = self.fields.get(term.field()) else {
            return Ok(None);
        };
        Ok(field.terms.get(term.text()).map(|&ordinal| {
            let postings = &field.postings[ordinal];
            TermState {
                doc_freq: postings.len() as u64,
                total_term_freq: postings.iter().map(|p| p.frequency as u64).sum(),
                ordinal,
            }
        }))
    }

    fn postings(
        &self,
        term: &Term,
        state: &TermState,
        flags: PostingFlags,
    ) -> Result<Box<dyn PostingIterator>> {
        let options = self.index_options(term.field()).ok_or_else(|| {
            TermwalkError::invalid_operation(format!("field \"{}\" is not indexed", term.field()))
        })?;
        if !options.supports(flags) {
            return Err(TermwalkError::indexing_mismatch(format!(
                "field \"{}\" was indexed without position data (term={})",
                term.field(),
                term.text()
            )));
        }

        let field = &self.fields[term.field()];
        let postings = field.postings.get(state.ordinal).ok_or_else(|| {
            TermwalkError::invariant(format!("stale term state for {term}"))
        })?;
        Ok(Box::new(VecPostingIterator::new(postings.clone(), flags)))
    }

    fn terms(&self, field: &str) -> Result<Vec<String>> {
        Ok(self
            .fields
            .get(field)
            .map(|f| f.terms.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn field_stats(&self, field: &str) -> Option<FieldStats> {
        self.fields.get(field).map(|f| f.stats)
    }
}

/// An immutable in-memory snapshot.
#[derive(Debug)]
pub struct MemoryIndex {
    id: SnapshotId,
    segments: Vec<Arc<dyn SegmentReader>>,
}

impl IndexSnapshot for MemoryIndex {
    fn id(&self) -> SnapshotId {
        self.id
    }

    fn segments(&self) -> &[Arc<dyn SegmentReader>] {
        &self.segments
    }
}

/// Documents accumulated for the segment under construction.
#[derive(Debug, Default)]
struct SegmentBuffer {
    doc_count: u64,
    /// field -> term -> postings in doc order.
    fields: AHashMap<String, BTreeMap<String, Vec<Posting>>>,
    stats: AHashMap<String, FieldStats>,
}

/// Builder for [`MemoryIndex`].
#[derive(Debug, Default)]
pub struct MemoryIndexBuilder {
    options: AHashMap<String, IndexOptions>,
    finished: Vec<SegmentBuffer>,
    current: SegmentBuffer,
}

impl MemoryIndexBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a field and how it is indexed.
    pub fn field<S: Into<String>>(mut self, name: S, options: IndexOptions) -> Self {
        self.options.insert(name.into(), options);
        self
    }

    /// Add a document made of pre-analyzed tokens. Returns its global id.
    pub fn add_document(&mut self, fields: Vec<(&str, Vec<Token>)>) -> Result<u64> {
        for (field, _) in &fields {
            if !self.options.contains_key(*field) {
                return Err(TermwalkError::invalid_argument(format!(
                    "field \"{field}\" is not declared"
                )));
            }
        }

        let local_id = self.current.doc_count;
        for (field, tokens) in fields {
            let options = self.options[field];
            self.index_field(local_id, field, options, tokens);
        }
        self.current.doc_count += 1;

        let base: u64 = self.finished.iter().map(|s| s.doc_count).sum();
        Ok(base + local_id)
    }

    /// Tokenize `text` on Unicode word boundaries, lowercase it and index it as a document.
    pub fn add_text(&mut self, field: &str, text: &str) -> Result<u64> {
        let tokens = text
            .unicode_words()
            .enumerate()
            .map(|(pos, word)| Token::new(word.to_lowercase(), pos as u32))
            .collect();
        self.add_document(vec![(field, tokens)])
    }

    /// Close the segment under construction; later documents go into a new one.
    pub fn commit_segment(&mut self) {
        if self.current.doc_count > 0 {
            self.finished.push(std::mem::take(&mut self.current));
        }
    }

    /// Freeze everything into a snapshot.
    pub fn build(mut self) -> Arc<MemoryIndex> {
        self.commit_segment();

        let id = SnapshotId::new();
        let options = Arc::new(self.options);
        let mut doc_base = 0;
        let mut segments: Vec<Arc<dyn SegmentReader>> = Vec::with_capacity(self.finished.len());

        for (ord, buffer) in self.finished.into_iter().enumerate() {
            let max_doc = buffer.doc_count;
            let mut stats = buffer.stats;
            let fields = buffer
                .fields
                .into_iter()
                .map(|(name, terms)| {
                    let mut field = FieldPostings {
                        stats: stats.remove(&name).unwrap_or_default(),
                        ..Default::default()
                    };
                    for (ordinal, (text, postings)) in terms.into_iter().enumerate() {
                        field.stats.sum_doc_freq += postings.len() as u64;
                        field.terms.insert(text, ordinal);
                        field.postings.push(Arc::new(postings));
                    }
                    (name, field)
                })
                .collect();

            segments.push(Arc::new(MemorySegment {
                ord,
                snapshot: id,
                doc_base,
                max_doc,
                options: options.clone(),
                fields,
            }));
            doc_base += max_doc;
        }

        Arc::new(MemoryIndex { id, segments })
    }

    fn index_field(&mut self, doc_id: u64, field: &str, options: IndexOptions, tokens: Vec<Token>) {
        if tokens.is_empty() {
            return;
        }

        let stats = self.current.stats.entry(field.to_string()).or_default();
        stats.doc_count += 1;
        stats.sum_total_term_freq += tokens.len() as u64;

        let mut grouped: BTreeMap<String, Vec<TermPosition>> = BTreeMap::new();
        for token in tokens {
            let payload = if options.has_payloads() {
                token.payload.filter(|p| !p.is_empty())
            } else {
                None
            };
            grouped.entry(token.text).or_default().push(TermPosition {
                position: token.position,
                payload,
            });
        }

        let terms = self.current.fields.entry(field.to_string()).or_default();
        for (text, mut positions) in grouped {
            positions.sort_by_key(|p| p.position);
            let posting = match options {
                IndexOptions::Docs => Posting::new(doc_id),
                IndexOptions::Freqs => Posting::with_frequency(doc_id, positions.len() as u32),
                _ => Posting::with_positions(doc_id, positions),
            };
            terms.entry(text).or_default().push(posting);
        }
    }
}

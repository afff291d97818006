//! Index reader traits for term lookup, postings and statistics.
//!
//! An [`IndexSnapshot`] is the top-level, immutable view a search runs
//! against; it is split into [`SegmentReader`]s, each of which hands out
//! postings cursors for the terms it contains.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::index::posting::{PostingFlags, PostingIterator};
use crate::index::term::Term;

/// Identity of a top-level index snapshot.
///
/// Term statistics are only valid for the snapshot they were built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SnapshotId(Uuid);

impl SnapshotId {
    /// Allocate a fresh, never-reused snapshot id.
    pub fn new() -> Self {
        SnapshotId(Uuid::new_v4())
    }
}

impl Default for SnapshotId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a field's postings store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexOptions {
    /// Document ids only; frequencies read as one.
    Docs,
    /// Document ids and frequencies.
    Freqs,
    /// Frequencies and positions.
    Positions,
    /// Positions with payloads.
    PositionsAndPayloads,
}

impl IndexOptions {
    /// Whether positions were indexed.
    pub fn has_positions(self) -> bool {
        self >= IndexOptions::Positions
    }

    /// Whether payloads were indexed.
    pub fn has_payloads(self) -> bool {
        self >= IndexOptions::PositionsAndPayloads
    }

    /// Whether the given postings request can be served.
    pub fn supports(self, flags: PostingFlags) -> bool {
        match flags {
            PostingFlags::Freqs => true,
            PostingFlags::Positions => self.has_positions(),
            // Payload-less fields still serve positional requests; payloads read as absent.
            PostingFlags::Payloads => self.has_positions(),
        }
    }
}

/// Per-segment state of a term, as found in the term dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermState {
    /// Number of documents in the segment containing the term.
    pub doc_freq: u64,
    /// Total number of occurrences in the segment.
    pub total_term_freq: u64,
    /// Ordinal of the term in the segment's dictionary for its field.
    pub ordinal: usize,
}

/// Per-segment statistics for one field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldStats {
    /// Number of documents with at least one term in the field.
    pub doc_count: u64,
    /// Sum of all term frequencies in the field.
    pub sum_total_term_freq: u64,
    /// Sum of document frequencies over all terms in the field.
    pub sum_doc_freq: u64,
}

/// Snapshot-wide statistics for one field, used for scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionStatistics {
    /// The field name.
    pub field: String,
    /// Number of documents in the snapshot.
    pub max_doc: u64,
    /// Number of documents with the field.
    pub doc_count: u64,
    /// Sum of all term frequencies in the field.
    pub sum_total_term_freq: u64,
    /// Sum of document frequencies over all terms in the field.
    pub sum_doc_freq: u64,
}

impl CollectionStatistics {
    /// Average number of tokens per document that has the field.
    pub fn avg_field_length(&self) -> f64 {
        if self.doc_count == 0 {
            0.0
        } else {
            self.sum_total_term_freq as f64 / self.doc_count as f64
        }
    }
}

/// Snapshot-wide statistics for one term, used for scoring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermStatistics {
    /// The term.
    pub term: Term,
    /// Number of documents containing the term.
    pub doc_freq: u64,
    /// Total number of occurrences of the term.
    pub total_term_freq: u64,
}

/// Reader for a single immutable segment.
pub trait SegmentReader: Send + Sync + fmt::Debug {
    /// Ordinal of this segment within its snapshot.
    fn ord(&self) -> usize;

    /// Identity of the snapshot this segment belongs to.
    fn snapshot_id(&self) -> SnapshotId;

    /// First global document id of this segment.
    fn doc_base(&self) -> u64;

    /// Number of documents in this segment; local ids are `0..max_doc`.
    fn max_doc(&self) -> u64;

    /// How the field was indexed, `None` when the segment has no such field.
    fn index_options(&self, field: &str) -> Option<IndexOptions>;

    /// Look up a term in the segment's dictionary.
    fn term_state(&self, term: &Term) -> Result<Option<TermState>>;

    /// Open a postings cursor for a term previously found with [`term_state`].
    ///
    /// Requesting positions on a field indexed without them is an
    /// indexing-mismatch error.
    ///
    /// [`term_state`]: SegmentReader::term_state
    fn postings(
        &self,
        term: &Term,
        state: &TermState,
        flags: PostingFlags,
    ) -> Result<Box<dyn PostingIterator>>;

    /// All terms of a field in sorted order.
    fn terms(&self, field: &str) -> Result<Vec<String>>;

    /// Statistics for a field, `None` when the segment has no such field.
    fn field_stats(&self, field: &str) -> Option<FieldStats>;

    /// Get document frequency for a term.
    fn doc_freq(&self, term: &Term) -> Result<u64> {
        Ok(self.term_state(term)?.map(|s| s.doc_freq).unwrap_or(0))
    }
}

/// A top-level, immutable view over a set of segments.
pub trait IndexSnapshot: Send + Sync + fmt::Debug {
    /// Identity of this snapshot.
    fn id(&self) -> SnapshotId;

    /// The segments, ordered by ordinal.
    fn segments(&self) -> &[Arc<dyn SegmentReader>];

    /// Total number of documents.
    fn max_doc(&self) -> u64 {
        self.segments().iter().map(|s| s.max_doc()).sum()
    }

    /// Statistics for a field aggregated over all segments.
    fn collection_statistics(&self, field: &str) -> Option<CollectionStatistics> {
        let mut found = false;
        let mut stats = CollectionStatistics {
            field: field.to_string(),
            max_doc: self.max_doc(),
            doc_count: 0,
            sum_total_term_freq: 0,
            sum_doc_freq: 0,
        };
        for segment in self.segments() {
            if let Some(field_stats) = segment.field_stats(field) {
                found = true;
                stats.doc_count += field_stats.doc_count;
                stats.sum_total_term_freq += field_stats.sum_total_term_freq;
                stats.sum_doc_freq += field_stats.sum_doc_freq;
            }
        }
        found.then_some(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_ids_are_unique() {
        assert_ne!(SnapshotId::new(), SnapshotId::new());
    }

    #[test]
    fn test_index_options() {
        assert!(!IndexOptions::Freqs.has_positions());
        assert!(IndexOptions::Positions.has_positions());
        assert!(!IndexOptions::Positions.has_payloads());
        assert!(IndexOptions::PositionsAndPayloads.has_payloads());

        assert!(IndexOptions::Docs.supports(PostingFlags::Freqs));
        assert!(!IndexOptions::Freqs.supports(PostingFlags::Positions));
        assert!(IndexOptions::Positions.supports(PostingFlags::Payloads));
    }

    #[test]
    fn test_avg_field_length() {
        let stats = CollectionStatistics {
            field: "body".to_string(),
            max_doc: 4,
            doc_count: 2,
            sum_total_term_freq: 10,
            sum_doc_freq: 6,
        };
        assert_eq!(stats.avg_field_length(), 5.0);
    }
}

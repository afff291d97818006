//! Per-snapshot term state cache.
//!
//! [`TermStates`] records, for one term, the dictionary state in every segment
//! of a snapshot together with aggregated statistics. It is built once per
//! (query, snapshot) pair and then shared read-only across segments; using it
//! against another snapshot is a binding-protocol violation.

use crate::error::{Result, TermwalkError};
use crate::index::reader::{IndexSnapshot, SegmentReader, SnapshotId, TermState, TermStatistics};
use crate::index::term::Term;

/// Term dictionary states of one term across the segments of a snapshot.
#[derive(Debug, Clone)]
pub struct TermStates {
    snapshot: SnapshotId,
    term: Term,
    states: Vec<Option<TermState>>,
    doc_freq: u64,
    total_term_freq: u64,
    has_stats: bool,
}

impl TermStates {
    /// Look the term up in every segment of `snapshot`.
    ///
    /// Statistics are only aggregated when `needs_stats` is set; otherwise
    /// they read as zero.
    pub fn build(snapshot: &dyn IndexSnapshot, term: &Term, needs_stats: bool) -> Result<Self> {
        let segments = snapshot.segments();
        let mut states = Vec::with_capacity(segments.len());
        let mut doc_freq = 0;
        let mut total_term_freq = 0;

        for segment in segments {
            let state = segment.term_state(term)?;
            if needs_stats && let Some(state) = &state {
                doc_freq += state.doc_freq;
                total_term_freq += state.total_term_freq;
            }
            states.push(state);
        }

        Ok(TermStates {
            snapshot: snapshot.id(),
            term: term.clone(),
            states,
            doc_freq,
            total_term_freq,
            has_stats: needs_stats,
        })
    }

    /// Whether these states belong to the given snapshot.
    pub fn was_built_for(&self, snapshot: SnapshotId) -> bool {
        self.snapshot == snapshot
    }

    /// Fail when these states are used against a foreign snapshot.
    ///
    /// Debug builds panic; release builds return an invariant violation.
    pub fn ensure_built_for(&self, snapshot: SnapshotId) -> Result<()> {
        if self.was_built_for(snapshot) {
            return Ok(());
        }
        debug_assert!(
            false,
            "term states for {} were not built for snapshot {snapshot}",
            self.term
        );
        Err(TermwalkError::invariant(format!(
            "term states for {} were not built for snapshot {snapshot}",
            self.term
        )))
    }

    /// State of the term in `segment`, `None` when the segment lacks the term.
    pub fn get(&self, segment: &dyn SegmentReader) -> Result<Option<&TermState>> {
        self.ensure_built_for(segment.snapshot_id())?;
        Ok(self.states.get(segment.ord()).and_then(|s| s.as_ref()))
    }

    /// The term.
    pub fn term(&self) -> &Term {
        &self.term
    }

    /// Aggregated document frequency.
    pub fn doc_freq(&self) -> u64 {
        self.doc_freq
    }

    /// Aggregated total term frequency.
    pub fn total_term_freq(&self) -> u64 {
        self.total_term_freq
    }

    /// Whether statistics were aggregated.
    pub fn has_stats(&self) -> bool {
        self.has_stats
    }

    /// Scoring statistics, `None` when the term occurs nowhere.
    pub fn term_statistics(&self) -> Option<TermStatistics> {
        (self.doc_freq > 0).then(|| TermStatistics {
            term: self.term.clone(),
            doc_freq: self.doc_freq,
            total_term_freq: self.total_term_freq,
        })
    }
}

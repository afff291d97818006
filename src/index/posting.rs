//! Postings: per-term document lists with frequencies, positions and payloads.
//!
//! A [`PostingIterator`] is the forward-only cursor the matching primitives
//! consume. Cursors are single-use and single-threaded; a new one is created
//! for every segment of every query execution.

use std::sync::Arc;

use crate::error::{Result, TermwalkError};

/// Document id reported by an exhausted cursor.
pub const NO_MORE_DOCS: u64 = u64::MAX;

/// How much of a posting list a caller needs.
///
/// Variants are ordered: each one includes everything the previous one does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PostingFlags {
    /// Document ids and in-document frequencies only.
    Freqs,
    /// Frequencies plus term positions.
    Positions,
    /// Positions plus per-position payloads.
    Payloads,
}

impl PostingFlags {
    /// Whether positions must be enumerable.
    pub fn needs_positions(self) -> bool {
        self >= PostingFlags::Positions
    }

    /// Whether payloads must be enumerable.
    pub fn needs_payloads(self) -> bool {
        self >= PostingFlags::Payloads
    }
}

/// One occurrence of a term inside a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermPosition {
    /// Token position.
    pub position: u32,
    /// Auxiliary data stored with the occurrence, if any.
    pub payload: Option<Vec<u8>>,
}

impl TermPosition {
    /// Create a position without payload.
    pub fn new(position: u32) -> Self {
        TermPosition {
            position,
            payload: None,
        }
    }

    /// Create a position carrying a payload.
    pub fn with_payload(position: u32, payload: Vec<u8>) -> Self {
        TermPosition {
            position,
            payload: Some(payload),
        }
    }

    /// Whether the payload is absent or empty.
    pub fn has_empty_payload(&self) -> bool {
        self.payload.as_ref().is_none_or(|p| p.is_empty())
    }
}

/// A single posting in a posting list.
#[derive(Debug, Clone, PartialEq)]
pub struct Posting {
    /// Document ID.
    pub doc_id: u64,
    /// Term frequency in the document.
    pub frequency: u32,
    /// Positions of the term in the document, when the field stores them.
    pub positions: Option<Vec<TermPosition>>,
}

impl Posting {
    /// Create a posting with frequency one.
    pub fn new(doc_id: u64) -> Self {
        Posting {
            doc_id,
            frequency: 1,
            positions: None,
        }
    }

    /// Create a posting with frequency.
    pub fn with_frequency(doc_id: u64, frequency: u32) -> Self {
        Posting {
            doc_id,
            frequency,
            positions: None,
        }
    }

    /// Create a posting with positions; the frequency is the number of positions.
    pub fn with_positions(doc_id: u64, positions: Vec<TermPosition>) -> Self {
        let frequency = positions.len() as u32;
        Posting {
            doc_id,
            frequency,
            positions: Some(positions),
        }
    }

    /// Add a position to this posting.
    pub fn add_position(&mut self, position: TermPosition) {
        match &mut self.positions {
            Some(positions) => {
                positions.push(position);
                self.frequency = positions.len() as u32;
            }
            None => {
                self.positions = Some(vec![position]);
                self.frequency = 1;
            }
        }
    }
}

/// Forward-only cursor over the postings of one term in one segment.
///
/// The cursor starts unpositioned: `doc_id`, `term_freq` and `positions` are
/// only meaningful after `next` or `skip_to` returned `true`.
pub trait PostingIterator: Send + std::fmt::Debug {
    /// Get the current document ID, [`NO_MORE_DOCS`] once exhausted.
    fn doc_id(&self) -> u64;

    /// Get the term frequency in the current document.
    fn term_freq(&self) -> u64;

    /// Get the positions (and payloads, if requested) in the current document.
    ///
    /// Fails when the cursor was opened without [`PostingFlags::Positions`].
    fn positions(&self) -> Result<Vec<TermPosition>>;

    /// Move to the next document.
    fn next(&mut self) -> Result<bool>;

    /// Skip to the first document >= target. Never moves backwards.
    fn skip_to(&mut self, target: u64) -> Result<bool>;

    /// Upper bound on the number of documents this cursor can return.
    fn cost(&self) -> u64;
}

/// Posting iterator over an in-memory, doc-id-sorted posting list.
#[derive(Debug)]
pub struct VecPostingIterator {
    /// The posting data.
    postings: Arc<Vec<Posting>>,
    /// Current position in the posting list.
    position: usize,
    /// Whether next() or skip_to() has been called at least once.
    started: bool,
    /// What the caller asked to enumerate.
    flags: PostingFlags,
}

impl VecPostingIterator {
    /// Create a new iterator.
    pub fn new(postings: Arc<Vec<Posting>>, flags: PostingFlags) -> Self {
        VecPostingIterator {
            postings,
            position: 0,
            started: false,
            flags,
        }
    }

    /// Convenience constructor from an owned list.
    pub fn from_postings(postings: Vec<Posting>, flags: PostingFlags) -> Self {
        Self::new(Arc::new(postings), flags)
    }

    fn current(&self) -> Option<&Posting> {
        if self.started {
            self.postings.get(self.position)
        } else {
            None
        }
    }
}

impl PostingIterator for VecPostingIterator {
    fn doc_id(&self) -> u64 {
        self.current().map(|p| p.doc_id).unwrap_or(NO_MORE_DOCS)
    }

    fn term_freq(&self) -> u64 {
        self.current().map(|p| p.frequency as u64).unwrap_or(0)
    }

    fn positions(&self) -> Result<Vec<TermPosition>> {
        if !self.flags.needs_positions() {
            return Err(TermwalkError::invalid_operation(
                "positions were not requested for this postings cursor",
            ));
        }

        let Some(posting) = self.current() else {
            return Ok(Vec::new());
        };

        let positions = posting.positions.clone().unwrap_or_default();
        if self.flags.needs_payloads() {
            Ok(positions)
        } else {
            Ok(positions
                .into_iter()
                .map(|p| TermPosition::new(p.position))
                .collect())
        }
    }

    fn next(&mut self) -> Result<bool> {
        if !self.started {
            self.started = true;
        } else if self.position < self.postings.len() {
            self.position += 1;
        }
        Ok(self.position < self.postings.len())
    }

    fn skip_to(&mut self, target: u64) -> Result<bool> {
        if !self.started {
            self.started = true;
        }
        if self.position >= self.postings.len() {
            return Ok(false);
        }

        // Postings are sorted by doc id, so binary search the remaining tail.
        let tail = &self.postings[self.position..];
        self.position += tail.partition_point(|p| p.doc_id < target);
        Ok(self.position < self.postings.len())
    }

    fn cost(&self) -> u64 {
        self.postings.len() as u64
    }
}

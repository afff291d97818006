//! Frequency-gated postings.
//!
//! [`MinFrequencyPostingIterator`] hides every document whose in-document term
//! frequency is below a threshold. It changes which documents are visible,
//! never what is reported about a visible one: frequency, positions and
//! payloads pass through untouched.

use crate::error::{Result, TermwalkError};
use crate::index::posting::{PostingIterator, TermPosition};

/// A postings cursor that only exposes documents with `freq >= min_frequency`.
#[derive(Debug)]
pub struct MinFrequencyPostingIterator {
    inner: Box<dyn PostingIterator>,
    min_frequency: u32,
}

impl MinFrequencyPostingIterator {
    /// Wrap `inner`, keeping documents whose frequency is at least `min_frequency`.
    ///
    /// A threshold of one is the identity filter; zero is rejected.
    pub fn new(inner: Box<dyn PostingIterator>, min_frequency: u32) -> Result<Self> {
        if min_frequency == 0 {
            return Err(TermwalkError::invalid_argument(
                "minimum frequency must be at least 1",
            ));
        }
        Ok(MinFrequencyPostingIterator {
            inner,
            min_frequency,
        })
    }

    /// Get the threshold.
    pub fn min_frequency(&self) -> u32 {
        self.min_frequency
    }

    /// Walk forward from the inner cursor's current document until one qualifies.
    fn advance_to_qualifying(&mut self, mut found: bool) -> Result<bool> {
        let min = self.min_frequency as u64;
        while found {
            if self.inner.term_freq() >= min {
                return Ok(true);
            }
            found = self.inner.next()?;
        }
        Ok(false)
    }
}

impl PostingIterator for MinFrequencyPostingIterator {
    fn doc_id(&self) -> u64 {
        self.inner.doc_id()
    }

    fn term_freq(&self) -> u64 {
        self.inner.term_freq()
    }

    fn positions(&self) -> Result<Vec<TermPosition>> {
        self.inner.positions()
    }

    fn next(&mut self) -> Result<bool> {
        let found = self.inner.next()?;
        self.advance_to_qualifying(found)
    }

    fn skip_to(&mut self, target: u64) -> Result<bool> {
        let found = self.inner.skip_to(target)?;
        self.advance_to_qualifying(found)
    }

    fn cost(&self) -> u64 {
        // Upper bound: the filter can only remove documents.
        self.inner.cost()
    }
}

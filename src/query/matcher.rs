//! Matcher implementations for query execution.
//!
//! Matchers are positioned on their first document when constructed, so a
//! collection loop reads `doc_id()` first and calls `next()` afterwards.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt::Debug;

use crate::error::Result;
use crate::index::posting::{NO_MORE_DOCS, PostingIterator};
use crate::query::scorer::{BM25Scorer, Scorer};

/// Trait for document matchers.
pub trait Matcher: Send + Debug {
    /// Get the current document ID.
    fn doc_id(&self) -> u64;

    /// Move to the next matching document.
    fn next(&mut self) -> Result<bool>;

    /// Skip to the first document >= target.
    fn skip_to(&mut self, target: u64) -> Result<bool>;

    /// Get the cost of iterating through this matcher.
    fn cost(&self) -> u64;

    /// Check if this matcher is exhausted.
    fn is_exhausted(&self) -> bool;

    /// Get the term frequency for the current document.
    fn term_freq(&self) -> u64 {
        1
    }

    /// Score of the current document; zero when scores were not requested.
    fn score(&self) -> f32 {
        0.0
    }
}

/// A matcher that matches no documents.
#[derive(Debug, Default)]
pub struct EmptyMatcher;

impl EmptyMatcher {
    /// Create a new empty matcher.
    pub fn new() -> Self {
        EmptyMatcher
    }
}

impl Matcher for EmptyMatcher {
    fn doc_id(&self) -> u64 {
        NO_MORE_DOCS
    }

    fn next(&mut self) -> Result<bool> {
        Ok(false)
    }

    fn skip_to(&mut self, _target: u64) -> Result<bool> {
        Ok(false)
    }

    fn cost(&self) -> u64 {
        0
    }

    fn is_exhausted(&self) -> bool {
        true
    }
}

/// A matcher based on a posting iterator, optionally scoring with BM25.
#[derive(Debug)]
pub struct PostingMatcher {
    posting_iter: Box<dyn PostingIterator>,
    scorer: Option<BM25Scorer>,
    exhausted: bool,
    cost: u64,
}

impl PostingMatcher {
    /// Create a new posting matcher positioned on its first document.
    pub fn new(mut posting_iter: Box<dyn PostingIterator>, scorer: Option<BM25Scorer>) -> Result<Self> {
        let cost = posting_iter.cost();
        let exhausted = !posting_iter.next()?;

        Ok(PostingMatcher {
            posting_iter,
            scorer,
            exhausted,
            cost,
        })
    }
}

impl Matcher for PostingMatcher {
    fn doc_id(&self) -> u64 {
        if self.exhausted {
            NO_MORE_DOCS
        } else {
            self.posting_iter.doc_id()
        }
    }

    fn next(&mut self) -> Result<bool> {
        if self.exhausted {
            return Ok(false);
        }
        let has_next = self.posting_iter.next()?;
        self.exhausted = !has_next;
        Ok(has_next)
    }

    fn skip_to(&mut self, target: u64) -> Result<bool> {
        if self.exhausted {
            return Ok(false);
        }
        let found = self.posting_iter.skip_to(target)?;
        self.exhausted = !found;
        Ok(found)
    }

    fn cost(&self) -> u64 {
        self.cost
    }

    fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    fn term_freq(&self) -> u64 {
        if self.exhausted {
            0
        } else {
            self.posting_iter.term_freq()
        }
    }

    fn score(&self) -> f32 {
        match &self.scorer {
            Some(scorer) if !self.exhausted => {
                scorer.score(self.doc_id(), self.posting_iter.term_freq() as f32)
            }
            _ => 0.0,
        }
    }
}

/// A helper struct for tracking matchers in the disjunction heap.
#[derive(Debug)]
struct MatcherEntry {
    matcher: Box<dyn Matcher>,
}

impl PartialEq for MatcherEntry {
    fn eq(&self, other: &Self) -> bool {
        self.matcher.doc_id() == other.matcher.doc_id()
    }
}

impl Eq for MatcherEntry {}

impl PartialOrd for MatcherEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MatcherEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap: lower doc IDs come first
        other.matcher.doc_id().cmp(&self.matcher.doc_id())
    }
}

/// A matcher that implements disjunction (OR) of multiple matchers.
#[derive(Debug)]
pub struct DisjunctionMatcher {
    /// Min-heap of active matchers, ordered by current doc_id.
    heap: BinaryHeap<MatcherEntry>,
    current_doc: u64,
    exhausted: bool,
    cost: u64,
}

impl DisjunctionMatcher {
    /// Create a new disjunction matcher from positioned matchers.
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Self {
        let mut heap = BinaryHeap::new();
        let mut cost = 0;

        for matcher in matchers {
            if !matcher.is_exhausted() {
                cost += matcher.cost();
                heap.push(MatcherEntry { matcher });
            }
        }

        let current_doc = heap
            .peek()
            .map(|entry| entry.matcher.doc_id())
            .unwrap_or(NO_MORE_DOCS);
        let exhausted = heap.is_empty();

        DisjunctionMatcher {
            heap,
            current_doc,
            exhausted,
            cost,
        }
    }

    fn update_current(&mut self) {
        match self.heap.peek() {
            Some(entry) => {
                self.current_doc = entry.matcher.doc_id();
                self.exhausted = false;
            }
            None => {
                self.current_doc = NO_MORE_DOCS;
                self.exhausted = true;
            }
        }
    }
}

impl Matcher for DisjunctionMatcher {
    fn doc_id(&self) -> u64 {
        self.current_doc
    }

    fn next(&mut self) -> Result<bool> {
        if self.exhausted {
            return Ok(false);
        }

        // Advance every matcher sitting on the current document.
        let current_doc = self.current_doc;
        let mut reinsert = Vec::new();
        while let Some(entry) = self.heap.peek_mut() {
            if entry.matcher.doc_id() != current_doc {
                break;
            }
            let mut entry = std::collections::binary_heap::PeekMut::pop(entry);
            if entry.matcher.next()? {
                reinsert.push(entry);
            }
        }
        self.heap.extend(reinsert);

        self.update_current();
        Ok(!self.exhausted)
    }

    fn skip_to(&mut self, target: u64) -> Result<bool> {
        if self.exhausted || target <= self.current_doc {
            return Ok(!self.exhausted);
        }

        let mut reinsert = Vec::new();
        for mut entry in self.heap.drain() {
            let found = if entry.matcher.doc_id() >= target {
                true
            } else {
                entry.matcher.skip_to(target)?
            };
            if found {
                reinsert.push(entry);
            }
        }
        self.heap.extend(reinsert);

        self.update_current();
        Ok(!self.exhausted)
    }

    fn cost(&self) -> u64 {
        self.cost
    }

    fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    fn term_freq(&self) -> u64 {
        self.heap
            .iter()
            .filter(|entry| entry.matcher.doc_id() == self.current_doc)
            .map(|entry| entry.matcher.term_freq())
            .sum()
    }

    fn score(&self) -> f32 {
        self.heap
            .iter()
            .filter(|entry| entry.matcher.doc_id() == self.current_doc)
            .map(|entry| entry.matcher.score())
            .sum()
    }
}

/// A matcher that implements conjunction (AND) of multiple matchers.
#[derive(Debug)]
pub struct ConjunctionMatcher {
    matchers: Vec<Box<dyn Matcher>>,
    current_doc: u64,
    exhausted: bool,
    cost: u64,
}

impl ConjunctionMatcher {
    /// Create a new conjunction matcher from positioned matchers.
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Result<Self> {
        let cost = matchers.iter().map(|m| m.cost()).min().unwrap_or(0);
        let mut matcher = ConjunctionMatcher {
            exhausted: matchers.is_empty(),
            matchers,
            current_doc: NO_MORE_DOCS,
            cost,
        };
        matcher.advance_to_alignment()?;
        Ok(matcher)
    }

    /// Advance all matchers until they sit on the same document.
    fn advance_to_alignment(&mut self) -> Result<bool> {
        if self.exhausted {
            self.current_doc = NO_MORE_DOCS;
            return Ok(false);
        }

        loop {
            let mut max_doc = 0;
            for matcher in &self.matchers {
                let doc_id = matcher.doc_id();
                if doc_id == NO_MORE_DOCS {
                    return Ok(self.exhaust());
                }
                max_doc = max_doc.max(doc_id);
            }

            let mut all_aligned = true;
            for matcher in &mut self.matchers {
                if matcher.doc_id() < max_doc {
                    if !matcher.skip_to(max_doc)? {
                        return Ok(self.exhaust());
                    }
                    if matcher.doc_id() != max_doc {
                        all_aligned = false;
                    }
                }
            }

            if all_aligned {
                self.current_doc = max_doc;
                return Ok(true);
            }
        }
    }

    fn exhaust(&mut self) -> bool {
        self.exhausted = true;
        self.current_doc = NO_MORE_DOCS;
        false
    }
}

impl Matcher for ConjunctionMatcher {
    fn doc_id(&self) -> u64 {
        self.current_doc
    }

    fn next(&mut self) -> Result<bool> {
        if self.exhausted {
            return Ok(false);
        }
        if !self.matchers[0].next()? {
            return Ok(self.exhaust());
        }
        self.advance_to_alignment()
    }

    fn skip_to(&mut self, target: u64) -> Result<bool> {
        if self.exhausted || target <= self.current_doc {
            return Ok(!self.exhausted);
        }
        if !self.matchers[0].skip_to(target)? {
            return Ok(self.exhaust());
        }
        self.advance_to_alignment()
    }

    fn cost(&self) -> u64 {
        self.cost
    }

    fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    fn term_freq(&self) -> u64 {
        self.matchers.iter().map(|m| m.term_freq()).sum()
    }

    fn score(&self) -> f32 {
        self.matchers.iter().map(|m| m.score()).sum()
    }
}

/// A matcher that excludes documents matched by negative matchers.
#[derive(Debug)]
pub struct ConjunctionNotMatcher {
    positive: Box<dyn Matcher>,
    negatives: Vec<Box<dyn Matcher>>,
    current_doc: u64,
    exhausted: bool,
}

impl ConjunctionNotMatcher {
    /// Create a new conjunction-not matcher.
    pub fn new(positive: Box<dyn Matcher>, negatives: Vec<Box<dyn Matcher>>) -> Result<Self> {
        let mut matcher = ConjunctionNotMatcher {
            positive,
            negatives,
            current_doc: NO_MORE_DOCS,
            exhausted: false,
        };
        matcher.advance_to_next_valid()?;
        Ok(matcher)
    }

    fn is_excluded(&mut self, doc_id: u64) -> Result<bool> {
        for negative in &mut self.negatives {
            if negative.doc_id() < doc_id {
                negative.skip_to(doc_id)?;
            }
            if negative.doc_id() == doc_id {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Move the positive side forward until its document is not excluded.
    fn advance_to_next_valid(&mut self) -> Result<bool> {
        loop {
            if self.positive.is_exhausted() {
                self.exhausted = true;
                self.current_doc = NO_MORE_DOCS;
                return Ok(false);
            }

            let doc_id = self.positive.doc_id();
            if !self.is_excluded(doc_id)? {
                self.current_doc = doc_id;
                return Ok(true);
            }

            self.positive.next()?;
        }
    }
}

impl Matcher for ConjunctionNotMatcher {
    fn doc_id(&self) -> u64 {
        self.current_doc
    }

    fn next(&mut self) -> Result<bool> {
        if self.exhausted {
            return Ok(false);
        }
        self.positive.next()?;
        self.advance_to_next_valid()
    }

    fn skip_to(&mut self, target: u64) -> Result<bool> {
        if self.exhausted || target <= self.current_doc {
            return Ok(!self.exhausted);
        }
        self.positive.skip_to(target)?;
        self.advance_to_next_valid()
    }

    fn cost(&self) -> u64 {
        self.positive.cost()
    }

    fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    fn term_freq(&self) -> u64 {
        self.positive.term_freq()
    }

    fn score(&self) -> f32 {
        self.positive.score()
    }
}

/// Required documents, with optional clauses contributing to the score only.
#[derive(Debug)]
pub struct RequiredOptionalMatcher {
    required: Box<dyn Matcher>,
    optional: Box<dyn Matcher>,
}

impl RequiredOptionalMatcher {
    /// Create a new matcher; both sides must already be positioned.
    pub fn new(required: Box<dyn Matcher>, optional: Box<dyn Matcher>) -> Result<Self> {
        let mut matcher = RequiredOptionalMatcher { required, optional };
        matcher.sync_optional()?;
        Ok(matcher)
    }

    fn sync_optional(&mut self) -> Result<()> {
        let doc = self.required.doc_id();
        if !self.required.is_exhausted()
            && !self.optional.is_exhausted()
            && self.optional.doc_id() < doc
        {
            self.optional.skip_to(doc)?;
        }
        Ok(())
    }
}

impl Matcher for RequiredOptionalMatcher {
    fn doc_id(&self) -> u64 {
        self.required.doc_id()
    }

    fn next(&mut self) -> Result<bool> {
        let found = self.required.next()?;
        self.sync_optional()?;
        Ok(found)
    }

    fn skip_to(&mut self, target: u64) -> Result<bool> {
        let found = self.required.skip_to(target)?;
        self.sync_optional()?;
        Ok(found)
    }

    fn cost(&self) -> u64 {
        self.required.cost()
    }

    fn is_exhausted(&self) -> bool {
        self.required.is_exhausted()
    }

    fn term_freq(&self) -> u64 {
        self.required.term_freq()
    }

    fn score(&self) -> f32 {
        let doc = self.required.doc_id();
        let optional = if self.optional.doc_id() == doc {
            self.optional.score()
        } else {
            0.0
        };
        self.required.score() + optional
    }
}

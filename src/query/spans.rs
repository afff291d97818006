//! Positional match enumeration.
//!
//! A [`Spans`] cursor walks the documents of one segment that contain at least
//! one span, and exposes every span of the current document at once. Like
//! postings, span cursors start unpositioned.

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::index::posting::{NO_MORE_DOCS, PostingIterator};

/// A positional match: `[start, end)` in token positions.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Span {
    /// Start position (inclusive).
    pub start: u32,
    /// End position (exclusive).
    pub end: u32,
    /// Non-empty payloads of the occurrences that make up the span.
    pub payloads: Vec<Vec<u8>>,
}

impl Span {
    /// Create a span without payloads.
    pub fn new(start: u32, end: u32) -> Self {
        Span {
            start,
            end,
            payloads: Vec::new(),
        }
    }

    /// Get the length of this span.
    pub fn length(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    /// Check if this span overlaps with another span.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Whether no occurrence in the span carries a payload.
    pub fn has_empty_payload(&self) -> bool {
        self.payloads.is_empty()
    }
}

/// Forward-only cursor over documents with spans.
pub trait Spans: Send + Debug {
    /// Current document, [`NO_MORE_DOCS`] once exhausted.
    fn doc_id(&self) -> u64;

    /// Move to the next document with at least one span.
    fn next(&mut self) -> Result<bool>;

    /// Move to the first document >= target with at least one span.
    fn skip_to(&mut self, target: u64) -> Result<bool>;

    /// Spans of the current document, ordered by start then end.
    fn current_spans(&self) -> &[Span];

    /// Upper bound on the number of documents.
    fn cost(&self) -> u64;

    /// Sloppy frequency of the current document: sum of `1 / (1 + gap)` over
    /// spans, where the gap is the slack beyond one position per term.
    fn sloppy_freq(&self) -> f32 {
        self.current_spans()
            .iter()
            .map(|s| 1.0 / (1.0 + s.length().saturating_sub(1) as f32))
            .sum()
    }
}

/// Spans of a single term, one per occurrence.
#[derive(Debug)]
pub struct TermSpans {
    postings: Box<dyn PostingIterator>,
    spans: Vec<Span>,
}

impl TermSpans {
    /// Wrap a postings cursor opened with positions.
    pub fn new(postings: Box<dyn PostingIterator>) -> Self {
        TermSpans {
            postings,
            spans: Vec::new(),
        }
    }

    fn load(&mut self, found: bool) -> Result<bool> {
        self.spans.clear();
        if !found {
            return Ok(false);
        }
        for position in self.postings.positions()? {
            let payloads = match position.payload {
                Some(payload) if !payload.is_empty() => vec![payload],
                _ => Vec::new(),
            };
            self.spans.push(Span {
                start: position.position,
                end: position.position + 1,
                payloads,
            });
        }
        self.spans.sort();
        Ok(true)
    }
}

impl Spans for TermSpans {
    fn doc_id(&self) -> u64 {
        self.postings.doc_id()
    }

    fn next(&mut self) -> Result<bool> {
        let found = self.postings.next()?;
        self.load(found)
    }

    fn skip_to(&mut self, target: u64) -> Result<bool> {
        let found = self.postings.skip_to(target)?;
        self.load(found)
    }

    fn current_spans(&self) -> &[Span] {
        &self.spans
    }

    fn cost(&self) -> u64 {
        self.postings.cost()
    }
}

/// Document-level filters applied by [`FilterSpans`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanFilter {
    /// Keep only spans without payloads.
    EmptyPayload,
    /// Keep a document only when it has at least this many spans.
    MinFrequency(u32),
}

/// Spans filtered per span (payload check) or per document (minimum count).
#[derive(Debug)]
pub struct FilterSpans {
    inner: Box<dyn Spans>,
    filter: SpanFilter,
    spans: Vec<Span>,
}

impl FilterSpans {
    /// Wrap `inner`.
    pub fn new(inner: Box<dyn Spans>, filter: SpanFilter) -> Self {
        FilterSpans {
            inner,
            filter,
            spans: Vec::new(),
        }
    }

    /// Walk forward from the inner cursor's current document until one is accepted.
    fn advance_to_accepted(&mut self, mut found: bool) -> Result<bool> {
        while found {
            self.spans.clear();
            match self.filter {
                SpanFilter::EmptyPayload => self.spans.extend(
                    self.inner
                        .current_spans()
                        .iter()
                        .filter(|s| s.has_empty_payload())
                        .cloned(),
                ),
                SpanFilter::MinFrequency(min) => {
                    if self.inner.current_spans().len() >= min as usize {
                        self.spans.extend_from_slice(self.inner.current_spans());
                    }
                }
            }
            if !self.spans.is_empty() {
                return Ok(true);
            }
            found = self.inner.next()?;
        }
        self.spans.clear();
        Ok(false)
    }
}

impl Spans for FilterSpans {
    fn doc_id(&self) -> u64 {
        self.inner.doc_id()
    }

    fn next(&mut self) -> Result<bool> {
        let found = self.inner.next()?;
        self.advance_to_accepted(found)
    }

    fn skip_to(&mut self, target: u64) -> Result<bool> {
        let found = self.inner.skip_to(target)?;
        self.advance_to_accepted(found)
    }

    fn current_spans(&self) -> &[Span] {
        &self.spans
    }

    fn cost(&self) -> u64 {
        self.inner.cost()
    }
}

/// Union of several span cursors over the same field.
#[derive(Debug)]
pub struct OrSpans {
    subs: Vec<Box<dyn Spans>>,
    /// Whether each sub cursor has been started and is not exhausted.
    alive: Vec<bool>,
    started: bool,
    current_doc: u64,
    spans: Vec<Span>,
}

impl OrSpans {
    /// Create a union; an empty list matches nothing.
    pub fn new(subs: Vec<Box<dyn Spans>>) -> Self {
        let alive = vec![false; subs.len()];
        OrSpans {
            subs,
            alive,
            started: false,
            current_doc: NO_MORE_DOCS,
            spans: Vec::new(),
        }
    }

    fn collect_current(&mut self) -> bool {
        self.current_doc = self
            .subs
            .iter()
            .zip(&self.alive)
            .filter(|(_, alive)| **alive)
            .map(|(s, _)| s.doc_id())
            .min()
            .unwrap_or(NO_MORE_DOCS);

        self.spans.clear();
        if self.current_doc == NO_MORE_DOCS {
            return false;
        }
        for (sub, alive) in self.subs.iter().zip(&self.alive) {
            if *alive && sub.doc_id() == self.current_doc {
                self.spans.extend_from_slice(sub.current_spans());
            }
        }
        self.spans.sort();
        true
    }
}

impl Spans for OrSpans {
    fn doc_id(&self) -> u64 {
        self.current_doc
    }

    fn next(&mut self) -> Result<bool> {
        if !self.started {
            self.started = true;
            for (sub, alive) in self.subs.iter_mut().zip(self.alive.iter_mut()) {
                *alive = sub.next()?;
            }
        } else {
            let current = self.current_doc;
            for (sub, alive) in self.subs.iter_mut().zip(self.alive.iter_mut()) {
                if *alive && sub.doc_id() == current {
                    *alive = sub.next()?;
                }
            }
        }
        Ok(self.collect_current())
    }

    fn skip_to(&mut self, target: u64) -> Result<bool> {
        let first = !self.started;
        self.started = true;
        for (sub, alive) in self.subs.iter_mut().zip(self.alive.iter_mut()) {
            if first || (*alive && sub.doc_id() < target) {
                *alive = sub.skip_to(target)?;
            }
        }
        Ok(self.collect_current())
    }

    fn current_spans(&self) -> &[Span] {
        &self.spans
    }

    fn cost(&self) -> u64 {
        self.subs.iter().map(|s| s.cost()).sum()
    }
}

/// Spans of several clauses that occur within `slop` positions of each other.
#[derive(Debug)]
pub struct NearSpans {
    subs: Vec<Box<dyn Spans>>,
    slop: u32,
    in_order: bool,
    started: bool,
    current_doc: u64,
    spans: Vec<Span>,
}

impl NearSpans {
    /// Create a proximity cursor over at least one clause.
    pub fn new(subs: Vec<Box<dyn Spans>>, slop: u32, in_order: bool) -> Self {
        NearSpans {
            subs,
            slop,
            in_order,
            started: false,
            current_doc: NO_MORE_DOCS,
            spans: Vec::new(),
        }
    }

    /// Position every clause for the first time.
    fn start(&mut self, target: Option<u64>) -> Result<bool> {
        self.started = true;
        for sub in &mut self.subs {
            let found = match target {
                Some(target) => sub.skip_to(target)?,
                None => sub.next()?,
            };
            if !found {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Bring every clause onto the same document, starting from clause 0's position.
    fn align(&mut self, mut found: bool) -> Result<bool> {
        'docs: while found {
            let mut target = self.subs[0].doc_id();
            loop {
                let mut aligned = true;
                for sub in &mut self.subs {
                    if sub.doc_id() < target && !sub.skip_to(target)? {
                        break 'docs;
                    }
                    if sub.doc_id() > target {
                        target = sub.doc_id();
                        aligned = false;
                    }
                }
                if aligned {
                    break;
                }
            }

            self.current_doc = target;
            self.compute_matches();
            if !self.spans.is_empty() {
                return Ok(true);
            }
            found = self.subs[0].next()?;
        }
        self.current_doc = NO_MORE_DOCS;
        self.spans.clear();
        Ok(false)
    }

    fn compute_matches(&mut self) {
        let clause_spans: Vec<&[Span]> = self.subs.iter().map(|s| s.current_spans()).collect();
        let mut matches = Vec::new();
        let mut chosen = Vec::with_capacity(clause_spans.len());
        Self::find_near_spans(
            &clause_spans,
            self.slop,
            self.in_order,
            &mut chosen,
            &mut matches,
        );
        matches.sort();
        matches.dedup();
        self.spans = matches;
    }

    /// Recursively pick one span per clause and keep combinations within the slop.
    fn find_near_spans<'a>(
        clause_spans: &[&'a [Span]],
        slop: u32,
        in_order: bool,
        chosen: &mut Vec<&'a Span>,
        result: &mut Vec<Span>,
    ) {
        let index = chosen.len();
        if index == clause_spans.len() {
            if let Some(span) = Self::combine(chosen, slop) {
                result.push(span);
            }
            return;
        }

        for span in clause_spans[index] {
            if in_order && chosen.last().is_some_and(|prev| span.start < prev.end) {
                continue;
            }
            if !in_order && chosen.iter().any(|prev| prev.overlaps(span)) {
                continue;
            }
            chosen.push(span);
            Self::find_near_spans(clause_spans, slop, in_order, chosen, result);
            chosen.pop();
        }
    }

    fn combine(chosen: &[&Span], slop: u32) -> Option<Span> {
        let start = chosen.iter().map(|s| s.start).min()?;
        let end = chosen.iter().map(|s| s.end).max()?;
        let covered: u32 = chosen.iter().map(|s| s.length()).sum();
        let gaps = (end - start).saturating_sub(covered);
        if gaps > slop {
            return None;
        }
        Some(Span {
            start,
            end,
            payloads: chosen.iter().flat_map(|s| s.payloads.iter().cloned()).collect(),
        })
    }
}

impl Spans for NearSpans {
    fn doc_id(&self) -> u64 {
        self.current_doc
    }

    fn next(&mut self) -> Result<bool> {
        if self.subs.is_empty() {
            return Ok(false);
        }
        let found = if self.started {
            self.subs[0].next()?
        } else {
            self.start(None)?
        };
        self.align(found)
    }

    fn skip_to(&mut self, target: u64) -> Result<bool> {
        if self.subs.is_empty() {
            return Ok(false);
        }
        let found = if self.started {
            self.subs[0].skip_to(target)?
        } else {
            self.start(Some(target))?
        };
        self.align(found)
    }

    fn current_spans(&self) -> &[Span] {
        &self.spans
    }

    fn cost(&self) -> u64 {
        self.subs.iter().map(|s| s.cost()).min().unwrap_or(0)
    }

    fn sloppy_freq(&self) -> f32 {
        // The gap of a near match is its width minus the positions its clauses cover.
        self.spans
            .iter()
            .map(|s| {
                let clauses = self.subs.len() as u32;
                1.0 / (1.0 + s.length().saturating_sub(clauses) as f32)
            })
            .sum()
    }
}

//! Collector implementations for gathering search results.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A matching document and its score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreDoc {
    /// Global document id.
    pub doc_id: u64,
    /// Score of the document.
    pub score: f32,
}

/// The result of a top-k search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopDocs {
    /// Number of matching documents, including those not returned.
    pub total_hits: u64,
    /// Best score, `None` when nothing matched.
    pub max_score: Option<f32>,
    /// Best hits, by descending score then ascending document id.
    pub hits: Vec<ScoreDoc>,
}

/// Trait for collecting search results.
pub trait Collector: Send + Debug {
    /// Collect a document hit.
    fn collect(&mut self, doc_id: u64, score: f32) -> Result<()>;

    /// Get the total number of hits collected.
    fn total_hits(&self) -> u64;

    /// Reset the collector for a new search.
    fn reset(&mut self);
}

/// Heap entry; the greatest entry is the worst hit.
#[derive(Debug, Clone, Copy)]
struct Entry(ScoreDoc);

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .0
            .score
            .total_cmp(&self.0.score)
            .then_with(|| self.0.doc_id.cmp(&other.0.doc_id))
    }
}

/// A collector that keeps the top N documents by score.
#[derive(Debug)]
pub struct TopDocsCollector {
    /// Maximum number of documents to collect.
    max_docs: usize,
    /// Collected hits, worst on top.
    hits: BinaryHeap<Entry>,
    /// Total number of documents processed.
    total_hits: u64,
}

impl TopDocsCollector {
    /// Create a new top docs collector.
    pub fn new(max_docs: usize) -> Self {
        TopDocsCollector {
            max_docs,
            hits: BinaryHeap::with_capacity(max_docs.min(1024)),
            total_hits: 0,
        }
    }

    /// Get the maximum number of documents to collect.
    pub fn max_docs(&self) -> usize {
        self.max_docs
    }

    fn offer(&mut self, entry: Entry) {
        if self.max_docs == 0 {
            return;
        }
        if self.hits.len() < self.max_docs {
            self.hits.push(entry);
        } else if let Some(mut worst) = self.hits.peek_mut()
            && entry < *worst
        {
            *worst = entry;
        }
    }

    /// Fold the hits of another collector (e.g. from another segment) into this one.
    pub fn merge(&mut self, other: TopDocsCollector) {
        self.total_hits += other.total_hits;
        for entry in other.hits {
            self.offer(entry);
        }
    }

    /// Finish collection.
    pub fn into_top_docs(self) -> TopDocs {
        let mut entries = self.hits.into_vec();
        entries.sort();
        let hits: Vec<ScoreDoc> = entries.into_iter().map(|e| e.0).collect();
        TopDocs {
            total_hits: self.total_hits,
            max_score: hits.first().map(|h| h.score),
            hits,
        }
    }
}

impl Collector for TopDocsCollector {
    fn collect(&mut self, doc_id: u64, score: f32) -> Result<()> {
        self.total_hits += 1;
        self.offer(Entry(ScoreDoc { doc_id, score }));
        Ok(())
    }

    fn total_hits(&self) -> u64 {
        self.total_hits
    }

    fn reset(&mut self) {
        self.hits.clear();
        self.total_hits = 0;
    }
}

/// A collector that just counts the number of matching documents.
#[derive(Debug, Default)]
pub struct CountCollector {
    /// Total number of documents that matched.
    count: u64,
}

impl CountCollector {
    /// Create a new count collector.
    pub fn new() -> Self {
        CountCollector { count: 0 }
    }

    /// Get the count of matching documents.
    pub fn count(&self) -> u64 {
        self.count
    }
}

impl Collector for CountCollector {
    fn collect(&mut self, _doc_id: u64, _score: f32) -> Result<()> {
        self.count += 1;
        Ok(())
    }

    fn total_hits(&self) -> u64 {
        self.count
    }

    fn reset(&mut self) {
        self.count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_docs_collector() {
        let mut collector = TopDocsCollector::new(2);
        collector.collect(1, 0.5).unwrap();
        collector.collect(2, 0.9).unwrap();
        collector.collect(3, 0.7).unwrap();
        collector.collect(4, 0.1).unwrap();

        assert_eq!(collector.total_hits(), 4);
        let top = collector.into_top_docs();
        assert_eq!(top.total_hits, 4);
        assert_eq!(top.max_score, Some(0.9));
        let docs: Vec<u64> = top.hits.iter().map(|h| h.doc_id).collect();
        assert_eq!(docs, vec![2, 3]);
    }

    #[test]
    fn test_ties_prefer_lower_doc_ids() {
        let mut collector = TopDocsCollector::new(2);
        for doc in [5, 3, 9, 1] {
            collector.collect(doc, 1.0).unwrap();
        }
        let docs: Vec<u64> = collector
            .into_top_docs()
            .hits
            .iter()
            .map(|h| h.doc_id)
            .collect();
        assert_eq!(docs, vec![1, 3]);
    }

    #[test]
    fn test_merge() {
        let mut first = TopDocsCollector::new(3);
        first.collect(0, 0.2).unwrap();
        first.collect(1, 0.8).unwrap();
        let mut second = TopDocsCollector::new(3);
        second.collect(10, 0.5).unwrap();
        second.collect(11, 0.9).unwrap();

        first.merge(second);
        let top = first.into_top_docs();
        assert_eq!(top.total_hits, 4);
        let docs: Vec<u64> = top.hits.iter().map(|h| h.doc_id).collect();
        assert_eq!(docs, vec![11, 1, 10]);
    }

    #[test]
    fn test_zero_sized_collector_still_counts() {
        let mut collector = TopDocsCollector::new(0);
        collector.collect(0, 1.0).unwrap();
        let top = collector.into_top_docs();
        assert_eq!(top.total_hits, 1);
        assert!(top.hits.is_empty());
        assert_eq!(top.max_score, None);
    }

    #[test]
    fn test_count_collector() {
        let mut collector = CountCollector::new();
        collector.collect(0, 0.0).unwrap();
        collector.collect(7, 2.0).unwrap();
        assert_eq!(collector.count(), 2);

        collector.reset();
        assert_eq!(collector.total_hits(), 0);
    }
}

//! Scoring implementations for ranking search results.

use std::fmt::Debug;

use crate::index::reader::{CollectionStatistics, TermStatistics};
use crate::query::explanation::Explanation;

/// Trait for document scorers.
pub trait Scorer: Send + Sync + Debug {
    /// Calculate the score for a document.
    fn score(&self, doc_id: u64, term_freq: f32) -> f32;

    /// Get the boost factor for this scorer.
    fn boost(&self) -> f32;

    /// Set the boost factor for this scorer.
    fn set_boost(&mut self, boost: f32);

    /// Get the maximum possible score.
    fn max_score(&self) -> f32;

    /// Get the name of this scorer.
    fn name(&self) -> &'static str;
}

/// BM25 scorer implementation.
///
/// Field lengths are not stored by the index, so every document is scored
/// as if it had the average field length.
#[derive(Debug, Clone)]
pub struct BM25Scorer {
    /// Sum of the idf of every scored term.
    idf: f32,
    /// Document frequencies the idf was computed from.
    doc_freqs: Vec<u64>,
    /// Average field length.
    avg_field_length: f64,
    /// Total number of documents in the index.
    total_docs: u64,
    /// Boost factor.
    boost: f32,
    /// BM25 k1 parameter.
    k1: f32,
    /// BM25 b parameter.
    b: f32,
}

impl BM25Scorer {
    /// Create a new BM25 scorer for a single term.
    pub fn new(doc_freq: u64, avg_field_length: f64, total_docs: u64, boost: f32) -> Self {
        BM25Scorer {
            idf: Self::idf(doc_freq, total_docs),
            doc_freqs: vec![doc_freq],
            avg_field_length,
            total_docs,
            boost,
            k1: 1.2,
            b: 0.75,
        }
    }

    /// Create a scorer for a group of terms matched together (spans); idfs are summed.
    pub fn for_terms(
        terms: &[TermStatistics],
        collection: &CollectionStatistics,
        boost: f32,
    ) -> Self {
        let doc_freqs: Vec<u64> = terms.iter().map(|t| t.doc_freq).collect();
        BM25Scorer {
            idf: doc_freqs
                .iter()
                .map(|&df| Self::idf(df, collection.max_doc))
                .sum(),
            doc_freqs,
            avg_field_length: collection.avg_field_length(),
            total_docs: collection.max_doc,
            boost,
            k1: 1.2,
            b: 0.75,
        }
    }

    /// IDF = ln(1 + (N - df + 0.5) / (df + 0.5)); never negative.
    fn idf(doc_freq: u64, total_docs: u64) -> f32 {
        if doc_freq == 0 || total_docs == 0 {
            return 0.0;
        }

        let n = total_docs as f32;
        let df = doc_freq as f32;
        (1.0 + (n - df + 0.5) / (df + 0.5)).ln()
    }

    /// Calculate the TF (Term Frequency) component.
    fn tf(&self, term_freq: f32, field_length: f32) -> f32 {
        if term_freq == 0.0 {
            return 0.0;
        }

        let avg_len = self.avg_field_length as f32;
        let norm_factor = if avg_len > 0.0 {
            1.0 - self.b + self.b * (field_length / avg_len)
        } else {
            1.0
        };

        // TF = (tf * (k1 + 1)) / (tf + k1 * norm_factor)
        (term_freq * (self.k1 + 1.0)) / (term_freq + self.k1 * norm_factor)
    }

    /// Get the k1 parameter.
    pub fn k1(&self) -> f32 {
        self.k1
    }

    /// Get the b parameter.
    pub fn b(&self) -> f32 {
        self.b
    }

    /// Explain the score for a document with the given (possibly sloppy) frequency.
    pub fn explain(&self, freq: Explanation) -> Explanation {
        let field_length = self.avg_field_length as f32;
        let tf = self.tf(freq.value(), field_length);
        let score = self.boost * self.idf * tf;

        let idf = Explanation::matched(
            self.idf,
            "idf, computed as log(1 + (N - n + 0.5) / (n + 0.5)) from:",
        )
        .with_details(
            self.doc_freqs
                .iter()
                .map(|&df| Explanation::matched(df as f32, "n, number of documents containing term"))
                .collect(),
        )
        .with_detail(Explanation::matched(
            self.total_docs as f32,
            "N, total number of documents with field",
        ));

        let tf = Explanation::matched(
            tf,
            "tf, computed as freq * (k1 + 1) / (freq + k1 * (1 - b + b * dl / avgdl)) from:",
        )
        .with_detail(freq)
        .with_detail(Explanation::matched(self.k1, "k1, term saturation parameter"))
        .with_detail(Explanation::matched(self.b, "b, length normalization parameter"))
        .with_detail(Explanation::matched(field_length, "dl, length of field (approximated)"))
        .with_detail(Explanation::matched(
            self.avg_field_length as f32,
            "avgdl, average length of field",
        ));

        Explanation::matched(score, "score, computed as boost * idf * tf from:")
            .with_detail(Explanation::matched(self.boost, "boost"))
            .with_detail(idf)
            .with_detail(tf)
    }
}

impl Scorer for BM25Scorer {
    fn score(&self, _doc_id: u64, term_freq: f32) -> f32 {
        if self.idf == 0.0 {
            return 0.0;
        }

        let field_length = self.avg_field_length as f32;
        self.boost * self.idf * self.tf(term_freq, field_length)
    }

    fn boost(&self) -> f32 {
        self.boost
    }

    fn set_boost(&mut self, boost: f32) {
        self.boost = boost;
    }

    fn max_score(&self) -> f32 {
        // Maximum possible TF component is k1 + 1.
        self.boost * self.idf * (self.k1 + 1.0)
    }

    fn name(&self) -> &'static str {
        "BM25"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::term::Term;

    #[test]
    fn test_bm25_scorer() {
        let scorer = BM25Scorer::new(10, 10.0, 1000, 1.0);

        let score1 = scorer.score(0, 1.0);
        let score2 = scorer.score(0, 2.0);
        assert!(score1 > 0.0);
        assert!(score2 > score1);
        assert!(scorer.max_score() >= score2);
        assert_eq!(scorer.name(), "BM25");
    }

    #[test]
    fn test_idf_never_negative() {
        // Term in every document.
        let scorer = BM25Scorer::new(5, 3.0, 5, 1.0);
        assert!(scorer.score(0, 1.0) > 0.0);
    }

    #[test]
    fn test_boost_scales_score() {
        let mut scorer = BM25Scorer::new(2, 4.0, 10, 1.0);
        let base = scorer.score(0, 1.0);
        scorer.set_boost(2.0);
        assert!((scorer.score(0, 1.0) - 2.0 * base).abs() < 1e-6);
    }

    #[test]
    fn test_for_terms_sums_idf() {
        let collection = CollectionStatistics {
            field: "body".to_string(),
            max_doc: 10,
            doc_count: 10,
            sum_total_term_freq: 40,
            sum_doc_freq: 20,
        };
        let stats = |text: &str, df| TermStatistics {
            term: Term::new("body", text),
            doc_freq: df,
            total_term_freq: df,
        };
        let single = BM25Scorer::for_terms(&[stats("a", 2)], &collection, 1.0);
        let pair = BM25Scorer::for_terms(&[stats("a", 2), stats("b", 2)], &collection, 1.0);
        assert!((pair.score(0, 1.0) - 2.0 * single.score(0, 1.0)).abs() < 1e-5);
    }

    #[test]
    fn test_explain_matches_score() {
        let scorer = BM25Scorer::new(3, 5.0, 20, 1.5);
        let explanation = scorer.explain(Explanation::matched(2.0, "termFreq=2"));
        assert!((explanation.value() - scorer.score(0, 2.0)).abs() < 1e-6);
        assert_eq!(explanation.details().len(), 3);
    }
}

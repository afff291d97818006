//! Boolean query implementation for combining multiple queries.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::index::reader::SegmentReader;
use crate::index::term::Term;
use crate::query::explanation::Explanation;
use crate::query::matcher::{
    ConjunctionMatcher, ConjunctionNotMatcher, DisjunctionMatcher, Matcher,
    RequiredOptionalMatcher,
};
use crate::query::node::Query;
use crate::query::searcher::IndexSearcher;
use crate::query::weight::{ScoreMode, Weight};

/// Occurrence requirements for boolean clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Occur {
    /// The clause must match (equivalent to AND).
    Must,
    /// The clause should match (equivalent to OR).
    Should,
    /// The clause must not match (equivalent to NOT).
    MustNot,
}

/// A clause in a boolean query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BooleanClause {
    /// The query for this clause.
    pub query: Arc<Query>,
    /// The occurrence requirement.
    pub occur: Occur,
}

impl BooleanClause {
    /// Create a new boolean clause.
    pub fn new(query: Arc<Query>, occur: Occur) -> Self {
        BooleanClause { query, occur }
    }

    /// Create a MUST clause.
    pub fn must(query: Arc<Query>) -> Self {
        BooleanClause::new(query, Occur::Must)
    }

    /// Create a SHOULD clause.
    pub fn should(query: Arc<Query>) -> Self {
        BooleanClause::new(query, Occur::Should)
    }

    /// Create a MUST_NOT clause.
    pub fn must_not(query: Arc<Query>) -> Self {
        BooleanClause::new(query, Occur::MustNot)
    }
}

/// A boolean query that combines multiple queries with boolean logic.
///
/// A query with only MUST_NOT clauses matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BooleanQuery {
    /// The clauses in this boolean query.
    clauses: Vec<BooleanClause>,
}

impl BooleanQuery {
    /// Create a new empty boolean query.
    pub fn new() -> Self {
        BooleanQuery {
            clauses: Vec::new(),
        }
    }

    /// Create a boolean query from clauses.
    pub fn from_clauses(clauses: Vec<BooleanClause>) -> Self {
        BooleanQuery { clauses }
    }

    /// Add a clause to this boolean query.
    pub fn add_clause(&mut self, clause: BooleanClause) {
        self.clauses.push(clause);
    }

    /// Add a MUST clause.
    pub fn add_must(&mut self, query: Arc<Query>) {
        self.add_clause(BooleanClause::must(query));
    }

    /// Add a SHOULD clause.
    pub fn add_should(&mut self, query: Arc<Query>) {
        self.add_clause(BooleanClause::should(query));
    }

    /// Add a MUST_NOT clause.
    pub fn add_must_not(&mut self, query: Arc<Query>) {
        self.add_clause(BooleanClause::must_not(query));
    }

    /// Get the clauses.
    pub fn clauses(&self) -> &[BooleanClause] {
        &self.clauses
    }

    /// Check if this query is empty.
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Get clauses by occurrence type.
    pub fn clauses_by_occur(&self, occur: Occur) -> Vec<&BooleanClause> {
        self.clauses.iter().filter(|c| c.occur == occur).collect()
    }
}

impl fmt::Display for BooleanQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            match clause.occur {
                Occur::Must => f.write_str("+")?,
                Occur::MustNot => f.write_str("-")?,
                Occur::Should => {}
            }
            match clause.query.as_ref() {
                Query::Boolean(_) => write!(f, "({})", clause.query)?,
                _ => write!(f, "{}", clause.query)?,
            }
        }
        Ok(())
    }
}

/// Weight of a [`BooleanQuery`].
#[derive(Debug)]
pub struct BooleanWeight {
    query: Arc<Query>,
    clauses: Vec<(Occur, Box<dyn Weight>)>,
    score_mode: ScoreMode,
}

impl BooleanWeight {
    /// Create weights for every clause. Prohibited clauses never need scores.
    pub fn new(
        searcher: &IndexSearcher,
        query: Arc<Query>,
        boolean: &BooleanQuery,
        score_mode: ScoreMode,
        boost: f32,
    ) -> Result<Self> {
        let clauses = boolean
            .clauses()
            .iter()
            .map(|clause| {
                let mode = match clause.occur {
                    Occur::MustNot => ScoreMode::CompleteNoScores,
                    _ => score_mode,
                };
                Ok((clause.occur, searcher.create_weight(&clause.query, mode, boost)?))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(BooleanWeight {
            query,
            clauses,
            score_mode,
        })
    }
}

fn combine_optional(mut matchers: Vec<Box<dyn Matcher>>) -> Box<dyn Matcher> {
    if matchers.len() == 1 {
        matchers.remove(0)
    } else {
        Box::new(DisjunctionMatcher::new(matchers))
    }
}

impl Weight for BooleanWeight {
    fn query(&self) -> &Arc<Query> {
        &self.query
    }

    fn matcher(&self, segment: &dyn SegmentReader) -> Result<Option<Box<dyn Matcher>>> {
        let mut required = Vec::new();
        let mut optional = Vec::new();
        let mut prohibited = Vec::new();

        for (occur, weight) in &self.clauses {
            let matcher = weight.matcher(segment)?;
            match (occur, matcher) {
                // A required clause with nothing to match empties the whole query.
                (Occur::Must, None) => return Ok(None),
                (Occur::Must, Some(m)) => required.push(m),
                (Occur::Should, Some(m)) => optional.push(m),
                (Occur::MustNot, Some(m)) => prohibited.push(m),
                (_, None) => {}
            }
        }

        let positive: Box<dyn Matcher> = if !required.is_empty() {
            let required: Box<dyn Matcher> = if required.len() == 1 {
                required.remove(0)
            } else {
                Box::new(ConjunctionMatcher::new(required)?)
            };
            if optional.is_empty() || !self.score_mode.needs_scores() {
                required
            } else {
                Box::new(RequiredOptionalMatcher::new(required, combine_optional(optional))?)
            }
        } else if !optional.is_empty() {
            combine_optional(optional)
        } else {
            return Ok(None);
        };

        if prohibited.is_empty() {
            Ok(Some(positive))
        } else {
            Ok(Some(Box::new(ConjunctionNotMatcher::new(positive, prohibited)?)))
        }
    }

    fn explain(&self, segment: &dyn SegmentReader, doc: u64) -> Result<Explanation> {
        let mut details = Vec::new();
        let mut sum = 0.0;
        let mut required_seen = false;

        for (occur, weight) in &self.clauses {
            let explanation = weight.explain(segment, doc)?;
            match occur {
                Occur::Must => {
                    required_seen = true;
                    if !explanation.is_match() {
                        return Ok(Explanation::no_match(format!(
                            "no match on required clause ({})",
                            weight.query()
                        ))
                        .with_detail(explanation));
                    }
                    sum += explanation.value();
                    details.push(explanation);
                }
                Occur::Should => {
                    if explanation.is_match() {
                        sum += explanation.value();
                        details.push(explanation);
                    }
                }
                Occur::MustNot => {
                    if explanation.is_match() {
                        return Ok(Explanation::no_match(format!(
                            "match on prohibited clause ({})",
                            weight.query()
                        ))
                        .with_detail(explanation));
                    }
                }
            }
        }

        if !required_seen && details.is_empty() {
            return Ok(Explanation::no_match("no matching clause"));
        }
        Ok(Explanation::matched(sum, "sum of:").with_details(details))
    }

    fn is_cacheable(&self, segment: &dyn SegmentReader) -> bool {
        self.clauses.iter().all(|(_, w)| w.is_cacheable(segment))
    }

    fn extract_terms(&self, terms: &mut BTreeSet<Term>) {
        for (occur, weight) in &self.clauses {
            if *occur != Occur::MustNot {
                weight.extract_terms(terms);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::memory::MemoryIndexBuilder;
    use crate::index::reader::IndexOptions;

    fn searcher() -> IndexSearcher {
        let mut builder = MemoryIndexBuilder::new().field("body", IndexOptions::Freqs);
        builder.add_text("body", "apple banana").unwrap();
        builder.add_text("body", "apple cherry").unwrap();
        builder.add_text("body", "banana cherry").unwrap();
        builder.add_text("body", "apple banana cherry").unwrap();
        IndexSearcher::new(builder.build())
    }

    fn hits(searcher: &IndexSearcher, query: &Arc<Query>) -> Vec<u64> {
        let mut docs: Vec<u64> = searcher
            .search(query, 10)
            .unwrap()
            .hits
            .iter()
            .map(|h| h.doc_id)
            .collect();
        docs.sort();
        docs
    }

    #[test]
    fn test_must_clauses() {
        let searcher = searcher();
        let query = Query::boolean(vec![
            BooleanClause::must(Query::term("body", "apple")),
            BooleanClause::must(Query::term("body", "banana")),
        ]);
        assert_eq!(hits(&searcher, &query), vec![0, 3]);
    }

    #[test]
    fn test_should_clauses() {
        let searcher = searcher();
        let query = Query::boolean(vec![
            BooleanClause::should(Query::term("body", "cherry")),
            BooleanClause::should(Query::term("body", "missing")),
        ]);
        assert_eq!(hits(&searcher, &query), vec![1, 2, 3]);
    }

    #[test]
    fn test_must_not_clauses() {
        let searcher = searcher();
        let query = Query::boolean(vec![
            BooleanClause::must(Query::term("body", "apple")),
            BooleanClause::must_not(Query::term("body", "cherry")),
        ]);
        assert_eq!(hits(&searcher, &query), vec![0]);

        let pure_negative = Query::boolean(vec![BooleanClause::must_not(Query::term(
            "body", "cherry",
        ))]);
        assert!(hits(&searcher, &pure_negative).is_empty());
    }

    #[test]
    fn test_optional_clauses_raise_score() {
        let searcher = searcher();
        let query = Query::boolean(vec![
            BooleanClause::must(Query::term("body", "apple")),
            BooleanClause::should(Query::term("body", "cherry")),
        ]);
        let top = searcher.search(&query, 10).unwrap();
        assert_eq!(top.total_hits, 3);
        let best = &top.hits[0];
        assert!(best.doc_id == 1 || best.doc_id == 3);
    }

    #[test]
    fn test_missing_required_term() {
        let searcher = searcher();
        let query = Query::boolean(vec![
            BooleanClause::must(Query::term("body", "apple")),
            BooleanClause::must(Query::term("body", "missing")),
        ]);
        assert!(hits(&searcher, &query).is_empty());
    }

    #[test]
    fn test_explain() {
        let searcher = searcher();
        let query = Query::boolean(vec![
            BooleanClause::must(Query::term("body", "apple")),
            BooleanClause::must_not(Query::term("body", "cherry")),
        ]);
        let explanation = searcher.explain(&query, 0).unwrap();
        assert!(explanation.is_match());
        assert_eq!(explanation.description(), "sum of:");

        let explanation = searcher.explain(&query, 1).unwrap();
        assert!(!explanation.is_match());
        assert_eq!(
            explanation.description(),
            "match on prohibited clause (body:cherry)"
        );
    }

    #[test]
    fn test_display_nests_booleans() {
        let inner = Query::boolean(vec![
            BooleanClause::should(Query::term("body", "a")),
            BooleanClause::should(Query::term("body", "b")),
        ]);
        let outer = Query::boolean(vec![
            BooleanClause::must(inner),
            BooleanClause::must_not(Query::term("body", "c")),
        ]);
        assert_eq!(outer.to_string(), "+(body:a body:b) -body:c");
    }
}

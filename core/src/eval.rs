use crate::index::{DocumentStore, InvertedIndex};
use crate::query::Query;
use crate::tokenizer::Analyzer;
use crate::DocId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

/// How a query term is turned into index terms before lookup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TermResolution {
    /// Same pipeline as documents. No surviving token matches nothing; several surviving
    /// tokens match documents containing all of them.
    #[default]
    Normalized,
    /// Lowercase, trim and stem the term text as a single token.
    StemOnly,
}

impl FromStr for TermResolution {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "normalized" => Ok(TermResolution::Normalized),
            "stem-only" | "stem_only" => Ok(TermResolution::StemOnly),
            other => Err(format!("unknown term resolution `{other}` (expected normalized or stem-only)")),
        }
    }
}

/// Set algebra over a built index. Holds shared references only.
pub struct Evaluator<'a> {
    index: &'a InvertedIndex,
    store: &'a DocumentStore,
    analyzer: &'a Analyzer,
    resolution: TermResolution,
}

impl<'a> Evaluator<'a> {
    pub fn new(index: &'a InvertedIndex, store: &'a DocumentStore, analyzer: &'a Analyzer, resolution: TermResolution) -> Self {
        Self { index, store, analyzer, resolution }
    }

    pub fn evaluate(&self, query: &Query) -> BTreeSet<DocId> {
        match query {
            Query::Term(term) => self.lookup(term),
            Query::And(items) => {
                let mut iter = items.iter();
                let Some(first) = iter.next() else { return BTreeSet::new() };
                let mut acc = self.evaluate(first);
                for item in iter {
                    if acc.is_empty() {
                        break;
                    }
                    let next = self.evaluate(item);
                    acc = acc.intersection(&next).copied().collect();
                }
                acc
            }
            Query::Or(items) => {
                let mut acc = BTreeSet::new();
                for item in items {
                    acc.extend(self.evaluate(item));
                }
                acc
            }
            Query::Not(inner) => {
                let excluded = self.evaluate(inner);
                self.store.all().difference(&excluded).copied().collect()
            }
            Query::AndNot(positive, negative) => {
                let positive = self.evaluate(positive);
                if positive.is_empty() {
                    return positive;
                }
                let negative = self.evaluate(negative);
                positive.difference(&negative).copied().collect()
            }
        }
    }

    /// Postings for one query term. Unknown terms give an empty set.
    pub fn lookup(&self, term: &str) -> BTreeSet<DocId> {
        match self.resolution {
            TermResolution::StemOnly => self.postings(&self.analyzer.stem_only(term)),
            TermResolution::Normalized => {
                let terms = self.analyzer.normalize_term(term);
                let mut iter = terms.iter();
                let Some(first) = iter.next() else { return BTreeSet::new() };
                let mut acc = self.postings(first);
                for t in iter {
                    if acc.is_empty() {
                        break;
                    }
                    acc = acc.intersection(&self.postings(t)).copied().collect();
                }
                acc
            }
        }
    }

    fn postings(&self, term: &str) -> BTreeSet<DocId> { self.index.postings(term).cloned().unwrap_or_default() }
}

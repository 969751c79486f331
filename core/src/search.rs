use crate::error::MalformedQuery;
use crate::eval::{Evaluator, TermResolution};
use crate::format::format_results;
use crate::index::{BuildStats, DocumentStore, IndexBuilder, InvertedIndex};
use crate::query::{parse, Grammar};
use crate::source::DocumentSource;
use crate::tokenizer::Analyzer;
use crate::DocId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Demonstration queries run by the batch interface.
pub const EXAMPLE_QUERIES: &[&str] = &[
    "dog AND cat",
    "dog OR cat",
    "dog AND NOT cat",
    "(bm25 OR tf-idf) AND retrieval",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOptions {
    pub grammar: Grammar,
    pub terms: TermResolution,
}

impl QueryOptions {
    /// Substring dispatch with stem-only term lookup; parentheses stay literal.
    pub fn reference() -> Self { Self { grammar: Grammar::Reference, terms: TermResolution::StemOnly } }

    /// Nested grammar with full-pipeline term lookup.
    pub fn extended() -> Self { Self { grammar: Grammar::Extended, terms: TermResolution::Normalized } }
}

/// Ordered, truncated result ids plus the number of distinct matching ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hits {
    pub total: usize,
    pub results: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchResult {
    pub query: String,
    pub results: Vec<String>,
}

/// Read-only query surface over one built index. Share it behind an `Arc`; rebuilding
/// means constructing a new `Searcher` and swapping the reference.
#[derive(Debug)]
pub struct Searcher {
    index: InvertedIndex,
    store: DocumentStore,
    analyzer: Analyzer,
    options: QueryOptions,
}

impl Searcher {
    pub fn new(index: InvertedIndex, store: DocumentStore, analyzer: Analyzer, options: QueryOptions) -> Self {
        Self { index, store, analyzer, options }
    }

    pub fn from_source<S: DocumentSource + ?Sized>(source: &S, analyzer: Analyzer, options: QueryOptions) -> Self {
        let (index, store) = IndexBuilder::new(&analyzer).build_parallel(source);
        Self::new(index, store, analyzer, options)
    }

    pub fn options(&self) -> QueryOptions { self.options }
    pub fn index(&self) -> &InvertedIndex { &self.index }
    pub fn store(&self) -> &DocumentStore { &self.store }
    pub fn analyzer(&self) -> &Analyzer { &self.analyzer }
    pub fn stats(&self) -> BuildStats { BuildStats::collect(&self.index, &self.store) }

    pub fn document(&self, doc_id: &str) -> Option<&str> {
        self.store.lookup(doc_id).and_then(|doc| self.store.contents(doc))
    }

    /// Unordered matching set for a query.
    pub fn matches(&self, query: &str, options: QueryOptions) -> Result<BTreeSet<DocId>, MalformedQuery> {
        let parsed = parse(query, options.grammar)?;
        tracing::debug!(query, parsed = %parsed, "evaluating");
        Ok(Evaluator::new(&self.index, &self.store, &self.analyzer, options.terms).evaluate(&parsed))
    }

    pub fn hits(&self, query: &str, max_results: usize, options: QueryOptions) -> Result<Hits, MalformedQuery> {
        let matched = self.matches(query, options)?;
        let mut results = self.format(&matched, usize::MAX);
        let total = results.len();
        results.truncate(max_results);
        Ok(Hits { total, results })
    }

    pub fn try_search(&self, query: &str, max_results: usize, options: QueryOptions) -> Result<Vec<String>, MalformedQuery> {
        self.hits(query, max_results, options).map(|hits| hits.results)
    }

    /// Malformed queries return no matches.
    pub fn search_with(&self, query: &str, max_results: usize, options: QueryOptions) -> Vec<String> {
        self.try_search(query, max_results, options).unwrap_or_else(|e| {
            tracing::debug!(query, error = %e, "malformed query");
            Vec::new()
        })
    }

    pub fn search(&self, query: &str, max_results: usize) -> Vec<String> {
        self.search_with(query, max_results, self.options)
    }

    pub fn format(&self, matched: &BTreeSet<DocId>, max_results: usize) -> Vec<String> {
        format_results(matched.iter().filter_map(|&doc| self.store.external_id(doc)), max_results)
    }

    pub fn run_batch(&self, queries: &[&str], max_results: usize) -> Vec<BatchResult> {
        queries
            .iter()
            .map(|q| {
                let results = self.search(q, max_results);
                tracing::info!(query = q, matches = results.len(), "batch query");
                BatchResult { query: q.to_string(), results }
            })
            .collect()
    }
}

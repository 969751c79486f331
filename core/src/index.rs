use crate::source::{DocumentSource, FetchedDocument};
use crate::tokenizer::Analyzer;
use crate::DocId;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Term -> set of documents containing it at least once.
#[derive(Debug, Default, Clone)]
pub struct InvertedIndex {
    postings: HashMap<String, BTreeSet<DocId>>,
}

impl InvertedIndex {
    pub fn postings(&self, term: &str) -> Option<&BTreeSet<DocId>> { self.postings.get(term) }
    pub fn contains_term(&self, term: &str) -> bool { self.postings.contains_key(term) }
    pub fn term_count(&self) -> usize { self.postings.len() }
    pub fn terms(&self) -> impl Iterator<Item = &str> { self.postings.keys().map(String::as_str) }

    fn insert(&mut self, term: String, doc: DocId) {
        self.postings.entry(term).or_default().insert(doc);
    }
}

/// Slot-per-document store. Slots are assigned in corpus order and never change.
#[derive(Debug, Default, Clone)]
pub struct DocumentStore {
    ids: Vec<String>,
    contents: Vec<String>,
    by_external: HashMap<String, DocId>,
}

impl DocumentStore {
    pub fn len(&self) -> usize { self.ids.len() }
    pub fn is_empty(&self) -> bool { self.ids.is_empty() }
    pub fn external_id(&self, doc: DocId) -> Option<&str> { self.ids.get(doc as usize).map(String::as_str) }
    pub fn contents(&self, doc: DocId) -> Option<&str> { self.contents.get(doc as usize).map(String::as_str) }
    pub fn lookup(&self, external_id: &str) -> Option<DocId> { self.by_external.get(external_id).copied() }

    /// Every slot, in order. The universe for complement.
    pub fn all(&self) -> BTreeSet<DocId> { (0..self.ids.len()).filter_map(|i| DocId::try_from(i).ok()).collect() }

    /// Appends a document. `None` when the id is already taken or no slot number is left.
    fn push(&mut self, external_id: String, contents: String) -> Option<DocId> {
        if let Some(&owner) = self.by_external.get(&external_id) {
            tracing::warn!(doc_id = %external_id, slot = owner, "duplicate document id; skipping later occurrence");
            return None;
        }
        let Some(doc) = next_slot(self.ids.len()) else {
            tracing::error!(doc_id = %external_id, "document store full; skipping document");
            return None;
        };
        self.by_external.insert(external_id.clone(), doc);
        self.ids.push(external_id);
        self.contents.push(contents);
        Some(doc)
    }
}

fn next_slot(len: usize) -> Option<DocId> { DocId::try_from(len).ok() }

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BuildStats {
    pub documents: usize,
    pub terms: usize,
    pub empty_documents: usize,
}

impl BuildStats {
    pub fn collect(index: &InvertedIndex, store: &DocumentStore) -> Self {
        Self {
            documents: store.len(),
            terms: index.term_count(),
            empty_documents: store.contents.iter().filter(|c| c.is_empty()).count(),
        }
    }
}

enum Outcome {
    Skipped,
    Indexed { id: String, contents: String, terms: HashSet<String> },
}

/// One-shot builder: consumes a document source, returns an immutable index and store.
pub struct IndexBuilder<'a> {
    analyzer: &'a Analyzer,
}

impl<'a> IndexBuilder<'a> {
    pub fn new(analyzer: &'a Analyzer) -> Self { Self { analyzer } }

    pub fn build<S: DocumentSource + ?Sized>(&self, source: &S) -> (InvertedIndex, DocumentStore) {
        let outcomes = (0..source.document_count()).map(|i| self.process(source, i));
        Self::assemble(outcomes)
    }

    /// Same result as [`IndexBuilder::build`]; documents are analyzed on the rayon pool
    /// and merged in corpus order.
    pub fn build_parallel<S: DocumentSource + ?Sized>(&self, source: &S) -> (InvertedIndex, DocumentStore) {
        let outcomes: Vec<Outcome> = (0..source.document_count())
            .into_par_iter()
            .map(|i| self.process(source, i))
            .collect();
        Self::assemble(outcomes.into_iter())
    }

    fn process<S: DocumentSource + ?Sized>(&self, source: &S, internal_id: usize) -> Outcome {
        let id = match source.resolve_external_id(internal_id) {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(internal_id, error = %e, "skipping unresolvable document");
                return Outcome::Skipped;
            }
        };
        match source.fetch_document(&id) {
            Ok(Some(FetchedDocument { contents, term_vector, preprocessed })) => {
                let contents = contents.unwrap_or_default();
                let terms = match term_vector {
                    Some(tv) => tv.into_iter().filter(|(_, tf)| *tf > 0).map(|(t, _)| t).collect(),
                    // already normalized text; running the stemmer again would change terms
                    None if preprocessed => contents.split_whitespace().map(str::to_string).collect(),
                    None => self.analyzer.normalize(&contents).into_iter().collect(),
                };
                Outcome::Indexed { id, contents, terms }
            }
            Ok(None) => {
                tracing::warn!(doc_id = %id, "document returned nothing; recording empty content");
                Outcome::Indexed { id, contents: String::new(), terms: HashSet::new() }
            }
            Err(e) => {
                tracing::warn!(doc_id = %id, error = %e, "error processing document; recording empty content");
                Outcome::Indexed { id, contents: String::new(), terms: HashSet::new() }
            }
        }
    }

    fn assemble(outcomes: impl Iterator<Item = Outcome>) -> (InvertedIndex, DocumentStore) {
        let mut index = InvertedIndex::default();
        let mut store = DocumentStore::default();
        for outcome in outcomes {
            if let Outcome::Indexed { id, contents, terms } = outcome {
                if let Some(doc) = store.push(id, contents) {
                    for term in terms {
                        index.insert(term, doc);
                    }
                }
            }
        }
        let stats = BuildStats::collect(&index, &store);
        tracing::info!(documents = stats.documents, terms = stats.terms, empty = stats.empty_documents, "inverted index built");
        (index, store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DocumentError;
    use crate::source::Corpus;

    struct Flaky;

    impl DocumentSource for Flaky {
        fn document_count(&self) -> usize { 4 }

        fn resolve_external_id(&self, internal_id: usize) -> Result<String, DocumentError> {
            match internal_id {
                3 => Err(DocumentError::UnknownInternalId(3)),
                i => Ok(format!("d{}", i + 1)),
            }
        }

        fn fetch_document(&self, doc_id: &str) -> Result<Option<FetchedDocument>, DocumentError> {
            match doc_id {
                "d1" => Ok(Some(FetchedDocument { contents: Some("cats and dogs".into()), ..Default::default() })),
                "d2" => Err(DocumentError::Unreadable(doc_id.into(), "bad bytes".into())),
                _ => Ok(None),
            }
        }
    }

    #[test]
    fn failed_documents_keep_an_empty_slot() {
        let analyzer = Analyzer::default();
        let (index, store) = IndexBuilder::new(&analyzer).build(&Flaky);
        assert_eq!(store.len(), 3);
        assert_eq!(store.lookup("d2"), Some(1));
        assert_eq!(store.contents(1), Some(""));
        assert_eq!(store.contents(2), Some(""));
        assert_eq!(index.postings("cat").map(|p| p.len()), Some(1));
        assert!(index.terms().all(|t| !index.postings(t).unwrap().contains(&1)));
        let stats = BuildStats::collect(&index, &store);
        assert_eq!(stats.empty_documents, 2);
    }

    #[test]
    fn prefers_stored_term_vector() {
        struct Vectored;
        impl DocumentSource for Vectored {
            fn document_count(&self) -> usize { 1 }
            fn resolve_external_id(&self, _: usize) -> Result<String, DocumentError> { Ok("x1".into()) }
            fn fetch_document(&self, _: &str) -> Result<Option<FetchedDocument>, DocumentError> {
                let tv = HashMap::from([("zebra".to_string(), 2), ("ghost".to_string(), 0)]);
                Ok(Some(FetchedDocument { contents: Some("unrelated words".into()), term_vector: Some(tv), preprocessed: false }))
            }
        }
        let analyzer = Analyzer::default();
        let (index, _) = IndexBuilder::new(&analyzer).build(&Vectored);
        assert!(index.contains_term("zebra"));
        assert!(!index.contains_term("ghost"));
        assert!(!index.contains_term("unrel"));
    }

    #[test]
    fn postings_are_deduplicated_per_document() {
        let corpus: Corpus = [("d1", "dog dog dogs"), ("d2", "dog")].into_iter().collect();
        let analyzer = Analyzer::default();
        let (index, _) = IndexBuilder::new(&analyzer).build(&corpus);
        assert_eq!(index.postings("dog"), Some(&BTreeSet::from([0, 1])));
    }

    #[test]
    fn parallel_build_matches_sequential() {
        let corpus: Corpus = (1..=200)
            .map(|i| (format!("d{i}"), format!("word{} shared common{}", i % 7, i % 3)))
            .collect();
        let analyzer = Analyzer::default();
        let builder = IndexBuilder::new(&analyzer);
        let (seq, seq_store) = builder.build(&corpus);
        let (par, par_store) = builder.build_parallel(&corpus);
        assert_eq!(seq.postings, par.postings);
        assert_eq!(seq_store.ids, par_store.ids);
    }

    #[test]
    fn duplicate_ids_keep_first_document_only() {
        let corpus: Corpus = [("d1", "alpha"), ("d2", "gamma"), ("d1", "beta")].into_iter().collect();
        let analyzer = Analyzer::default();
        let (index, store) = IndexBuilder::new(&analyzer).build(&corpus);
        assert_eq!(store.len(), 2);
        assert_eq!(store.lookup("d1"), Some(0));
        assert_eq!(store.contents(0), Some("alpha"));
        assert_eq!(store.external_id(1), Some("d2"));
        assert!(index.contains_term("alpha"));
        assert!(!index.contains_term("beta"));
    }

    #[test]
    fn preprocessed_contents_are_not_stemmed_twice() {
        struct Preprocessed;
        impl DocumentSource for Preprocessed {
            fn document_count(&self) -> usize { 1 }
            fn resolve_external_id(&self, _: usize) -> Result<String, DocumentError> { Ok("d1".into()) }
            fn fetch_document(&self, _: &str) -> Result<Option<FetchedDocument>, DocumentError> {
                Ok(Some(FetchedDocument { contents: Some("agre  generous offer".into()), term_vector: None, preprocessed: true }))
            }
        }
        let analyzer = Analyzer::default();
        let (index, _) = IndexBuilder::new(&analyzer).build(&Preprocessed);
        assert_eq!(analyzer.normalize("agreed"), vec!["agre"]);
        assert!(index.contains_term("agre"));
        assert!(index.contains_term("generous"));
        assert_eq!(index.term_count(), 3);
    }

    #[test]
    fn slot_numbers_never_truncate() {
        assert_eq!(next_slot(7), Some(7));
        assert_eq!(next_slot(DocId::MAX as usize), Some(DocId::MAX));
        if usize::BITS > DocId::BITS {
            assert_eq!(next_slot(DocId::MAX as usize + 1), None);
        }
    }
}

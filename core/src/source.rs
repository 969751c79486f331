use crate::error::DocumentError;
use std::collections::HashMap;

/// What the store hands back for one document. Either part may be missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchedDocument {
    pub contents: Option<String>,
    /// Pre-analyzed term frequencies; preferred over re-normalizing `contents`.
    pub term_vector: Option<HashMap<String, u32>>,
    /// `contents` is already normalized text: whitespace-separated terms.
    pub preprocessed: bool,
}

/// Read access to an already-ingested document collection, addressed by internal
/// sequence number `0..document_count()`.
pub trait DocumentSource: Sync {
    fn document_count(&self) -> usize;
    fn resolve_external_id(&self, internal_id: usize) -> Result<String, DocumentError>;
    fn fetch_document(&self, doc_id: &str) -> Result<Option<FetchedDocument>, DocumentError>;
}

/// An ordered in-memory corpus of `(doc_id, raw_text)` pairs.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    docs: Vec<(String, String)>,
    positions: HashMap<String, usize>,
}

impl Corpus {
    pub fn new() -> Self { Self::default() }

    pub fn push(&mut self, id: impl Into<String>, text: impl Into<String>) {
        let id = id.into();
        self.positions.entry(id.clone()).or_insert(self.docs.len());
        self.docs.push((id, text.into()));
    }

    pub fn len(&self) -> usize { self.docs.len() }
    pub fn is_empty(&self) -> bool { self.docs.is_empty() }
}

impl<S, T> FromIterator<(S, T)> for Corpus
where
    S: Into<String>,
    T: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (S, T)>>(items: I) -> Self {
        let mut corpus = Corpus::new();
        for (id, text) in items {
            corpus.push(id, text);
        }
        corpus
    }
}

impl DocumentSource for Corpus {
    fn document_count(&self) -> usize { self.docs.len() }

    fn resolve_external_id(&self, internal_id: usize) -> Result<String, DocumentError> {
        self.docs
            .get(internal_id)
            .map(|(id, _)| id.clone())
            .ok_or(DocumentError::UnknownInternalId(internal_id))
    }

    fn fetch_document(&self, doc_id: &str) -> Result<Option<FetchedDocument>, DocumentError> {
        Ok(self.positions.get(doc_id).map(|&pos| FetchedDocument {
            contents: Some(self.docs[pos].1.clone()),
            term_vector: None,
            preprocessed: false,
        }))
    }
}

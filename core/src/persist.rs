//! On-disk document store written by the indexer and read back at startup.
//!
//! Layout under the store root:
//! - `documents.bin`: bincode `Vec<StoredDocument>` in ingestion order
//! - `meta.json`: [`MetaFile`]

use crate::error::{DocumentError, SetupError};
use crate::source::{DocumentSource, FetchedDocument};
use crate::tokenizer::Analyzer;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{create_dir_all, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

pub const STORE_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: String,
    pub contents: Option<String>,
    pub term_vector: Option<HashMap<String, u32>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub created_at: String,
    pub version: u32,
    /// Whether `contents` holds already-normalized text. The builder then splits contents
    /// on whitespace instead of normalizing them again.
    #[serde(default)]
    pub preprocessed: bool,
    /// Whether term vectors were produced with NFKC normalization enabled.
    #[serde(default)]
    pub nfkc: bool,
}

pub struct StorePaths {
    pub root: PathBuf,
}

impl StorePaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn documents(&self) -> PathBuf { self.root.join("documents.bin") }
    pub fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

fn io_error(path: PathBuf) -> impl FnOnce(std::io::Error) -> SetupError {
    move |source| SetupError::Io { path, source }
}

pub fn save_documents(paths: &StorePaths, docs: &[StoredDocument]) -> Result<(), SetupError> {
    create_dir_all(&paths.root).map_err(io_error(paths.root.clone()))?;
    let path = paths.documents();
    let bytes = bincode::serialize(docs).map_err(|e| SetupError::Corrupt { path: path.clone(), reason: e.to_string() })?;
    let mut f = File::create(&path).map_err(io_error(path.clone()))?;
    f.write_all(&bytes).map_err(io_error(path))?;
    Ok(())
}

pub fn load_documents(paths: &StorePaths) -> Result<Vec<StoredDocument>, SetupError> {
    let path = paths.documents();
    let mut f = File::open(&path).map_err(io_error(path.clone()))?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf).map_err(io_error(path.clone()))?;
    bincode::deserialize(&buf).map_err(|e| SetupError::Corrupt { path, reason: e.to_string() })
}

pub fn save_meta(paths: &StorePaths, meta: &MetaFile) -> Result<(), SetupError> {
    create_dir_all(&paths.root).map_err(io_error(paths.root.clone()))?;
    let path = paths.meta();
    let json = serde_json::to_string_pretty(meta).map_err(|e| SetupError::Corrupt { path: path.clone(), reason: e.to_string() })?;
    let mut f = File::create(&path).map_err(io_error(path.clone()))?;
    f.write_all(json.as_bytes()).map_err(io_error(path))?;
    Ok(())
}

pub fn load_meta(paths: &StorePaths) -> Result<MetaFile, SetupError> {
    let path = paths.meta();
    let mut f = File::open(&path).map_err(io_error(path.clone()))?;
    let mut buf = String::new();
    f.read_to_string(&mut buf).map_err(io_error(path.clone()))?;
    serde_json::from_str(&buf).map_err(|e| SetupError::Corrupt { path, reason: e.to_string() })
}

/// A document store opened from disk.
#[derive(Debug)]
pub struct DocStore {
    meta: MetaFile,
    docs: Vec<StoredDocument>,
    positions: HashMap<String, usize>,
}

impl DocStore {
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self, SetupError> {
        let paths = StorePaths::new(root);
        if !paths.root.is_dir() {
            return Err(SetupError::NotFound(paths.root));
        }
        let meta = load_meta(&paths)?;
        let docs = load_documents(&paths)?;
        if meta.num_docs as usize != docs.len() {
            tracing::warn!(meta = meta.num_docs, actual = docs.len(), "meta document count disagrees with store");
        }
        let mut positions = HashMap::with_capacity(docs.len());
        for (pos, doc) in docs.iter().enumerate() {
            positions.entry(doc.id.clone()).or_insert(pos);
        }
        tracing::info!(root = %paths.root.display(), documents = docs.len(), "document store opened");
        Ok(Self { meta, docs, positions })
    }

    pub fn meta(&self) -> &MetaFile { &self.meta }

    /// Analyzer configured the way this store was ingested.
    pub fn analyzer(&self) -> Analyzer { Analyzer::default().with_nfkc(self.meta.nfkc) }
}

impl DocumentSource for DocStore {
    fn document_count(&self) -> usize { self.docs.len() }

    fn resolve_external_id(&self, internal_id: usize) -> Result<String, DocumentError> {
        self.docs
            .get(internal_id)
            .map(|d| d.id.clone())
            .ok_or(DocumentError::UnknownInternalId(internal_id))
    }

    fn fetch_document(&self, doc_id: &str) -> Result<Option<FetchedDocument>, DocumentError> {
        Ok(self.positions.get(doc_id).map(|&pos| {
            let doc = &self.docs[pos];
            FetchedDocument {
                contents: doc.contents.clone(),
                term_vector: doc.term_vector.clone(),
                preprocessed: self.meta.preprocessed,
            }
        }))
    }
}

use anyhow::{bail, Result};
use boolret_core::persist::StoredDocument;
use boolret_core::Analyzer;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One corpus record, e.g. `{"id": "d1", "contents": "..."}`.
#[derive(Debug, Deserialize)]
pub struct InputDoc {
    pub id: String,
    #[serde(default, alias = "body")]
    pub contents: Option<String>,
}

impl InputDoc {
    /// Term vectors always come from the raw text, so a preprocessed store indexes the
    /// same terms as a raw one.
    pub fn into_stored(self, analyzer: &Analyzer, preprocess: bool, vectors: bool) -> StoredDocument {
        let term_vector = vectors.then(|| self.contents.as_deref().map(|text| analyzer.term_frequencies(text)).unwrap_or_default());
        let contents = self.contents.map(|text| if preprocess { analyzer.preprocess(&text) } else { text });
        StoredDocument { id: self.id, contents, term_vector }
    }
}

/// `.json` / `.jsonl` files under `input` (or `input` itself), in file-name order.
pub fn collect_files(input: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() {
                if let Some(ext) = p.extension().and_then(|s| s.to_str()) {
                    if matches!(ext, "json" | "jsonl") {
                        files.push(p.to_path_buf());
                    }
                }
            }
        }
    } else if input.is_file() {
        files.push(input.to_path_buf());
    } else {
        bail!("corpus not found: {}", input.display());
    }
    Ok(files)
}

/// Read every record. Unreadable files and malformed records are logged and skipped.
pub fn read_corpus(input: &Path) -> Result<Vec<InputDoc>> {
    let mut docs = Vec::new();
    for file in collect_files(input)? {
        let res = if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
            read_jsonl(&file, &mut docs)
        } else {
            read_json(&file, &mut docs)
        };
        if let Err(e) = res {
            tracing::warn!(file = %file.display(), error = %e, "skipping corpus file");
        }
    }
    tracing::info!(documents = docs.len(), "corpus read");
    Ok(docs)
}

fn read_jsonl(file: &Path, docs: &mut Vec<InputDoc>) -> Result<()> {
    let reader = BufReader::new(File::open(file)?);
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        match serde_json::from_str::<InputDoc>(&line) {
            Ok(doc) => docs.push(doc),
            Err(e) => tracing::warn!(file = %file.display(), line = lineno + 1, error = %e, "skipping malformed record"),
        }
    }
    Ok(())
}

fn read_json(file: &Path, docs: &mut Vec<InputDoc>) -> Result<()> {
    let reader = BufReader::new(File::open(file)?);
    let json: serde_json::Value = serde_json::from_reader(reader)?;
    let values = match json {
        serde_json::Value::Array(arr) => arr,
        obj @ serde_json::Value::Object(_) => vec![obj],
        _ => Vec::new(),
    };
    for v in values {
        match serde_json::from_value::<InputDoc>(v) {
            Ok(doc) => docs.push(doc),
            Err(e) => tracing::warn!(file = %file.display(), error = %e, "skipping malformed record"),
        }
    }
    Ok(())
}

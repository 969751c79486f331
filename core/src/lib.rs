pub mod error;
pub mod eval;
pub mod format;
pub mod index;
pub mod persist;
pub mod query;
pub mod search;
pub mod source;
pub mod tokenizer;

pub use error::{DocumentError, MalformedQuery, SetupError};
pub use eval::{Evaluator, TermResolution};
pub use format::{format_results, DEFAULT_MAX_RESULTS};
pub use index::{BuildStats, DocumentStore, IndexBuilder, InvertedIndex};
pub use query::{parse, Grammar, Query, MAX_DEPTH};
pub use search::{Hits, QueryOptions, Searcher, EXAMPLE_QUERIES};
pub use source::{Corpus, DocumentSource, FetchedDocument};
pub use tokenizer::{Analyzer, Stem};

/// Internal sequence number of a document: its slot in the document store.
pub type DocId = u32;

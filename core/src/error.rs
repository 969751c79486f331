use std::path::PathBuf;
use thiserror::Error;

/// The document store could not be opened. Nothing can be served without it.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("document store not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed to read {}: {source}", .path.display())]
    Io { path: PathBuf, #[source] source: std::io::Error },
    #[error("corrupt store file {}: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: String },
}

/// A single document could not be resolved or read during a build.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("no document at internal id {0}")]
    UnknownInternalId(usize),
    #[error("document {0} could not be read: {1}")]
    Unreadable(String, String),
}

/// A query string that has no Boolean interpretation. Evaluates to no matches.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedQuery {
    #[error("empty query")]
    Empty,
    #[error("NOT expects exactly two operands, got {0}")]
    NotArity(usize),
    #[error("unexpected end of query")]
    UnexpectedEnd,
    #[error("unexpected token `{0}`")]
    UnexpectedToken(String),
    #[error("missing closing parenthesis")]
    UnclosedParen,
    #[error("query nested deeper than {0} levels")]
    TooDeep(usize),
}

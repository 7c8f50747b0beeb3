//! Error types for the manual scanner.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("rewind only supported for the last read line ({0})")]
    Rewind(String),

    #[error("no headline for category {category} ({location})")]
    CategoryWithoutHeadline { category: String, location: String },

    #[error("invalid pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid manual version: {0:?}")]
    Version(String),

    #[error("unknown item kind: {0}")]
    UnknownKind(String),

    #[error("table {file}: {message}")]
    Table { file: String, message: String },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ScanError>;

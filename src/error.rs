use std::path::PathBuf;

use thiserror::Error;

/// Everything that can stop a book (or a whole run) from being measured.
#[derive(Debug, Error)]
pub enum ErrorRateError {
    /// The book contains no token matching the token pattern, so no rate
    /// can be computed.
    #[error("book contains no tokens; error rate is undefined")]
    EmptyBook,

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A per-book file from an earlier run exists but is not valid error data.
    #[error("malformed cached error data in {}: {source}", path.display())]
    MalformedCache {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("tsv error: {0}")]
    Tsv(#[from] csv::Error),

    #[error("invalid token pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("dictionary {name}: {reason}")]
    Dictionary { name: String, reason: String },

    #[error("invalid configuration {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },

    #[error("failed to walk corpus folder: {0}")]
    Discovery(#[from] walkdir::Error),
}

/// Convenience Result alias used across the crate.
pub type Result<T> = std::result::Result<T, ErrorRateError>;

//! Error types for RagChat.

use thiserror::Error;

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// RagChat error types.
#[derive(Debug, Error)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Storage error not originating from SQLite itself
    #[error("Storage error: {0}")]
    Storage(String),

    /// Embedding error
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Text generation error
    #[error("Generation error: {0}")]
    Generation(String),

    /// Crawl error
    #[error("Crawl error: {0}")]
    Crawl(String),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

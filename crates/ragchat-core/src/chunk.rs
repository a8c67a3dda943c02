//! Chunk types for crawled page content.

use crate::ContentHash;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Identity of a stored chunk: `"{url}_{chunk_number}"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChunkId(String);

impl ChunkId {
    /// Build the id of the `chunk_number`-th chunk of `url`.
    pub fn new(url: &str, chunk_number: usize) -> Self {
        Self(format!("{}_{}", url, chunk_number))
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ChunkId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Host of a URL, with the port when one is written explicitly.
pub fn netloc(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

/// Provenance recorded alongside every chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Site the chunk came from (host[:port])
    pub source: String,
    /// Path component of the page URL
    pub url_path: String,
    /// Length of the chunk in characters
    pub chunk_size: usize,
    /// When the page was crawled
    pub crawled_at: DateTime<Utc>,
}

impl ChunkMetadata {
    /// Derive metadata for a chunk of `url`.
    pub fn new(url: &Url, content: &str, crawled_at: DateTime<Utc>) -> Self {
        Self {
            source: netloc(url),
            url_path: url.path().to_string(),
            chunk_size: content.chars().count(),
            crawled_at,
        }
    }
}

/// A titled piece of a crawled page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique identifier
    pub id: ChunkId,
    /// Page URL
    pub url: String,
    /// Position of the chunk within the page (0-indexed)
    pub chunk_number: usize,
    /// Short generated title
    pub title: String,
    /// The chunk text
    pub content: String,
    /// Hash of `content`
    pub content_hash: ContentHash,
    /// Provenance
    pub metadata: ChunkMetadata,
}

impl Chunk {
    /// Create a new chunk for a page.
    pub fn new(
        url: &Url,
        chunk_number: usize,
        title: String,
        content: String,
        crawled_at: DateTime<Utc>,
    ) -> Self {
        let metadata = ChunkMetadata::new(url, &content, crawled_at);
        Self {
            id: ChunkId::new(url.as_str(), chunk_number),
            url: url.to_string(),
            chunk_number,
            title,
            content_hash: ContentHash::from_content(content.as_bytes()),
            content,
            metadata,
        }
    }

    /// The summary shown with a source; the chunk text itself.
    pub fn summary(&self) -> &str {
        &self.content
    }
}

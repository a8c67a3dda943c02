use crate::chunk::Chunk;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SearchHit {
    pub chunk_id: String,
    pub similarity: f32,
    pub chunk: Option<Chunk>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SearchOptions {
    pub limit: usize,
    pub threshold: f32,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: 5,
            threshold: 0.0,
        }
    }
}

/// Outcome of a finished crawl.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CrawlReport {
    pub start_url: String,
    pub pages_processed: usize,
    /// Chunks in the store after the crawl
    pub chunks_total: usize,
}

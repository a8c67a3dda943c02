//! Storage and model trait definitions.

use crate::{Chunk, ChunkId, ContentHash, Result, SearchQuery};
use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// An embedding vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Embedding {
    /// The vector data
    pub vector: Vec<f32>,
    /// Model used to generate this embedding
    pub model_id: String,
    /// Dimensions
    pub dimensions: usize,
}

impl Embedding {
    /// Create a new embedding.
    pub fn new(vector: Vec<f32>, model_id: String) -> Self {
        let dimensions = vector.len();
        Self {
            vector,
            model_id,
            dimensions,
        }
    }

    /// Compute cosine similarity with another embedding.
    pub fn cosine_similarity(&self, other: &Embedding) -> f32 {
        if self.dimensions != other.dimensions {
            return 0.0;
        }

        let dot_product: f32 = self
            .vector
            .iter()
            .zip(other.vector.iter())
            .map(|(a, b)| a * b)
            .sum();

        let norm_a: f32 = self.vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = other.vector.iter().map(|x| x * x).sum::<f32>().sqrt();

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        dot_product / (norm_a * norm_b)
    }
}

/// Result of a similarity search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityResult {
    /// Id of the similar chunk
    pub chunk_id: ChunkId,
    /// Cosine similarity (-1.0 to 1.0)
    pub similarity: f32,
}

/// Summary of the stored corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusStats {
    /// Number of stored chunks
    pub doc_count: usize,
    /// Distinct page URLs, sorted
    pub urls: Vec<String>,
    /// Distinct sources (host[:port]), sorted
    pub domains: Vec<String>,
    /// Most recent crawl time
    pub last_updated: Option<DateTime<Utc>>,
}

impl CorpusStats {
    /// Last update rendered in the local time zone.
    pub fn last_updated_local(&self) -> String {
        match self.last_updated {
            Some(ts) => ts
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S %Z")
                .to_string(),
            None => "Unknown".to_string(),
        }
    }
}

/// Chunk storage trait.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Insert or replace a chunk.
    async fn put(&self, chunk: &Chunk) -> Result<ChunkId>;

    /// Retrieve chunk by id.
    async fn get(&self, id: &ChunkId) -> Result<Option<Chunk>>;

    /// Check if a chunk exists.
    async fn exists(&self, id: &ChunkId) -> Result<bool>;

    /// Batch retrieval, preserving the order of `ids` and skipping missing ones.
    async fn get_many(&self, ids: &[ChunkId]) -> Result<Vec<Chunk>>;

    /// Count total chunks.
    async fn count(&self) -> Result<usize>;

    /// Content hash of a stored chunk, if present.
    async fn content_hash_of(&self, id: &ChunkId) -> Result<Option<ContentHash>>;

    /// Record that an unchanged chunk was seen again at `crawled_at`.
    /// Returns `false` if the chunk is not stored.
    async fn touch(&self, id: &ChunkId, crawled_at: DateTime<Utc>) -> Result<bool>;

    /// Remove every chunk (and its embedding) of a page. Returns rows removed.
    async fn delete_by_url(&self, url: &str) -> Result<usize>;
}

/// Vector storage and similarity search trait.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Store embedding for a chunk.
    async fn put(&self, id: &ChunkId, embedding: &Embedding) -> Result<()>;

    /// Retrieve embedding.
    async fn get(&self, id: &ChunkId) -> Result<Option<Embedding>>;

    /// Find similar vectors (k-NN).
    async fn search(
        &self,
        query: &Embedding,
        limit: usize,
        threshold: f32,
    ) -> Result<Vec<SimilarityResult>>;
}

/// Filtered similarity search.
#[async_trait]
pub trait QueryStore: Send + Sync {
    /// Search with the metadata filters of `query` applied before ranking.
    async fn query(
        &self,
        query: &SearchQuery,
        embedding: &Embedding,
        threshold: f32,
    ) -> Result<Vec<SimilarityResult>>;
}

/// Corpus statistics.
#[async_trait]
pub trait StatsStore: Send + Sync {
    /// Statistics of the stored corpus, `None` when it is empty.
    async fn stats(&self) -> Result<Option<CorpusStats>>;
}

/// Trait for generating text embeddings.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Embedding>;

    /// Generate embeddings for multiple texts.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>>;

    /// Identifier of the embedding model.
    fn model_id(&self) -> &str;
}

/// Trait for text completion models.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Complete `prompt` and return the generated text.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_cosine_similarity() {
        let e1 = Embedding::new(vec![1.0, 0.0, 0.0], "test".to_string());
        let e2 = Embedding::new(vec![1.0, 0.0, 0.0], "test".to_string());
        let e3 = Embedding::new(vec![0.0, 1.0, 0.0], "test".to_string());

        // Same vectors should have similarity 1.0
        assert!((e1.cosine_similarity(&e2) - 1.0).abs() < 0.001);

        // Orthogonal vectors should have similarity 0.0
        assert!((e1.cosine_similarity(&e3) - 0.0).abs() < 0.001);
    }

    #[test]
    fn test_cosine_similarity_degenerate() {
        let zero = Embedding::new(vec![0.0, 0.0], "test".to_string());
        let short = Embedding::new(vec![1.0, 0.0], "test".to_string());
        let long = Embedding::new(vec![1.0, 0.0, 0.0], "test".to_string());

        assert_eq!(zero.cosine_similarity(&short), 0.0);
        assert_eq!(short.cosine_similarity(&long), 0.0);
    }

    #[test]
    fn test_last_updated_local() {
        let stats = CorpusStats {
            doc_count: 1,
            urls: vec![],
            domains: vec![],
            last_updated: Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()),
        };
        let rendered = stats.last_updated_local();
        assert!(rendered.starts_with("2024-05-01") || rendered.starts_with("2024-05-02") || rendered.starts_with("2024-04-30"));

        let empty = CorpusStats { last_updated: None, ..stats };
        assert_eq!(empty.last_updated_local(), "Unknown");
    }
}

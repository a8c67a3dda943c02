//! Test utilities for RagChat.
//!
//! Provides reusable fixtures and in-process model doubles.

use crate::chunk::Chunk;
use crate::error::{Error, Result};
use crate::storage::{Embedder, Embedding, LanguageModel, SqliteStorage};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Mutex;
use url::Url;

/// Test fixture for creating sample chunks.
pub struct TestFixtures;

impl TestFixtures {
    /// Create a chunk of `url` whose title is derived from the content.
    pub fn chunk(url: &str, chunk_number: usize, content: &str) -> Chunk {
        let url = Url::parse(url).expect("fixture url");
        Chunk::new(
            &url,
            chunk_number,
            format!("About {}", content),
            content.to_string(),
            Utc::now(),
        )
    }

    /// Create a sample embedding with deterministic values.
    pub fn embedding(dimensions: usize, model_id: &str) -> Embedding {
        let vector: Vec<f32> = (0..dimensions)
            .map(|i| (i + 1) as f32 / dimensions as f32)
            .collect();
        Embedding::new(vector, model_id.to_string())
    }
}

/// Embeds text as keyword counts, so texts sharing keywords are similar.
pub struct KeywordEmbedder {
    keywords: Vec<String>,
    model_id: String,
}

impl KeywordEmbedder {
    pub fn new(keywords: &[&str]) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            model_id: "keywords".to_string(),
        }
    }

    /// Report a different model id.
    pub fn named(mut self, model_id: &str) -> Self {
        self.model_id = model_id.to_string();
        self
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        let mut vector: Vec<f32> = self
            .keywords
            .iter()
            .map(|k| lower.matches(k.as_str()).count() as f32)
            .collect();
        // Keeps texts without any keyword away from the zero vector
        vector.push(0.1);
        vector
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding> {
        Ok(Embedding::new(self.vectorize(text), self.model_id.clone()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Embedder that always fails.
pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Embedding> {
        Err(Error::Embedding("embedding service unavailable".to_string()))
    }

    async fn embed_batch(&self, _texts: &[&str]) -> Result<Vec<Embedding>> {
        Err(Error::Embedding("embedding service unavailable".to_string()))
    }

    fn model_id(&self) -> &str {
        "failing"
    }
}

/// Language model returning a fixed reply and recording every prompt.
pub struct ScriptedModel {
    reply: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply
            .clone()
            .ok_or_else(|| Error::Generation("model offline".to_string()))
    }
}

/// Create a temporary in-memory storage for testing.
pub fn test_storage() -> SqliteStorage {
    SqliteStorage::in_memory().expect("Failed to create in-memory storage")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_fixture() {
        let chunk = TestFixtures::chunk("https://forum.example.com/t/1", 2, "fever");
        assert_eq!(chunk.title, "About fever");
        assert_eq!(chunk.chunk_number, 2);
        assert_eq!(chunk.metadata.source, "forum.example.com");
    }

    #[tokio::test]
    async fn test_keyword_embedder_similarity() {
        let embedder = KeywordEmbedder::new(&["fever", "sleep"]);
        let q = embedder.embed("child has a fever").await.unwrap();
        let near = embedder.embed("Fever medicine dosage").await.unwrap();
        let far = embedder.embed("cannot sleep at night").await.unwrap();
        assert!(q.cosine_similarity(&near) > q.cosine_similarity(&far));
    }
}

//! In-process embeddings using fastembed.

use async_trait::async_trait;
use ragchat_core::storage::{Embedder, Embedding};
use ragchat_core::{Error, Result};
use std::sync::{Arc, Mutex};

const DEFAULT_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Embedding generator using fastembed.
pub struct LocalEmbedder {
    model: Arc<Mutex<fastembed::TextEmbedding>>,
    model_id: String,
}

impl LocalEmbedder {
    /// Create a new embedding generator with the default model.
    pub fn new() -> Result<Self> {
        Self::with_model(DEFAULT_MODEL)
    }

    /// Create a new embedding generator with a specific model.
    ///
    /// Unrecognized names fall back to all-MiniLM-L6-v2.
    pub fn with_model(model_name: &str) -> Result<Self> {
        let (kind, model_id) = match model_name.to_lowercase().as_str() {
            "multilingual-e5-small" | "intfloat/multilingual-e5-small" => (
                fastembed::EmbeddingModel::MultilingualE5Small,
                "intfloat/multilingual-e5-small",
            ),
            "bge-small-en-v1.5" | "baai/bge-small-en-v1.5" => (
                fastembed::EmbeddingModel::BGESmallENV15,
                "BAAI/bge-small-en-v1.5",
            ),
            other => {
                if other != DEFAULT_MODEL.to_lowercase() && other != "all-minilm-l6-v2" {
                    tracing::warn!("Unknown local embedding model {}, using {}", model_name, DEFAULT_MODEL);
                }
                (fastembed::EmbeddingModel::AllMiniLML6V2, DEFAULT_MODEL)
            }
        };

        let model = fastembed::TextEmbedding::try_new(
            fastembed::InitOptions::new(kind).with_show_download_progress(true),
        )
        .map_err(|e| Error::Embedding(e.to_string()))?;

        Ok(Self {
            model: Arc::new(Mutex::new(model)),
            model_id: model_id.to_string(),
        })
    }

    async fn run(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let model = Arc::clone(&self.model);
        tokio::task::spawn_blocking(move || {
            let mut model = model.lock().map_err(|e| Error::Embedding(e.to_string()))?;
            model
                .embed(texts, None)
                .map_err(|e| Error::Embedding(e.to_string()))
        })
        .await
        .map_err(|e| Error::Embedding(format!("embedding task failed: {}", e)))?
    }
}

#[async_trait]
impl Embedder for LocalEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding> {
        let vector = self
            .run(vec![text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Embedding("No embedding generated".to_string()))?;

        Ok(Embedding::new(vector, self.model_id.clone()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        let owned = texts.iter().map(|t| t.to_string()).collect();
        Ok(self
            .run(owned)
            .await?
            .into_iter()
            .map(|vector| Embedding::new(vector, self.model_id.clone()))
            .collect())
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore = "downloads model weights"]
    async fn test_initialization() {
        let generator = LocalEmbedder::new().expect("Failed to create generator");
        let embedding = generator.embed("Hello world").await.expect("Failed to embed text");
        assert_eq!(embedding.dimensions, 384); // all-MiniLM-L6-v2 dimensions
    }
}

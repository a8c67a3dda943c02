//! RagChat Models Library
//!
//! Clients for the embedding and generation models used by RagChat.

#[cfg(feature = "local")]
pub mod local;
pub mod ollama;

#[cfg(feature = "local")]
pub use local::LocalEmbedder;
pub use ollama::{OllamaEmbedder, OllamaGenerator};

use ragchat_core::config::{EmbeddingProvider, Settings};
use ragchat_core::storage::{Embedder, LanguageModel};
use ragchat_core::Result;
use std::sync::Arc;
use std::time::Duration;

fn model_timeout(settings: &Settings) -> Duration {
    Duration::from_secs(settings.model_timeout_secs)
}

/// Build the embedder selected by `settings`.
pub fn build_embedder(settings: &Settings) -> Result<Arc<dyn Embedder>> {
    match settings.embedding_provider {
        EmbeddingProvider::Ollama => {
            tracing::debug!(
                "Using Ollama embeddings: {} at {}",
                settings.embedding_model,
                settings.ollama_host
            );
            Ok(Arc::new(
                OllamaEmbedder::new(settings.ollama_host.clone(), settings.embedding_model.clone())
                    .with_timeout(model_timeout(settings)),
            ))
        }
        #[cfg(feature = "local")]
        EmbeddingProvider::Local => Ok(Arc::new(LocalEmbedder::with_model(&settings.embedding_model)?)),
        #[cfg(not(feature = "local"))]
        EmbeddingProvider::Local => Err(ragchat_core::Error::Config(
            "local embeddings need ragchat-models built with the `local` feature".to_string(),
        )),
    }
}

/// Build the model that answers questions.
pub fn build_chat_model(settings: &Settings) -> Arc<dyn LanguageModel> {
    Arc::new(
        OllamaGenerator::new(settings.ollama_host.clone(), settings.llm_model.clone())
            .with_timeout(model_timeout(settings)),
    )
}

/// Build the model that titles chunks, sampling at the title temperature.
pub fn build_title_model(settings: &Settings) -> Arc<dyn LanguageModel> {
    Arc::new(
        OllamaGenerator::new(settings.ollama_host.clone(), settings.llm_model.clone())
            .with_temperature(settings.title_temperature)
            .with_timeout(model_timeout(settings)),
    )
}

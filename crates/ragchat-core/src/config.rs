//! Runtime configuration.
//!
//! Settings come from the environment (optionally seeded from a `.env` file by
//! the binaries); command-line flags override individual values. The shared
//! Ollama variables are unprefixed, everything RagChat-specific is read from
//! `RAGCHAT_*`.

use crate::error::{Error, Result};
use config::{Config, Environment};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

/// Where embeddings are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// Ollama `/api/embed`
    Ollama,
    /// In-process fastembed model (requires the `local` feature of `ragchat-models`)
    #[serde(alias = "fastembed")]
    Local,
}

/// RagChat settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the Ollama server
    pub ollama_host: String,
    /// Model used for titles and answers
    pub llm_model: String,
    /// Model used for embeddings
    pub embedding_model: String,
    /// Embedding backend
    pub embedding_provider: EmbeddingProvider,
    /// Default crawl start URL
    pub target_url: String,
    /// SQLite database path
    #[serde(rename = "ragchat_database")]
    pub database: PathBuf,
    /// Default maximum pages per crawl
    #[serde(rename = "ragchat_max_pages")]
    pub max_pages: usize,
    /// Pause between page fetches
    #[serde(rename = "ragchat_crawl_delay_ms")]
    pub crawl_delay_ms: u64,
    /// Per-request fetch timeout
    #[serde(rename = "ragchat_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    /// Per-request timeout for model calls
    #[serde(rename = "ragchat_model_timeout_secs")]
    pub model_timeout_secs: u64,
    /// Pages with less extracted text are not stored
    #[serde(rename = "ragchat_min_page_chars")]
    pub min_page_chars: usize,
    /// Chunk size in characters
    #[serde(rename = "ragchat_chunk_size")]
    pub chunk_size: usize,
    /// Chunks processed concurrently per page
    #[serde(rename = "ragchat_ingest_concurrency")]
    pub ingest_concurrency: usize,
    /// Temperature for title generation
    #[serde(rename = "ragchat_title_temperature")]
    pub title_temperature: f32,
    /// Number of chunks retrieved per question
    #[serde(rename = "ragchat_top_k")]
    pub top_k: usize,
    /// Minimum cosine similarity of retrieved chunks
    #[serde(rename = "ragchat_min_similarity")]
    pub min_similarity: f32,
    /// Number of previous chat messages included in the prompt
    #[serde(rename = "ragchat_history_messages")]
    pub history_messages: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ollama_host: "http://localhost:11434".to_string(),
            llm_model: "llama3.2".to_string(),
            embedding_model: "bge-m3".to_string(),
            embedding_provider: EmbeddingProvider::Ollama,
            target_url: "https://www.agnoshealth.com/forums".to_string(),
            database: PathBuf::from(".ragchat/index.db"),
            max_pages: 50,
            crawl_delay_ms: 1000,
            fetch_timeout_secs: 30,
            model_timeout_secs: 120,
            min_page_chars: 500,
            chunk_size: crate::chunker::DEFAULT_CHUNK_SIZE,
            ingest_concurrency: 4,
            title_temperature: 0.1,
            top_k: 3,
            min_similarity: 0.0,
            history_messages: 4,
        }
    }
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }

    /// Read settings from `vars` instead of the process environment.
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self> {
        Self::load(Some(vars))
    }

    fn load(vars: Option<HashMap<String, String>>) -> Result<Self> {
        let conf = Config::builder()
            .add_source(Environment::default().ignore_empty(true).source(vars))
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;
        let mut settings: Settings = conf
            .try_deserialize()
            .map_err(|e| Error::Config(e.to_string()))?;

        settings.ollama_host = settings.ollama_host.trim_end_matches('/').to_string();
        Ok(settings)
    }
}

//! Ollama HTTP clients.
//!
//! Embeddings go through `POST /api/embed`, completions through
//! `POST /api/generate` with streaming disabled.

use async_trait::async_trait;
use ragchat_core::storage::{Embedder, Embedding, LanguageModel};
use ragchat_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Per-request timeout used unless overridden with `with_timeout`.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerateOptions>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

fn endpoint(host: &str, path: &str) -> String {
    format!("{}{}", host.trim_end_matches('/'), path)
}

/// Embedding provider backed by an Ollama server.
pub struct OllamaEmbedder {
    client: reqwest::Client,
    host: String,
    model: String,
    timeout: Duration,
}

impl OllamaEmbedder {
    /// Create an embedder for `model` served at `host` (e.g. "http://localhost:11434").
    pub fn new(host: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            host: host.into(),
            model: model.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Give up on a request after `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn request(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let request = EmbedRequest {
            model: &self.model,
            input: texts.to_vec(),
        };

        let response = self
            .client
            .post(endpoint(&self.host, "/api/embed"))
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Embedding(format!("Ollama request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Embedding(format!("Ollama API error {}: {}", status, body)));
        }

        let result: EmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::Embedding(format!("Invalid Ollama response: {}", e)))?;

        if result.embeddings.len() != texts.len() {
            return Err(Error::Embedding(format!(
                "Ollama returned {} embeddings for {} inputs",
                result.embeddings.len(),
                texts.len()
            )));
        }
        Ok(result.embeddings)
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding> {
        let vector = self
            .request(&[text])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Embedding("Empty response from Ollama".to_string()))?;
        Ok(Embedding::new(vector, self.model.clone()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .request(texts)
            .await?
            .into_iter()
            .map(|vector| Embedding::new(vector, self.model.clone()))
            .collect())
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

/// Text generation backed by an Ollama server.
pub struct OllamaGenerator {
    client: reqwest::Client,
    host: String,
    model: String,
    temperature: Option<f32>,
    timeout: Duration,
}

impl OllamaGenerator {
    pub fn new(host: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            host: host.into(),
            model: model.into(),
            temperature: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Give up on a request after `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sample with a fixed temperature instead of the model default.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LanguageModel for OllamaGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: self.temperature.map(|temperature| GenerateOptions { temperature }),
        };

        let response = self
            .client
            .post(endpoint(&self.host, "/api/generate"))
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Generation(format!("Ollama request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Generation(format!("Ollama API error {}: {}", status, body)));
        }

        let result: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::Generation(format!("Invalid Ollama response: {}", e)))?;
        Ok(result.response)
    }
}

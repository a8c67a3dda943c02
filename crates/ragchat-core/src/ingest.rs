//! Turning crawled pages into titled, embedded chunks.

use crate::chunk::{netloc, Chunk, ChunkId};
use crate::chunker::{chunk_text, DEFAULT_CHUNK_SIZE};
use crate::content_hash::ContentHash;
use crate::error::Result;
use crate::storage::{ChunkStore, Embedder, Embedding, LanguageModel, SqliteStorage, VectorStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use url::Url;

/// Characters of a chunk shown to the title model.
const TITLE_INPUT_CHARS: usize = 1500;

/// Destination for the text of crawled pages.
#[async_trait]
pub trait PageSink: Send + Sync {
    /// Store the text of the page at `url`, returning the number of chunks stored.
    async fn store_page(&self, url: &Url, text: &str) -> Result<usize>;
}

enum ChunkOutcome {
    /// Unchanged since the last crawl and embedded by the current model
    Reused(ChunkId),
    Fresh(Chunk, Embedding),
    Skipped,
}

#[derive(Deserialize)]
struct TitleResponse {
    title: String,
}

/// Chunks, titles and embeds pages into the store.
pub struct Ingestor {
    storage: Arc<SqliteStorage>,
    embedder: Arc<dyn Embedder>,
    titler: Arc<dyn LanguageModel>,
    chunk_size: usize,
    concurrency: usize,
}

impl Ingestor {
    pub fn new(
        storage: Arc<SqliteStorage>,
        embedder: Arc<dyn Embedder>,
        titler: Arc<dyn LanguageModel>,
    ) -> Self {
        Self {
            storage,
            embedder,
            titler,
            chunk_size: DEFAULT_CHUNK_SIZE,
            concurrency: 4,
        }
    }

    /// Set the chunk size in characters.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Set how many chunks of a page are processed at once.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Generate a short title for a chunk, falling back to the page's host.
    pub async fn generate_title(&self, url: &Url, content: &str) -> String {
        let fallback = format!("Content from {}", netloc(url));
        let prompt = title_prompt(content);

        match self.titler.generate(&prompt).await {
            Ok(response) => parse_title(&response).unwrap_or_else(|| {
                tracing::warn!("No usable title in model response for {}", url);
                fallback
            }),
            Err(e) => {
                tracing::warn!("Title generation failed for {}: {}", url, e);
                fallback
            }
        }
    }

    async fn process_chunk(
        &self,
        url: &Url,
        chunk_number: usize,
        content: String,
        crawled_at: DateTime<Utc>,
    ) -> Result<ChunkOutcome> {
        let id = ChunkId::new(url.as_str(), chunk_number);
        let hash = ContentHash::from_content(content.as_bytes());

        let mut known_title = None;
        if ChunkStore::content_hash_of(&*self.storage, &id).await? == Some(hash) {
            let embedded = VectorStore::get(&*self.storage, &id)
                .await?
                .is_some_and(|e| e.model_id == self.embedder.model_id());
            if embedded {
                return Ok(ChunkOutcome::Reused(id));
            }
            tracing::debug!("Re-embedding {} with {}", id, self.embedder.model_id());
            known_title = ChunkStore::get(&*self.storage, &id).await?.map(|c| c.title);
        }

        let embedding = match self.embedder.embed(&content).await {
            Ok(embedding) => embedding,
            Err(e) => {
                tracing::warn!("Skipping chunk {}: embedding failed: {}", id, e);
                return Ok(ChunkOutcome::Skipped);
            }
        };
        let title = match known_title {
            Some(title) => title,
            None => self.generate_title(url, &content).await,
        };

        let chunk = Chunk::new(url, chunk_number, title, content, crawled_at);
        Ok(ChunkOutcome::Fresh(chunk, embedding))
    }
}

#[async_trait]
impl PageSink for Ingestor {
    async fn store_page(&self, url: &Url, text: &str) -> Result<usize> {
        let crawled_at = Utc::now();
        let pieces = chunk_text(text, self.chunk_size);
        tracing::debug!("Split {} into {} chunks", url, pieces.len());

        let tasks: Vec<_> = pieces
            .into_iter()
            .enumerate()
            .map(|(n, content)| self.process_chunk(url, n, content, crawled_at))
            .collect();
        let outcomes: Vec<Result<ChunkOutcome>> = stream::iter(tasks)
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut stored = 0;
        for outcome in outcomes {
            match outcome? {
                ChunkOutcome::Reused(id) => {
                    ChunkStore::touch(&*self.storage, &id, crawled_at).await?;
                    stored += 1;
                }
                ChunkOutcome::Fresh(chunk, embedding) => {
                    self.storage.put_embedded(&chunk, &embedding).await?;
                    stored += 1;
                }
                ChunkOutcome::Skipped => {}
            }
        }

        tracing::info!("Stored {} chunks from {}", stored, url);
        Ok(stored)
    }
}

fn title_prompt(content: &str) -> String {
    let excerpt: String = content.chars().take(TITLE_INPUT_CHARS).collect();
    format!(
        "Write a short, descriptive title for the following forum content. \
Answer with JSON only, in the form {{\"title\": \"...\"}}.\n\nContent:\n{}",
        excerpt
    )
}

/// Title from the first JSON object in a model response.
fn parse_title(response: &str) -> Option<String> {
    let start = response.find('{')?;
    let parsed = serde_json::Deserializer::from_str(&response[start..])
        .into_iter::<TitleResponse>()
        .next()?
        .ok()?;
    let title = parsed.title.trim();
    (!title.is_empty()).then(|| title.to_string())
}

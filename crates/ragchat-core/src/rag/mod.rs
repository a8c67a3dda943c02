//! Retrieval-augmented answer generation.
//!
//! A question is embedded, the nearest stored chunks are retrieved, and the
//! language model answers from them with the recent conversation as context.

mod prompt;

pub use prompt::PromptTemplates;

use crate::chunk::Chunk;
use crate::error::{Error, Result};
use crate::storage::{ChunkStore, Embedder, LanguageModel, SqliteStorage, VectorStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One turn of the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A retrieved chunk cited by an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub url: String,
    pub summary: String,
    pub score: f32,
}

/// Final answer with its sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
    pub sources: Vec<Source>,
}

/// The last `limit` messages of `history`.
pub fn recent_history(history: &[ChatMessage], limit: usize) -> &[ChatMessage] {
    &history[history.len().saturating_sub(limit)..]
}

/// Embeds questions, retrieves context and generates answers.
pub struct RagPipeline {
    storage: Arc<SqliteStorage>,
    embedder: Arc<dyn Embedder>,
    llm: Arc<dyn LanguageModel>,
    templates: PromptTemplates,
    top_k: usize,
    min_similarity: f32,
    history_messages: usize,
}

impl RagPipeline {
    /// Create a pipeline with default templates, top-3 retrieval and four history messages.
    pub fn new(
        storage: Arc<SqliteStorage>,
        embedder: Arc<dyn Embedder>,
        llm: Arc<dyn LanguageModel>,
    ) -> Self {
        Self {
            storage,
            embedder,
            llm,
            templates: PromptTemplates::default(),
            top_k: 3,
            min_similarity: 0.0,
            history_messages: 4,
        }
    }

    /// Set the prompt texts.
    pub fn with_templates(mut self, templates: PromptTemplates) -> Self {
        self.templates = templates;
        self
    }

    /// Set the number of retrieved chunks.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Set the minimum similarity of retrieved chunks.
    pub fn with_min_similarity(mut self, min_similarity: f32) -> Self {
        self.min_similarity = min_similarity;
        self
    }

    /// Set how many previous messages reach the prompt.
    pub fn with_history_messages(mut self, history_messages: usize) -> Self {
        self.history_messages = history_messages;
        self
    }

    pub fn templates(&self) -> &PromptTemplates {
        &self.templates
    }

    /// Nearest chunks to `question`, best first.
    pub async fn retrieve(&self, question: &str) -> Result<Vec<(Chunk, f32)>> {
        let embedding = self.embedder.embed(question).await?;
        let hits =
            VectorStore::search(&*self.storage, &embedding, self.top_k, self.min_similarity).await?;

        let mut retrieved = Vec::with_capacity(hits.len());
        for hit in hits {
            match ChunkStore::get(&*self.storage, &hit.chunk_id).await? {
                Some(chunk) => retrieved.push((chunk, hit.similarity)),
                None => tracing::warn!("Embedding without chunk: {}", hit.chunk_id),
            }
        }
        Ok(retrieved)
    }

    /// Answer `question` given the conversation so far.
    pub async fn answer(&self, question: &str, history: &[ChatMessage]) -> Result<Answer> {
        let retrieved = self.retrieve(question).await?;
        tracing::debug!("Retrieved {} chunks for question", retrieved.len());

        if retrieved.is_empty() {
            return Ok(Answer {
                answer: self.templates.with_disclaimer(&self.templates.no_information),
                sources: Vec::new(),
            });
        }

        let context: Vec<String> = retrieved
            .iter()
            .map(|(chunk, _)| format!("- {}: {}", self.title_of(chunk), chunk.content))
            .collect();

        let history = recent_history(history, self.history_messages);
        let prompt = self.templates.build_prompt(question, history, &context);
        let raw = self.llm.generate(&prompt).await?;

        let sources = retrieved
            .into_iter()
            .map(|(chunk, score)| Source {
                title: self.title_of(&chunk).to_string(),
                summary: chunk.summary().to_string(),
                url: chunk.url,
                score,
            })
            .collect();

        Ok(Answer {
            answer: self.templates.finalize(&raw, true),
            sources,
        })
    }

    /// Answer shown when answering failed.
    pub fn error_answer(&self, err: &Error) -> Answer {
        let body = format!("{}: {}", self.templates.error_prefix, err);
        Answer {
            answer: self.templates.with_disclaimer(&body),
            sources: Vec::new(),
        }
    }

    fn title_of<'a>(&'a self, chunk: &'a Chunk) -> &'a str {
        if chunk.title.trim().is_empty() {
            &self.templates.untitled
        } else {
            &chunk.title
        }
    }
}

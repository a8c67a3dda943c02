//! RagChat Core Library
//!
//! Core types, storage, ingestion and retrieval-augmented generation for the
//! RagChat forum chatbot.

pub mod chunk;
pub mod chunker;
pub mod config;
pub mod content_hash;
pub mod error;
pub mod ingest;
pub mod query;
pub mod rag;
pub mod service;
pub mod storage;

#[cfg(test)]
pub mod testutils;

pub use chunk::{Chunk, ChunkId, ChunkMetadata};
pub use config::Settings;
pub use content_hash::ContentHash;
pub use error::{Error, Result};
pub use ingest::{Ingestor, PageSink};
pub use query::SearchQuery;
pub use rag::{Answer, ChatMessage, PromptTemplates, RagPipeline, Role, Source};

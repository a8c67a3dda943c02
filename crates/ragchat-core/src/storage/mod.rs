//! Storage abstraction layer.
//!
//! This module provides trait-based storage abstractions that can be
//! implemented by different backends, plus the model traits the ingestion and
//! retrieval pipelines are written against.

mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{
    ChunkStore, CorpusStats, Embedder, Embedding, LanguageModel, QueryStore, SimilarityResult,
    StatsStore, VectorStore,
};

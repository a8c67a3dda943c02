pub mod models;

use crate::rag::{Answer, ChatMessage};
use crate::storage::CorpusStats;
use async_trait::async_trait;
pub use models::*;

#[async_trait]
pub trait RagService: Send + Sync {
    /// Crawl from `url` and ingest up to `max_pages` pages
    async fn crawl(&self, url: &str, max_pages: usize) -> anyhow::Result<CrawlReport>;

    /// Answer a question; failures come back as an error answer
    async fn ask(&self, question: &str, history: &[ChatMessage]) -> anyhow::Result<Answer>;

    /// Summary of the stored corpus, `None` when empty
    async fn stats(&self) -> anyhow::Result<Option<CorpusStats>>;

    /// Semantic search with the query DSL
    async fn search(&self, query: &str, options: SearchOptions) -> anyhow::Result<Vec<SearchHit>>;
}

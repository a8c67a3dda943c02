use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;

use ragchat_core::query::SearchQuery;
use ragchat_core::rag::{Answer, ChatMessage, RagPipeline};
use ragchat_core::service::{CrawlReport, RagService, SearchHit, SearchOptions};
use ragchat_core::storage::{
    ChunkStore, CorpusStats, Embedder, LanguageModel, QueryStore, SqliteStorage, StatsStore,
};
use ragchat_core::{Ingestor, Settings};
use ragchat_crawler::{CrawlOptions, Crawler};

pub struct DefaultRagService {
    storage: Arc<SqliteStorage>,
    embedder: Arc<dyn Embedder>,
    ingestor: Ingestor,
    pipeline: RagPipeline,
    crawler: Crawler,
}

impl DefaultRagService {
    pub fn new(
        storage: Arc<SqliteStorage>,
        embedder: Arc<dyn Embedder>,
        chat_model: Arc<dyn LanguageModel>,
        title_model: Arc<dyn LanguageModel>,
        settings: &Settings,
    ) -> Result<Self> {
        let ingestor = Ingestor::new(Arc::clone(&storage), Arc::clone(&embedder), title_model)
            .with_chunk_size(settings.chunk_size)
            .with_concurrency(settings.ingest_concurrency);

        let pipeline = RagPipeline::new(Arc::clone(&storage), Arc::clone(&embedder), chat_model)
            .with_top_k(settings.top_k)
            .with_min_similarity(settings.min_similarity)
            .with_history_messages(settings.history_messages);

        let crawler = Crawler::new(CrawlOptions::from_settings(settings))?;

        Ok(Self {
            storage,
            embedder,
            ingestor,
            pipeline,
            crawler,
        })
    }

    /// Open the database and connect the configured models.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        if let Some(parent) = settings.database.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create database directory {}", parent.display())
                })?;
            }
        }

        let storage = Arc::new(SqliteStorage::new(&settings.database)?);
        let embedder = ragchat_models::build_embedder(settings)?;
        let chat_model = ragchat_models::build_chat_model(settings);
        let title_model = ragchat_models::build_title_model(settings);

        Self::new(storage, embedder, chat_model, title_model, settings)
    }
}

#[async_trait]
impl RagService for DefaultRagService {
    async fn crawl(&self, url: &str, max_pages: usize) -> Result<CrawlReport> {
        let pages_processed = self.crawler.crawl(url, max_pages, &self.ingestor).await?;
        let chunks_total = ChunkStore::count(&*self.storage).await?;

        Ok(CrawlReport {
            start_url: url.to_string(),
            pages_processed,
            chunks_total,
        })
    }

    async fn ask(&self, question: &str, history: &[ChatMessage]) -> Result<Answer> {
        match self.pipeline.answer(question, history).await {
            Ok(answer) => Ok(answer),
            Err(e) => {
                tracing::error!("Failed to answer question: {}", e);
                Ok(self.pipeline.error_answer(&e))
            }
        }
    }

    async fn stats(&self) -> Result<Option<CorpusStats>> {
        Ok(StatsStore::stats(&*self.storage).await?)
    }

    async fn search(&self, query_str: &str, options: SearchOptions) -> Result<Vec<SearchHit>> {
        let query = SearchQuery::parse_with_limit(query_str, options.limit);

        let embedding = self.embedder.embed(&query.raw_query).await?;
        let sim_results = QueryStore::query(&*self.storage, &query, &embedding, options.threshold)
            .await?;

        let mut results = Vec::with_capacity(sim_results.len());
        for res in sim_results {
            let chunk = ChunkStore::get(&*self.storage, &res.chunk_id).await?;
            results.push(SearchHit {
                chunk_id: res.chunk_id.to_string(),
                similarity: res.similarity,
                chunk,
            });
        }

        Ok(results)
    }
}

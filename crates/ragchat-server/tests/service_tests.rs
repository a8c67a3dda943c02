//! Full-stack tests of the default service: crawl a local site, then ask about it.

use async_trait::async_trait;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use ragchat_core::service::{RagService, SearchOptions};
use ragchat_core::storage::{Embedder, Embedding, LanguageModel, SqliteStorage};
use ragchat_core::{Error, Result, Settings};
use ragchat_server::DefaultRagService;
use std::sync::Arc;
use tempfile::TempDir;

const TOPICS: &[&str] = &["fever", "sleep", "diet"];

/// One dimension per topic word, plus a constant.
struct TopicEmbedder;

#[async_trait]
impl Embedder for TopicEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding> {
        let lower = text.to_lowercase();
        let mut vector: Vec<f32> = TOPICS.iter().map(|t| lower.matches(t).count() as f32).collect();
        vector.push(0.1);
        Ok(Embedding::new(vector, "topics".to_string()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        let mut out = Vec::new();
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }

    fn model_id(&self) -> &str {
        "topics"
    }
}

struct FixedModel(&'static str);

#[async_trait]
impl LanguageModel for FixedModel {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        Ok(self.0.to_string())
    }
}

struct BrokenModel;

#[async_trait]
impl LanguageModel for BrokenModel {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        Err(Error::Generation("connection refused".to_string()))
    }
}

async fn spawn_forum() -> String {
    fn page(topic: &str, links: &str) -> Html<String> {
        let body = format!("Doctors discussed {} with members of the forum. ", topic).repeat(15);
        Html(format!("<html><body><main><p>{}</p>{}</main></body></html>", body, links))
    }

    let app = Router::new()
        .route(
            "/forums",
            get(|| async { page("fever", r#"<a href="/forums/sleep">Sleep</a><a href="/forums/diet">Diet</a>"#) }),
        )
        .route("/forums/sleep", get(|| async { page("sleep", r#"<a href="/forums">Back</a>"#) }))
        .route("/forums/diet", get(|| async { page("diet", "") }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/forums", addr)
}

fn test_settings() -> Settings {
    Settings {
        crawl_delay_ms: 0,
        fetch_timeout_secs: 5,
        ..Settings::default()
    }
}

fn service_with(storage: Arc<SqliteStorage>, chat_model: Arc<dyn LanguageModel>) -> DefaultRagService {
    DefaultRagService::new(
        storage,
        Arc::new(TopicEmbedder),
        chat_model,
        Arc::new(FixedModel(r#"{"title": "Forum discussion"}"#)),
        &test_settings(),
    )
    .unwrap()
}

#[tokio::test]
async fn test_crawl_then_ask() {
    let start = spawn_forum().await;
    let temp_dir = TempDir::new().unwrap();
    let storage = Arc::new(SqliteStorage::new(temp_dir.path().join("index.db")).unwrap());
    let service = service_with(storage, Arc::new(FixedModel("Drink plenty of fluids.")));

    assert!(service.stats().await.unwrap().is_none());

    let report = service.crawl(&start, 10).await.unwrap();
    assert_eq!(report.pages_processed, 3);
    assert_eq!(report.chunks_total, 3);

    let stats = service.stats().await.unwrap().unwrap();
    assert_eq!(stats.doc_count, 3);
    assert_eq!(stats.urls.len(), 3);
    assert_eq!(stats.domains.len(), 1);

    let answer = service.ask("What helps with a fever?", &[]).await.unwrap();
    assert!(answer.answer.starts_with("Drink plenty of fluids."));
    assert_eq!(answer.sources.len(), 3);
    assert_eq!(answer.sources[0].url, start);
    assert_eq!(answer.sources[0].title, "Forum discussion");

    let hits = service
        .search("sleep", SearchOptions { limit: 1, threshold: 0.0 })
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert!(hits[0].chunk_id.contains("/forums/sleep"));

    let all = service
        .search("fever", SearchOptions { limit: 50, threshold: 0.0 })
        .await
        .unwrap();
    assert_eq!(all.len(), 3);

    let capped = service
        .search("fever limit:2", SearchOptions { limit: 50, threshold: 0.0 })
        .await
        .unwrap();
    assert_eq!(capped.len(), 2);
}

#[tokio::test]
async fn test_recrawl_keeps_chunk_ids() {
    let start = spawn_forum().await;
    let storage = Arc::new(SqliteStorage::in_memory().unwrap());
    let service = service_with(storage, Arc::new(FixedModel("ok")));

    service.crawl(&start, 10).await.unwrap();
    let again = service.crawl(&start, 10).await.unwrap();
    assert_eq!(again.pages_processed, 3);
    assert_eq!(again.chunks_total, 3);
}

#[tokio::test]
async fn test_model_failure_becomes_error_answer() {
    let start = spawn_forum().await;
    let storage = Arc::new(SqliteStorage::in_memory().unwrap());
    let service = service_with(storage, Arc::new(BrokenModel));

    service.crawl(&start, 1).await.unwrap();
    let answer = service.ask("fever?", &[]).await.unwrap();

    assert!(answer.answer.starts_with("An error occurred while processing your question"));
    assert!(answer.answer.contains("connection refused"));
    assert!(answer.sources.is_empty());
}

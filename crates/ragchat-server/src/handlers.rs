use crate::models::{
    ChatRequest, CrawlRequest, CrawlResponse, CrawlStatus, SearchRequest, SearchResponse,
    StatsResponse,
};
use axum::body::Bytes;
use axum::{http::StatusCode, Extension, Json};
use ragchat_core::service::{RagService, SearchOptions};
use ragchat_core::Answer;
use std::sync::Arc;
use tokio::sync::RwLock;
use url::Url;

/// Upper bound on pages per crawl request.
pub const MAX_CRAWL_PAGES: usize = 200;

pub struct AppState {
    pub service: Arc<dyn RagService>,
    pub crawl_status: Arc<RwLock<CrawlStatus>>,
    /// Used when a crawl request names no URL
    pub default_url: String,
    pub default_max_pages: usize,
}

impl AppState {
    pub fn new(service: Arc<dyn RagService>, default_url: String, default_max_pages: usize) -> Self {
        Self {
            service,
            crawl_status: Arc::new(RwLock::new(CrawlStatus::Idle)),
            default_url,
            default_max_pages,
        }
    }
}

pub type SharedState = Arc<AppState>;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// An empty body asks for the defaults; anything else must be a valid request.
fn parse_crawl_request(body: &[u8]) -> Result<CrawlRequest, (StatusCode, String)> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(CrawlRequest::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("Invalid crawl request: {}", e)))
}

pub async fn crawl(
    Extension(state): Extension<SharedState>,
    body: Bytes,
) -> Result<(StatusCode, Json<CrawlResponse>), (StatusCode, String)> {
    let req = parse_crawl_request(&body)?;
    let url = req.url.unwrap_or_else(|| state.default_url.clone());
    let max_pages = req.max_pages.unwrap_or(state.default_max_pages);

    match Url::parse(&url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
        _ => return Err((StatusCode::BAD_REQUEST, format!("Invalid URL: {}", url))),
    }
    if !(1..=MAX_CRAWL_PAGES).contains(&max_pages) {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("max_pages must be between 1 and {}", MAX_CRAWL_PAGES),
        ));
    }

    {
        let mut status = state.crawl_status.write().await;
        if matches!(*status, CrawlStatus::Running { .. }) {
            return Err((StatusCode::CONFLICT, "A crawl is already running".to_string()));
        }
        *status = CrawlStatus::Running {
            url: url.clone(),
            max_pages,
        };
    }

    let service = Arc::clone(&state.service);
    let crawl_status = Arc::clone(&state.crawl_status);
    let task_url = url.clone();
    tokio::spawn(async move {
        let crawl_url = task_url.clone();
        let crawl = tokio::spawn(async move { service.crawl(&crawl_url, max_pages).await });

        let next = match crawl.await {
            Ok(Ok(report)) => CrawlStatus::Completed {
                url: task_url,
                pages_processed: report.pages_processed,
                chunks_total: report.chunks_total,
            },
            Ok(Err(e)) => {
                tracing::error!("Crawl of {} failed: {:#}", task_url, e);
                CrawlStatus::Failed {
                    url: task_url,
                    error: e.to_string(),
                }
            }
            Err(e) => {
                tracing::error!("Crawl task for {} did not finish: {}", task_url, e);
                CrawlStatus::Failed {
                    url: task_url,
                    error: format!("crawl task aborted: {}", e),
                }
            }
        };
        *crawl_status.write().await = next;
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(CrawlResponse {
            message: "Crawl started in background".to_string(),
            url,
            max_pages,
        }),
    ))
}

pub async fn crawl_status(Extension(state): Extension<SharedState>) -> Json<CrawlStatus> {
    Json(state.crawl_status.read().await.clone())
}

pub async fn stats(
    Extension(state): Extension<SharedState>,
) -> Result<Json<StatsResponse>, (StatusCode, String)> {
    let stats = state.service.stats().await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(StatsResponse { stats }))
}

pub async fn chat(
    Extension(state): Extension<SharedState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<Answer>, (StatusCode, String)> {
    let question = req.question.trim();
    if question.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Question must not be empty".to_string()));
    }

    let answer = state.service.ask(question, &req.history).await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(answer))
}

pub async fn search(
    Extension(state): Extension<SharedState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    let defaults = SearchOptions::default();
    let options = SearchOptions {
        limit: req.limit.unwrap_or(defaults.limit),
        threshold: req.threshold.unwrap_or(defaults.threshold),
    };

    let results = state.service.search(&req.query, options).await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(SearchResponse { results }))
}

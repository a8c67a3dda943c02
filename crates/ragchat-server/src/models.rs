use ragchat_core::service::SearchHit;
use ragchat_core::storage::CorpusStats;
use ragchat_core::ChatMessage;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub limit: Option<usize>,
    pub threshold: Option<f32>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchHit>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CrawlRequest {
    pub url: Option<String>,
    pub max_pages: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct CrawlResponse {
    pub message: String,
    pub url: String,
    pub max_pages: usize,
}

/// Progress of the background crawl.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum CrawlStatus {
    Idle,
    Running {
        url: String,
        max_pages: usize,
    },
    Completed {
        url: String,
        pages_processed: usize,
        chunks_total: usize,
    },
    Failed {
        url: String,
        error: String,
    },
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub question: String,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub stats: Option<CorpusStats>,
}

use crate::handlers::{chat, crawl, crawl_status, health, search, stats, AppState, SharedState};
use crate::service::DefaultRagService;
use anyhow::Result;
use axum::{
    routing::{get, post},
    Extension, Router,
};
use ragchat_core::service::RagService;
use ragchat_core::Settings;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// All API routes over `state`.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/crawl", post(crawl))
        .route("/api/v1/crawl/status", get(crawl_status))
        .route("/api/v1/stats", get(stats))
        .route("/api/v1/chat", post(chat))
        .route("/api/v1/search", post(search))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(Extension(state))
}

pub async fn start(settings: Settings, addr: SocketAddr) -> Result<()> {
    let service = Arc::new(DefaultRagService::from_settings(&settings)?) as Arc<dyn RagService>;
    let state = Arc::new(AppState::new(
        service,
        settings.target_url.clone(),
        settings.max_pages,
    ));

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("RagChat server listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

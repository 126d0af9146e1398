// src/server/mod.rs
// =============================================================================
// The HTTP API behind `crawl-keeper serve`.
//
// Submodules:
// - handlers: Request handlers and their JSON types
// - jobs: Background runner that executes submitted crawls
// =============================================================================

mod handlers;
mod jobs;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use handlers::AppState;
pub use jobs::JobRunner;

use crate::crawl::Coordinator;
use crate::storage::PageStore;

// Builds the API router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/crawl", post(handlers::start_crawl))
        .route("/pages", get(handlers::list_pages))
        .route("/pages/content", get(handlers::page_content))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// Serves the API until Ctrl-C
//
// Crawls still running at shutdown are abandoned; pages they already
// stored stay stored.
pub async fn serve(
    listen_addr: &str,
    coordinator: Arc<Coordinator>,
    store: Arc<dyn PageStore>,
    max_active_jobs: usize,
) -> Result<()> {
    let addr: SocketAddr = listen_addr
        .parse()
        .with_context(|| format!("Invalid listen address '{listen_addr}'"))?;

    let state = AppState {
        runner: JobRunner::new(coordinator, max_active_jobs),
        store,
    };

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("HTTP API listening on http://{}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await
        .context("HTTP server error")?;

    Ok(())
}

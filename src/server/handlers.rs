// src/server/handlers.rs
// =============================================================================
// HTTP handlers for the crawl trigger and the page queries.
//
//   POST /crawl            start a crawl in the background (202)
//   GET  /pages?q=...      list stored pages, optionally filtered
//   GET  /pages/content    full page by exact URL (404 when absent)
//   GET  /health           liveness + free job slots
// =============================================================================

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::jobs::JobRunner;
use crate::crawl::CrawlJob;
use crate::storage::{PageStore, StoreError};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub runner: JobRunner,
    pub store: Arc<dyn PageStore>,
}

/// Body of `POST /crawl`
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlRequest {
    pub url: String,
    #[serde(default)]
    pub max_depth: usize,
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

fn default_max_concurrency() -> usize {
    5
}

#[derive(Debug, Serialize)]
pub struct CrawlAccepted {
    pub status: &'static str,
    pub job_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ContentParams {
    pub url: String,
}

/// Full page as returned by `/pages/content`
#[derive(Debug, Serialize)]
pub struct PageContent {
    pub url: String,
    pub title: Option<String>,
    pub html: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

fn error_response(status: StatusCode, detail: impl Into<String>) -> Response {
    (status, Json(ErrorBody { detail: detail.into() })).into_response()
}

fn storage_failure(err: StoreError) -> Response {
    error!(error = %err, "storage query failed");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "storage unavailable")
}

// Validates the request and hands it to the job runner
//
// Malformed bodies get the same 422 {"detail"} shape as invalid values
pub async fn start_crawl(
    State(state): State<AppState>,
    payload: Result<Json<CrawlRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return error_response(StatusCode::UNPROCESSABLE_ENTITY, rejection.body_text()),
    };

    let job = match CrawlJob::new(&request.url, request.max_depth, request.max_concurrency) {
        Ok(job) => job,
        Err(err) => return error_response(StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
    };

    let job_id = state.runner.submit(job);
    debug!(%job_id, url = %request.url, "crawl accepted");

    (
        StatusCode::ACCEPTED,
        Json(CrawlAccepted {
            status: "crawl started",
            job_id: job_id.to_string(),
        }),
    )
        .into_response()
}

pub async fn list_pages(State(state): State<AppState>, Query(params): Query<ListParams>) -> Response {
    match state.store.list(params.q.as_deref()).await {
        Ok(pages) => Json(pages).into_response(),
        Err(err) => storage_failure(err),
    }
}

pub async fn page_content(State(state): State<AppState>, Query(params): Query<ContentParams>) -> Response {
    match state.store.get(&params.url).await {
        Ok(Some(page)) => Json(PageContent {
            url: page.url,
            title: page.title,
            html: page.html,
        })
        .into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "Page not found"),
        Err(err) => storage_failure(err),
    }
}

pub async fn health(State(state): State<AppState>) -> Response {
    Json(serde_json::json!({
        "status": "ok",
        "free_job_slots": state.runner.free_slots(),
    }))
    .into_response()
}

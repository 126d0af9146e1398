// src/storage/mod.rs
// =============================================================================
// Durable storage for crawled pages.
//
// The crawler itself needs exactly one operation: "insert this page unless
// its URL is already stored". The query side (CLI `pages`/`page`, HTTP
// `/pages`) only reads.
//
// Submodules:
// - sqlite: The SQLite-backed implementation
// =============================================================================

mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use sqlite::SqliteStore;

/// A stored page, keyed by its canonical URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    pub url: String,
    pub title: Option<String>,
    pub html: String,
    pub fetched_at: DateTime<Utc>,
}

impl PageRecord {
    pub fn new(url: String, title: Option<String>, html: String) -> Self {
        Self {
            url,
            title,
            html,
            fetched_at: Utc::now(),
        }
    }
}

/// List-view row: just enough to pick a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSummary {
    pub url: String,
    pub title: Option<String>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("storage lock poisoned")]
    Poisoned,
}

/// Page storage used by the persistence relay and the query interfaces
#[async_trait]
pub trait PageStore: Send + Sync {
    /// Stores `record` if no page with the same URL exists.
    ///
    /// Returns `true` when the record was written and `false` when an
    /// earlier write already owns the key (the existing row is untouched).
    async fn insert_if_absent(&self, record: &PageRecord) -> Result<bool, StoreError>;

    /// Lists pages ordered by URL, optionally keeping only those whose URL
    /// or title contains `filter` (case-insensitive).
    async fn list(&self, filter: Option<&str>) -> Result<Vec<PageSummary>, StoreError>;

    /// Looks up a page by exact URL
    async fn get(&self, url: &str) -> Result<Option<PageRecord>, StoreError>;

    async fn count(&self) -> Result<usize, StoreError>;
}

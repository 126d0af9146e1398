// src/crawl/events.rs
// =============================================================================
// Observability for a crawl.
//
// The coordinator is handed a CrawlEvents sink instead of logging through
// some global it discovers on its own. The default sink, TracingEvents,
// turns every event into a structured tracing event; tests plug in a
// recorder to check what happened.
//
// CrawlStats counts the same events with atomics so the final CrawlReport
// doesn't depend on which sink was installed.
// =============================================================================

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::CrawlJob;
use crate::fetcher::FetchError;
use crate::storage::StoreError;

/// Receives progress events from a running crawl
///
/// Called from worker tasks and the storage writer concurrently.
pub trait CrawlEvents: Send + Sync {
    fn crawl_started(&self, job: &CrawlJob);
    fn page_fetched(&self, url: &str, depth: usize, links: usize);
    fn fetch_failed(&self, url: &str, depth: usize, error: &FetchError);
    /// `inserted` is false when the URL was already stored
    fn page_stored(&self, url: &str, inserted: bool);
    fn store_failed(&self, url: &str, error: &StoreError);
    fn crawl_finished(&self, report: &CrawlReport);
}

/// Emits crawl events as tracing events
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEvents;

impl CrawlEvents for TracingEvents {
    fn crawl_started(&self, job: &CrawlJob) {
        info!(
            seed = %job.seed(),
            max_depth = job.max_depth(),
            max_concurrency = job.max_concurrency(),
            "crawl started"
        );
    }

    fn page_fetched(&self, url: &str, depth: usize, links: usize) {
        info!(url, depth, links, "fetched");
    }

    fn fetch_failed(&self, url: &str, depth: usize, error: &FetchError) {
        warn!(url, depth, error = %error, "fetch failed, skipping");
    }

    fn page_stored(&self, url: &str, inserted: bool) {
        if inserted {
            debug!(url, "stored");
        } else {
            debug!(url, "already stored, write ignored");
        }
    }

    fn store_failed(&self, url: &str, error: &StoreError) {
        error!(url, error = %error, "failed to store page");
    }

    fn crawl_finished(&self, report: &CrawlReport) {
        info!(
            seed = %report.seed,
            pages = report.pages_visited,
            fetched = report.pages_fetched,
            failed = report.fetch_failures,
            stored = report.pages_stored,
            elapsed_ms = report.elapsed_ms,
            "crawl finished"
        );
    }
}

/// Counters shared by the workers and the storage writer
#[derive(Debug, Default)]
pub struct CrawlStats {
    fetched: AtomicUsize,
    fetch_failures: AtomicUsize,
    stored: AtomicUsize,
    duplicate_writes: AtomicUsize,
    store_failures: AtomicUsize,
}

impl CrawlStats {
    pub fn record_fetch(&self) {
        self.fetched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fetch_failure(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_write(&self, inserted: bool) {
        let counter = if inserted { &self.stored } else { &self.duplicate_writes };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_store_failure(&self) {
        self.store_failures.fetch_add(1, Ordering::Relaxed);
    }

    // Read once every worker and the writer have stopped
    pub fn report(&self, seed: String, pages_visited: usize, elapsed: Duration) -> CrawlReport {
        CrawlReport {
            seed,
            pages_visited,
            pages_fetched: self.fetched.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            pages_stored: self.stored.load(Ordering::Relaxed),
            duplicate_writes: self.duplicate_writes.load(Ordering::Relaxed),
            store_failures: self.store_failures.load(Ordering::Relaxed),
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }
}

/// Summary of a finished crawl
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlReport {
    pub seed: String,
    /// Distinct URLs claimed (fetched or failed)
    pub pages_visited: usize,
    pub pages_fetched: usize,
    pub fetch_failures: usize,
    /// New rows written to storage
    pub pages_stored: usize,
    /// Writes ignored because the URL was already stored (e.g. an earlier crawl)
    pub duplicate_writes: usize,
    pub store_failures: usize,
    pub elapsed_ms: u64,
}

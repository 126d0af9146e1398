// src/crawl/testing.rs
// =============================================================================
// Test doubles for the crawl engine: a fetcher that serves pages from a map
// instead of the network, and an event sink that remembers what it saw.
// =============================================================================

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use super::events::{CrawlEvents, CrawlReport};
use super::CrawlJob;
use crate::fetcher::{parse_page, FetchError, FetchedPage, PageFetcher};
use crate::storage::StoreError;

/// Serves HTML from a map; unknown URLs fail like a dead host
#[derive(Default)]
pub struct ScriptedFetcher {
    pages: HashMap<String, String>,
    delay: Duration,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    // Makes every fetch take a while so workers actually overlap
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    // Most fetches that were ever running at the same moment
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(running, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let html = self
            .pages
            .get(url)
            .ok_or_else(|| FetchError::Other(format!("connection refused: {url}")))?;
        let page_url = Url::parse(url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        let parsed = parse_page(html, &page_url);

        Ok(FetchedPage {
            title: parsed.title,
            html: html.clone(),
            links: parsed.links,
        })
    }
}

/// Remembers events in arrival order
#[derive(Default)]
pub struct RecordingEvents {
    pub log: Mutex<Vec<String>>,
    pub finished: Mutex<Option<CrawlReport>>,
}

impl RecordingEvents {
    pub fn lines(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn push(&self, line: String) {
        self.log.lock().unwrap().push(line);
    }
}

impl CrawlEvents for RecordingEvents {
    fn crawl_started(&self, job: &CrawlJob) {
        self.push(format!("started {}", job.seed()));
    }

    fn page_fetched(&self, url: &str, depth: usize, _links: usize) {
        self.push(format!("fetched {url} {depth}"));
    }

    fn fetch_failed(&self, url: &str, depth: usize, _error: &FetchError) {
        self.push(format!("failed {url} {depth}"));
    }

    fn page_stored(&self, url: &str, inserted: bool) {
        self.push(format!("stored {url} {inserted}"));
    }

    fn store_failed(&self, url: &str, _error: &StoreError) {
        self.push(format!("store-failed {url}"));
    }

    fn crawl_finished(&self, report: &CrawlReport) {
        *self.finished.lock().unwrap() = Some(report.clone());
        self.push("finished".to_string());
    }
}

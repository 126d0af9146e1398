// src/crawl/relay.rs
// =============================================================================
// The persistence relay: a channel between the workers and one storage writer.
//
// Workers hand over fetched pages and go straight back to fetching; only the
// writer task ever touches storage. The channel is bounded, so if storage
// falls far behind, workers pause briefly on send instead of piling up
// pages in memory.
//
// Shutdown is implicit: the writer runs until every sender has been
// dropped AND the channel is empty. Once the coordinator has waited for all
// workers (each owning a sender), awaiting the writer therefore flushes
// every page that was handed over.
// =============================================================================

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, Instrument};

use super::events::{CrawlEvents, CrawlStats};
use crate::storage::{PageRecord, PageStore};

#[derive(Debug, Error)]
#[error("storage writer stopped, page for {0} was not handed over")]
pub struct RelayClosed(pub String);

/// Sending half, one clone per worker
#[derive(Clone)]
pub struct PageRelay {
    tx: mpsc::Sender<PageRecord>,
}

impl PageRelay {
    // Hands a page to the writer, waiting only if the channel is full
    pub async fn send(&self, record: PageRecord) -> Result<(), RelayClosed> {
        self.tx
            .send(record)
            .await
            .map_err(|err| RelayClosed(err.0.url))
    }
}

// Creates the relay and starts its writer
//
// Returns the sending half and the writer's handle. The writer finishes
// once every PageRelay clone is gone and the backlog is written.
pub fn start(
    capacity: usize,
    store: Arc<dyn PageStore>,
    events: Arc<dyn CrawlEvents>,
    stats: Arc<CrawlStats>,
) -> (PageRelay, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(capacity);

    let writer = tokio::spawn(run_writer(rx, store, events, stats).in_current_span());

    (PageRelay { tx }, writer)
}

// Writes pages one at a time until the channel is closed and empty
async fn run_writer(
    mut rx: mpsc::Receiver<PageRecord>,
    store: Arc<dyn PageStore>,
    events: Arc<dyn CrawlEvents>,
    stats: Arc<CrawlStats>,
) {
    let mut written = 0usize;

    while let Some(record) = rx.recv().await {
        match store.insert_if_absent(&record).await {
            Ok(inserted) => {
                stats.record_write(inserted);
                events.page_stored(&record.url, inserted);
            }
            Err(err) => {
                stats.record_store_failure();
                events.store_failed(&record.url, &err);
            }
        }
        written += 1;
    }

    debug!(records = written, "storage writer drained");
}

// src/crawl/worker.rs
// =============================================================================
// The worker pool: `max_concurrency` tasks draining the frontier.
//
// Each worker loops:
// 1. Wait for the next unclaimed entry (Frontier::next)
// 2. Fetch it
// 3. On success: queue same-site links at depth + 1 (only while the
//    entry is shallower than max depth), then hand the page to the relay
// 4. On failure: report it and move on; nothing is queued or stored
//
// Because at most `max_concurrency` workers exist and each fetches one page
// at a time, the number of requests in flight never exceeds that bound.
// =============================================================================

use std::sync::Arc;

use futures::future::join_all;
use tokio::task::JoinHandle;
use tracing::{debug, error, Instrument};

use super::events::{CrawlEvents, CrawlStats};
use super::frontier::Frontier;
use super::relay::PageRelay;
use super::{CrawlError, CrawlJob};
use crate::fetcher::PageFetcher;
use crate::storage::PageRecord;

/// Everything the workers of one crawl share
pub struct WorkerContext {
    pub job: CrawlJob,
    pub frontier: Arc<Frontier>,
    pub fetcher: Arc<dyn PageFetcher>,
    pub events: Arc<dyn CrawlEvents>,
    pub stats: Arc<CrawlStats>,
}

// Starts the pool and waits until every worker has exited
//
// Takes the relay by value: each worker gets its own clone and the original
// is dropped here, so once this returns no sender is left.
pub async fn run_pool(context: Arc<WorkerContext>, relay: PageRelay) -> Result<(), CrawlError> {
    let handles: Vec<JoinHandle<()>> = (0..context.job.max_concurrency())
        .map(|id| {
            let context = Arc::clone(&context);
            let relay = relay.clone();
            tokio::spawn(run_worker(id, context, relay).in_current_span())
        })
        .collect();
    drop(relay);

    let mut first_failure = None;
    for result in join_all(handles).await {
        if let Err(err) = result {
            error!(error = %err, "worker task failed");
            first_failure.get_or_insert(err);
        }
    }

    match first_failure {
        Some(err) => Err(CrawlError::Worker(err)),
        None => Ok(()),
    }
}

async fn run_worker(id: usize, context: Arc<WorkerContext>, relay: PageRelay) {
    let WorkerContext {
        job,
        frontier,
        fetcher,
        events,
        stats,
    } = context.as_ref();

    let mut handled = 0usize;

    while let Some(claim) = frontier.next().await {
        let entry = claim.entry();
        handled += 1;

        let page = match fetcher.fetch(&entry.url).await {
            Ok(page) => page,
            Err(err) => {
                stats.record_fetch_failure();
                events.fetch_failed(&entry.url, entry.depth, &err);
                continue;
            }
        };

        stats.record_fetch();
        events.page_fetched(&entry.url, entry.depth, page.links.len());

        // Children are queued while we still hold the claim, so no other
        // worker can decide the crawl is over in the meantime
        if entry.depth < job.max_depth() {
            for link in page.links {
                if job.is_same_site(&link) {
                    frontier.push(link, entry.depth + 1);
                }
            }
        }

        let record = PageRecord::new(entry.url.clone(), page.title, page.html);
        if let Err(err) = relay.send(record).await {
            error!(worker = id, error = %err, "page dropped");
        }
    }

    debug!(worker = id, pages = handled, "worker finished");
}

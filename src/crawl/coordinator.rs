// src/crawl/coordinator.rs
// =============================================================================
// Runs one crawl job from start to finish.
//
//   Seeding  -> queue the seed, start the storage writer
//   Running  -> start the workers, wait for every one of them to exit
//   Draining -> the last relay sender is gone; wait for the writer to
//               store everything it was handed
//   Done     -> report
//
// The phases only move forward and each job goes through them once.
// Draining always happens, even when a worker task died, so pages that
// were already fetched still reach storage.
// =============================================================================

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info_span, Instrument};

use super::events::{CrawlEvents, CrawlReport, CrawlStats};
use super::frontier::Frontier;
use super::worker::{self, WorkerContext};
use super::{relay, CrawlError, CrawlJob};
use crate::fetcher::PageFetcher;
use crate::storage::PageStore;

const DEFAULT_RELAY_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlPhase {
    Seeding,
    Running,
    Draining,
    Done,
}

/// Owns the collaborators a crawl needs; cheap to share between jobs
pub struct Coordinator {
    fetcher: Arc<dyn PageFetcher>,
    store: Arc<dyn PageStore>,
    events: Arc<dyn CrawlEvents>,
    relay_capacity: usize,
}

impl Coordinator {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        store: Arc<dyn PageStore>,
        events: Arc<dyn CrawlEvents>,
    ) -> Self {
        Self {
            fetcher,
            store,
            events,
            relay_capacity: DEFAULT_RELAY_CAPACITY,
        }
    }

    pub fn with_relay_capacity(mut self, capacity: usize) -> Self {
        self.relay_capacity = capacity.max(1);
        self
    }

    // Crawls until the frontier is exhausted and every fetched page is stored
    //
    // Fetch and storage problems are reported through the events sink and
    // counted in the report. An Err means a worker or the writer task
    // itself died.
    pub async fn run(&self, job: CrawlJob) -> Result<CrawlReport, CrawlError> {
        let span = info_span!("crawl", seed = %job.seed());
        self.run_phases(job).instrument(span).await
    }

    async fn run_phases(&self, job: CrawlJob) -> Result<CrawlReport, CrawlError> {
        let started = Instant::now();
        let mut phase = CrawlPhase::Seeding;
        debug!(?phase);

        self.events.crawl_started(&job);
        let seed = job.seed().to_string();
        let stats = Arc::new(CrawlStats::default());

        let frontier = Arc::new(Frontier::new(job.max_depth()));
        frontier.seed(&seed);

        let (page_relay, writer) = relay::start(
            self.relay_capacity,
            Arc::clone(&self.store),
            Arc::clone(&self.events),
            Arc::clone(&stats),
        );

        phase = advance(phase, CrawlPhase::Running);
        let context = Arc::new(WorkerContext {
            job,
            frontier: Arc::clone(&frontier),
            fetcher: Arc::clone(&self.fetcher),
            events: Arc::clone(&self.events),
            stats: Arc::clone(&stats),
        });
        let workers = worker::run_pool(context, page_relay).await;

        phase = advance(phase, CrawlPhase::Draining);
        let writer = writer.await.map_err(CrawlError::Writer);

        advance(phase, CrawlPhase::Done);
        workers?;
        writer?;

        let report = stats.report(seed, frontier.claimed_count(), started.elapsed());
        self.events.crawl_finished(&report);
        Ok(report)
    }
}

fn advance(from: CrawlPhase, to: CrawlPhase) -> CrawlPhase {
    debug!(?from, ?to, "crawl phase");
    to
}

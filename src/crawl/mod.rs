// src/crawl/mod.rs
// =============================================================================
// This module is the crawl engine.
//
// Features:
// - Breadth-first crawling from a seed URL, bounded by depth
// - Same-site restriction (never fetches another host)
// - A fixed number of concurrent workers
// - Every page fetched at most once per crawl, stored at most once ever
// - Storage writes happen on their own task, off the fetch path
//
// Submodules:
// - job: A validated crawl request
// - frontier: Work queue + claim set shared by the workers
// - worker: The worker pool
// - relay: Channel from the workers to the single storage writer
// - coordinator: Runs a job through Seeding -> Running -> Draining -> Done
// - events: Observability sink and crawl statistics
// =============================================================================

mod coordinator;
mod events;
mod frontier;
mod job;
mod relay;
mod worker;

#[cfg(test)]
pub(crate) mod testing;

use thiserror::Error;
use tokio::task::JoinError;

pub use coordinator::{Coordinator, CrawlPhase};
pub use events::{CrawlEvents, CrawlReport, CrawlStats, TracingEvents};
pub use frontier::{Claim, Frontier, FrontierEntry};
pub use job::CrawlJob;

#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("invalid crawl request: {0}")]
    InvalidJob(String),

    #[error("crawl worker failed: {0}")]
    Worker(#[source] JoinError),

    #[error("storage writer failed: {0}")]
    Writer(#[source] JoinError),
}

// src/server/jobs.rs
// =============================================================================
// Background runner for crawl jobs submitted over HTTP.
//
// Submitting returns as soon as the job has an ID. The crawl itself runs on
// its own task and waits for one of `max_active_jobs` permits first, so a
// burst of requests queues up instead of starting unbounded crawls. Nothing
// flows back to the submitter: outcomes show up in the logs and in storage.
// =============================================================================

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use crate::crawl::{Coordinator, CrawlJob};

#[derive(Clone)]
pub struct JobRunner {
    coordinator: Arc<Coordinator>,
    permits: Arc<Semaphore>,
}

impl JobRunner {
    pub fn new(coordinator: Arc<Coordinator>, max_active_jobs: usize) -> Self {
        Self {
            coordinator,
            permits: Arc::new(Semaphore::new(max_active_jobs.max(1))),
        }
    }

    // Schedules a crawl and returns its ID without waiting for it
    pub fn submit(&self, job: CrawlJob) -> Uuid {
        let job_id = Uuid::new_v4();
        let coordinator = Arc::clone(&self.coordinator);
        let permits = Arc::clone(&self.permits);
        let span = info_span!("job", id = %job_id);

        tokio::spawn(
            async move {
                let _permit = match permits.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        error!("job runner closed, crawl not started");
                        return;
                    }
                };

                match coordinator.run(job).await {
                    Ok(report) => info!(pages = report.pages_visited, "job complete"),
                    Err(err) => error!(error = %err, "job aborted"),
                }
            }
            .instrument(span),
        );

        job_id
    }

    // Jobs that could start right now without waiting
    pub fn free_slots(&self) -> usize {
        self.permits.available_permits()
    }
}

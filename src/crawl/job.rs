// src/crawl/job.rs
// =============================================================================
// One crawl request: where to start, how deep to go, how many pages to
// fetch at once.
//
// A CrawlJob is validated when it is created, so everything downstream can
// rely on: the seed is an absolute http(s) URL with a host, and at least one
// worker will run.
// =============================================================================

use url::Url;

use super::CrawlError;
use crate::fetcher::canonicalize_url;

/// A validated crawl request
#[derive(Debug, Clone)]
pub struct CrawlJob {
    seed: Url,
    max_depth: usize,
    max_concurrency: usize,
}

impl CrawlJob {
    // Validates a crawl request
    //
    // Parameters:
    //   seed: starting URL (its fragment is dropped)
    //   max_depth: link hops to follow from the seed (0 = seed only)
    //   max_concurrency: pages fetched at the same time (at least 1)
    pub fn new(seed: &str, max_depth: usize, max_concurrency: usize) -> Result<Self, CrawlError> {
        let parsed = Url::parse(seed.trim())
            .map_err(|e| CrawlError::InvalidJob(format!("invalid seed URL '{seed}': {e}")))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(CrawlError::InvalidJob(format!(
                "seed URL must use http or https: {seed}"
            )));
        }

        if parsed.host_str().is_none() {
            return Err(CrawlError::InvalidJob(format!("seed URL has no host: {seed}")));
        }

        if max_concurrency == 0 {
            return Err(CrawlError::InvalidJob(
                "max concurrency must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            seed: canonicalize_url(parsed),
            max_depth,
            max_concurrency,
        })
    }

    pub fn seed(&self) -> &Url {
        &self.seed
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    // Checks whether a discovered link stays on the seed's site
    //
    // Host and explicit port must both match exactly: "www.a.test" and
    // "blog.a.test" are different sites from "a.test", and so is
    // "a.test:8080". The scheme is not compared, so an http seed still
    // follows its https links.
    pub fn is_same_site(&self, link: &str) -> bool {
        match Url::parse(link) {
            Ok(link) => {
                link.host_str() == self.seed.host_str()
                    && link.port() == self.seed.port()
            }
            Err(_) => false,
        }
    }
}

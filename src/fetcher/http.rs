// src/fetcher/http.rs
// =============================================================================
// This module fetches pages over HTTP.
//
// Key functionality:
// - One shared reqwest Client (connection pooling across all workers)
// - Follows redirects up to a configured limit, but only on the same host
//   and port; a hop to another host stops there and the 3xx is an error
// - Every request carries its own timeout, so one slow page never
//   holds up the others
// - Non-2xx responses are errors: the crawler only stores real pages
//
// Rust concepts:
// - Traits: HttpFetcher implements the PageFetcher trait
// - async/await: Network I/O without blocking other workers
// - Error mapping: turning reqwest errors into our own FetchError
// =============================================================================

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{redirect, Client};
use tracing::debug;
use url::Url;

use super::html::parse_page;
use super::{FetchError, FetchedPage, PageFetcher};
use crate::config::CrawlerSettings;

/// Fetches pages with a shared reqwest client
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpFetcher {
    // Builds a fetcher from the crawler settings in the config file
    pub fn from_settings(settings: &CrawlerSettings) -> Result<Self, FetchError> {
        Self::new(
            &settings.user_agent,
            Duration::from_secs(settings.request_timeout_secs),
            settings.max_redirects,
        )
    }

    // Builds a fetcher
    //
    // Parameters:
    //   user_agent: sent with every request
    //   timeout: per-request limit covering connect, headers and body
    //   max_redirects: how many hops to follow before giving up
    pub fn new(user_agent: &str, timeout: Duration, max_redirects: usize) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .redirect(same_host_redirects(max_redirects))
            .build()
            .map_err(FetchError::Request)?;

        Ok(Self { client, timeout })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let request_url = Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{url}: {e}")))?;

        let response = self
            .client
            .get(request_url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(categorize_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        // Links are relative to where we ended up, not where we started
        let final_url = response.url().clone();
        if final_url.as_str() != url {
            debug!(from = url, to = %final_url, "followed redirect");
        }

        let html = response.text().await.map_err(categorize_error)?;
        let parsed = parse_page(&html, &final_url);

        Ok(FetchedPage {
            title: parsed.title,
            html,
            links: parsed.links,
        })
    }
}

// Like Policy::limited, except a hop that leaves the original host or port
// is not followed: reqwest hands back the redirect response itself
fn same_host_redirects(max_redirects: usize) -> redirect::Policy {
    redirect::Policy::custom(move |attempt| {
        if attempt.previous().len() > max_redirects {
            return attempt.error("too many redirects");
        }

        let same_host = attempt.previous().first().map_or(true, |origin| {
            origin.host_str() == attempt.url().host_str() && origin.port() == attempt.url().port()
        });

        if same_host {
            attempt.follow()
        } else {
            debug!(to = %attempt.url(), "not following off-host redirect");
            attempt.stop()
        }
    })
}

// Timeouts get their own variant, everything else keeps the reqwest error
fn categorize_error(error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Request(error)
    }
}

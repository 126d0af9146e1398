// src/fetcher/mod.rs
// =============================================================================
// This module is the crawler's view of the web: "give me a URL, get back
// the title, the raw markup and the links on that page".
//
// Submodules:
// - canonical: Normalizes URLs into deduplication keys
// - html: Extracts the title and candidate links from a page
// - http: Fetches pages over the network with reqwest
//
// The crawl engine only talks to the PageFetcher trait, so tests can swap
// the network for a scripted set of pages.
// =============================================================================

mod canonical;
mod html;
mod http;

use async_trait::async_trait;
use thiserror::Error;

pub use canonical::{canonicalize, canonicalize_url};
pub use html::{parse_page, ParsedPage};
pub use http::HttpFetcher;

/// Outcome of successfully fetching one page
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedPage {
    /// First non-empty <title>, trimmed
    pub title: Option<String>,
    /// The response body exactly as received
    pub html: String,
    /// Canonical http(s) links found on the page, in document order
    pub links: Vec<String>,
}

/// Why a page could not be fetched
///
/// None of these abort a crawl: the URL is logged and skipped.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    /// Failure reported by a fetcher that doesn't go through reqwest.
    /// HttpFetcher never builds it; in-memory test fetchers do.
    #[error("{0}")]
    Other(String),
}

/// Capability to retrieve and parse a page
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches a canonical URL, following redirects
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError>;
}

// src/fetcher/canonical.rs
// =============================================================================
// This module turns URLs into stable comparison keys.
//
// Two addresses that differ only by their fragment (the part after '#')
// point at the same document, so they must collapse to one crawl entry:
//   https://example.com/docs#intro  ->  https://example.com/docs
//   https://example.com/docs#usage  ->  https://example.com/docs
//
// Everything else (scheme, host, port, path, query) is kept. The url crate
// applies standard WHATWG normalization while parsing (lowercase scheme and
// host, "/" for an empty path), which is itself idempotent.
//
// Rust concepts:
// - Pattern matching on Result to fall back instead of failing
// - String slicing with split_once
// =============================================================================

use url::Url;

// Canonicalizes a URL string
//
// Never fails: input the url crate cannot parse is returned with everything
// from the first '#' removed, so callers can always use the result as a key.
pub fn canonicalize(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(url) => canonicalize_url(url).to_string(),
        Err(_) => match raw.split_once('#') {
            Some((before, _)) => before.to_string(),
            None => raw.to_string(),
        },
    }
}

// Same as canonicalize() for an already-parsed URL
pub fn canonicalize_url(mut url: Url) -> Url {
    url.set_fragment(None);
    url
}

// src/fetcher/html.rs
// =============================================================================
// This module pulls the two things the crawler needs out of an HTML page:
// - the page title
// - the outbound links that are worth visiting
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (Document Object Model)
// - Supports CSS selectors for finding elements
// - Never fails: broken markup still produces a (best-effort) document
//
// Link filtering policy, in order:
// 1. Resolve the href against the page's own URL (relative -> absolute)
// 2. Canonicalize it (drop the #fragment)
// 3. Keep only http/https (drops mailto:, tel:, javascript:, data:, ...)
// 4. Drop paths ending in a static-asset extension (images, archives, ...)
//
// Domain restriction is NOT applied here. The fetcher reports every
// candidate; the worker pool decides what stays on the seed's site.
// =============================================================================

use scraper::{Html, Selector};
use url::Url;

use super::canonical::canonicalize_url;

// File extensions that never point at an HTML page
const ASSET_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "svg", "webp", "ico", "bmp", // images
    "pdf", // documents
    "zip", "rar", "gz", "tar", "7z", // archives
    "css", "js", // stylesheets and scripts
];

// Parsed view of one HTML document
pub struct ParsedPage {
    pub title: Option<String>,
    pub links: Vec<String>,
}

// Parses a page body and extracts its title and candidate links
//
// Parameters:
//   html: the raw response body
//   page_url: the URL the body was served from (after redirects)
pub fn parse_page(html: &str, page_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        title: extract_title(&document),
        links: extract_links(&document, page_url),
    }
}

// Returns the first <title> with non-whitespace text, trimmed
fn extract_title(document: &Html) -> Option<String> {
    // Selector::parse only fails on invalid CSS, and this selector is a constant
    let selector = Selector::parse("title").expect("static title selector");

    document
        .select(&selector)
        .map(|element| element.text().collect::<String>())
        .map(|text| text.trim().to_string())
        .find(|text| !text.is_empty())
}

// Collects the candidate outbound links, in document order
fn extract_links(document: &Html, page_url: &Url) -> Vec<String> {
    let selector = Selector::parse("a[href]").expect("static anchor selector");

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_candidate(page_url, href))
        .collect()
}

// Applies the filtering policy to a single href
//
// Returns None for anything that should not be crawled. Unresolvable hrefs
// are dropped silently.
fn resolve_candidate(base: &Url, href: &str) -> Option<String> {
    let absolute = base.join(href.trim()).ok()?;
    let link = canonicalize_url(absolute);

    if !matches!(link.scheme(), "http" | "https") {
        return None;
    }

    if has_asset_extension(link.path()) {
        return None;
    }

    Some(link.to_string())
}

// Checks whether a URL path ends in one of the denylisted extensions
fn has_asset_extension(path: &str) -> bool {
    let last_segment = path.rsplit('/').next().unwrap_or("");

    match last_segment.rsplit_once('.') {
        Some((_, extension)) => {
            let extension = extension.to_ascii_lowercase();
            ASSET_EXTENSIONS.contains(&extension.as_str())
        }
        None => false,
    }
}

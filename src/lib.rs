// src/lib.rs
// =============================================================================
// crawl-keeper as a library.
//
// The binary in main.rs is a thin shell over these modules, so tests and
// other programs can drive a crawl without going through the CLI.
//
// Modules:
// - config: Settings file (timeouts, user agent, API address)
// - logging: tracing subscriber setup
// - fetcher: URL canonicalization, HTML parsing, the HTTP page fetcher
// - storage: The page store trait and its SQLite implementation
// - crawl: Frontier, workers, storage relay and the crawl coordinator
// - server: HTTP API for starting crawls and querying pages
// =============================================================================

pub mod config;
pub mod crawl;
pub mod fetcher;
pub mod logging;
pub mod server;
pub mod storage;

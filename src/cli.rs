// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Subcommands:
// - crawl: Crawl a site from a seed URL and store every page found
// - pages: List stored pages, optionally filtered
// - page:  Show one stored page by URL
// - serve: Run the HTTP API
//
// The database path, config file and verbosity are global, so they can be
// given before or after the subcommand.
// =============================================================================

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "crawl-keeper",
    version,
    about = "Crawl a website within its own domain and keep every page it visits",
    long_about = "crawl-keeper walks a site breadth-first from a seed URL, never leaving the seed's host, \
                  and stores each page it visits exactly once. Stored pages can be queried from the CLI \
                  or over HTTP."
)]
pub struct Cli {
    /// SQLite database holding the crawled pages
    #[arg(long, env = "CRAWL_KEEPER_DB", default_value = "crawl-keeper.db", global = true)]
    pub db: PathBuf,

    /// JSON settings file (timeouts, user agent, API address)
    #[arg(long, env = "CRAWL_KEEPER_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Log debug output for the crawler
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl a website starting from SEED
    ///
    /// Example: crawl-keeper crawl https://example.com --max-depth 2
    Crawl {
        /// Seed URL (http or https)
        seed: String,

        /// How many link hops from the seed to follow
        ///
        /// 0 = just the seed, 1 = the seed and the pages it links to, etc.
        #[arg(long, default_value_t = 0)]
        max_depth: usize,

        /// Pages fetched at the same time
        #[arg(long, default_value_t = 5)]
        max_concurrency: usize,

        /// Print the crawl report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List stored pages
    ///
    /// Example: crawl-keeper pages --query docs
    Pages {
        /// Only pages whose URL or title contains this text
        #[arg(short, long)]
        query: Option<String>,

        /// Output JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show a stored page
    Page {
        /// Exact URL of the page, as listed by `pages`
        url: String,

        /// Output JSON (including the HTML) instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Run the HTTP API
    ///
    /// Example: crawl-keeper serve --listen 0.0.0.0:8000
    Serve {
        /// Address to listen on (overrides the settings file)
        #[arg(long)]
        listen: Option<String>,
    },
}

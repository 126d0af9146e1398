// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging and load the settings file
// 3. Open the page store and dispatch to the subcommand handler
// 4. Exit with proper code (0 = success, 1 = page not found, 2 = error)
// =============================================================================

mod cli;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use cli::{Cli, Commands};
use crawl_keeper::config::Settings;
use crawl_keeper::crawl::{Coordinator, CrawlJob, CrawlReport, TracingEvents};
use crawl_keeper::fetcher::HttpFetcher;
use crawl_keeper::logging::init_logging;
use crawl_keeper::server;
use crawl_keeper::storage::{PageStore, PageSummary, SqliteStore};

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Returns:
//   Ok(0) = success
//   Ok(1) = the requested page is not stored
//   Err   = anything else (exit code 2)
async fn run() -> Result<i32> {
    let cli = Cli::parse();

    init_logging(cli.verbose)?;
    let settings = Settings::load(cli.config.as_deref())?;
    let store = Arc::new(open_store(&cli.db)?);

    match cli.command {
        Commands::Crawl { seed, max_depth, max_concurrency, json } => {
            let job = CrawlJob::new(&seed, max_depth, max_concurrency)?;
            let coordinator = build_coordinator(&settings, store)?;
            handle_crawl(&coordinator, job, json).await
        }
        Commands::Pages { query, json } => handle_pages(&*store, query.as_deref(), json).await,
        Commands::Page { url, json } => handle_page(&*store, &url, json).await,
        Commands::Serve { listen } => {
            let listen_addr = listen.unwrap_or_else(|| settings.server.listen_addr.clone());
            let coordinator = build_coordinator(&settings, store.clone())?;
            server::serve(&listen_addr, Arc::new(coordinator), store, settings.server.max_active_jobs).await?;
            Ok(0)
        }
    }
}

fn open_store(path: &Path) -> Result<SqliteStore> {
    SqliteStore::open(path).with_context(|| format!("Failed to open database {}", path.display()))
}

fn build_coordinator(settings: &Settings, store: Arc<SqliteStore>) -> Result<Coordinator> {
    let fetcher = HttpFetcher::from_settings(&settings.crawler).context("Failed to build HTTP client")?;

    Ok(Coordinator::new(Arc::new(fetcher), store, Arc::new(TracingEvents))
        .with_relay_capacity(settings.crawler.relay_capacity))
}

// Handles the 'crawl' subcommand
// Runs in the foreground until every fetched page is stored
async fn handle_crawl(coordinator: &Coordinator, job: CrawlJob, json: bool) -> Result<i32> {
    if !json {
        println!("Crawling {}", job.seed());
        println!("Max depth: {}, workers: {}", job.max_depth(), job.max_concurrency());
    }

    let report = coordinator.run(job).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(0)
}

// Handles the 'pages' subcommand
async fn handle_pages(store: &dyn PageStore, query: Option<&str>, json: bool) -> Result<i32> {
    let pages = store.list(query).await.context("Failed to list pages")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&pages)?);
    } else if pages.is_empty() {
        println!("No pages stored");
    } else {
        print_table(&pages);
    }
    Ok(0)
}

// Handles the 'page' subcommand
async fn handle_page(store: &dyn PageStore, url: &str, json: bool) -> Result<i32> {
    let Some(page) = store.get(url).await.context("Failed to load page")? else {
        eprintln!("Page not found: {}", url);
        return Ok(1);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&page)?);
    } else {
        println!("URL:     {}", page.url);
        println!("Title:   {}", page.title.as_deref().unwrap_or("-"));
        println!("Fetched: {}", page.fetched_at.to_rfc3339());
        println!("HTML:    {} bytes", page.html.len());
    }
    Ok(0)
}

fn print_report(report: &CrawlReport) {
    println!();
    println!("Summary:");
    println!("   Visited:    {}", report.pages_visited);
    println!("   Fetched:    {}", report.pages_fetched);
    println!("   Failed:     {}", report.fetch_failures);
    println!("   Stored:     {}", report.pages_stored);
    println!("   Duplicates: {}", report.duplicate_writes);
    if report.store_failures > 0 {
        println!("   Not stored: {}", report.store_failures);
    }
    println!("   Took:       {:.2?}", Duration::from_millis(report.elapsed_ms));
}

// Prints pages as a human-readable table in the terminal
fn print_table(pages: &[PageSummary]) {
    println!("{:<70} {:<40}", "URL", "TITLE");
    println!("{}", "=".repeat(110));

    for page in pages {
        let title = page.title.as_deref().unwrap_or("");
        println!("{:<70} {:<40}", truncate(&page.url, 67), truncate(title, 37));
    }

    println!();
    println!("Total: {}", pages.len());
}

// Shortens text for display, counting characters rather than bytes
fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}

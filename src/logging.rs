// src/logging.rs
// =============================================================================
// Sets up tracing for the binary.
//
// Log lines go to stderr so `--json` output on stdout stays machine-readable.
// RUST_LOG can turn on other targets, e.g.
//   RUST_LOG=reqwest=debug crawl-keeper crawl ...
// =============================================================================

use anyhow::Result;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

// Installs the global subscriber; call once, before anything logs
pub fn init_logging(verbose: bool) -> Result<()> {
    let crate_level = if verbose { "crawl_keeper=debug" } else { "crawl_keeper=info" };

    let env_filter = EnvFilter::from_default_env()
        .add_directive(crate_level.parse()?)
        .add_directive("warn".parse()?);

    let fmt_layer = fmt::layer().with_target(true).with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

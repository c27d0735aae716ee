//! # Live News
//!
//! Scrapes headlines from a fixed set of news websites, classifies them as
//! national or international by source, and serves the current snapshot as
//! JSON.
//!
//! ## Usage
//!
//! ```sh
//! live_news serve --bind 0.0.0.0:8000
//! live_news fetch national
//! ```
//!
//! ## Architecture
//!
//! Every request runs the full pipeline against live sites:
//! 1. **Registry**: Look up the sources of the requested category
//! 2. **Fetching**: Download each source's seed pages concurrently
//! 3. **Extraction**: Apply the source's selector ruleset to pull out articles
//! 4. **Merging**: Deduplicate by URL in source priority order
//!
//! Nothing is cached or persisted between requests.

use clap::Parser;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod aggregator;
mod api;
mod cli;
mod error;
mod extractor;
mod fetcher;
mod models;
mod retry;
mod service;
mod sources;
mod utils;

use aggregator::NewsAggregator;
use cli::{Cli, Command};
use fetcher::{HttpFetcher, PageFetcher};
use models::Category;
use retry::RetryFetch;
use service::QueryService;
use sources::SourceRegistry;

const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "live_news starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let service = match build_service(&args) {
        Ok(service) => service,
        Err(e) => {
            error!(error = %e, "Startup configuration is invalid");
            return Err(e);
        }
    };

    match args.command {
        Command::Serve { bind } => serve(service, &bind).await,
        Command::Fetch { category } => fetch_once(service, &category).await,
    }
}

/// Load and validate the source table, then wire fetcher, aggregator and service.
fn build_service(args: &Cli) -> Result<QueryService, Box<dyn Error>> {
    let registry = match &args.sources {
        Some(path) => SourceRegistry::from_yaml_file(path)?,
        None => SourceRegistry::builtin()?,
    };

    let http = HttpFetcher::new(&args.user_agent)?;
    let fetcher: Arc<dyn PageFetcher> = if args.fetch_retries > 0 {
        Arc::new(RetryFetch::new(http, args.fetch_retries, RETRY_BASE_DELAY))
    } else {
        Arc::new(http)
    };

    let aggregator = NewsAggregator::new(
        Arc::new(registry),
        fetcher,
        Duration::from_secs(args.fetch_timeout_secs),
    );
    info!(
        timeout_secs = args.fetch_timeout_secs,
        retries = args.fetch_retries,
        "News aggregator ready"
    );
    Ok(QueryService::new(Arc::new(aggregator)))
}

async fn serve(service: QueryService, bind: &str) -> Result<(), Box<dyn Error>> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(addr = %listener.local_addr()?, "Listening");

    axum::serve(listener, api::create_router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn fetch_once(service: QueryService, category: &str) -> Result<(), Box<dyn Error>> {
    let category: Category = category.parse()?;
    let result = match category {
        Category::National => service.get_national().await,
        Category::International => service.get_international().await,
    };

    for failure in &result.failures {
        warn!(source = %failure.source_name, error = %failure.reason, "Source failed");
    }
    if result.is_degraded() {
        warn!(%category, "Every source failed");
    }
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

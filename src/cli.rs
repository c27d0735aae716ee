//! Command-line interface definitions for Live News.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Every option can also be supplied through an environment variable, which is
//! how container deployments configure the server.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::fetcher::DEFAULT_USER_AGENT;

/// Command-line arguments for the Live News service.
///
/// # Examples
///
/// ```sh
/// # Serve the API on the default address
/// live_news serve
///
/// # Serve with a custom source table and a shorter timeout
/// live_news --sources ./sources.yaml --fetch-timeout-secs 5 serve --bind 127.0.0.1:9000
///
/// # Scrape one category once and print the result
/// live_news fetch international
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// YAML file replacing the built-in source table
    #[arg(long, env = "LIVE_NEWS_SOURCES", global = true)]
    pub sources: Option<PathBuf>,

    /// Per-page fetch timeout in seconds
    #[arg(long, env = "LIVE_NEWS_FETCH_TIMEOUT_SECS", default_value_t = 10, global = true)]
    pub fetch_timeout_secs: u64,

    /// Extra attempts for timeouts, network errors and 5xx responses
    #[arg(long, env = "LIVE_NEWS_FETCH_RETRIES", default_value_t = 0, global = true)]
    pub fetch_retries: usize,

    /// User-Agent header sent to news sites
    #[arg(long, env = "LIVE_NEWS_USER_AGENT", default_value = DEFAULT_USER_AGENT, global = true)]
    pub user_agent: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Serve the JSON API
    Serve {
        /// Socket address to listen on
        #[arg(long, env = "LIVE_NEWS_BIND", default_value = "0.0.0.0:8000")]
        bind: String,
    },
    /// Scrape one category once and print the aggregation as JSON
    Fetch {
        /// `national` or `international`
        category: String,
    },
}

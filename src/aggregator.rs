//! Category-wide aggregation across every configured source.
//!
//! For one category, every source is fetched and extracted as an independent
//! unit of work. Units run concurrently; each one ends as a [`SourceOutcome`]
//! value instead of an error, so a broken site can never fail the whole call.
//! Outcomes are merged only after all units finish, in registry order, which
//! makes the deduplicated result independent of which site answered first.

use crate::error::FailureReason;
use crate::extractor;
use crate::fetcher::PageFetcher;
use crate::models::{AggregationResult, Article, Category, SourceFailure};
use crate::sources::{Source, SourceRegistry};
use chrono::Utc;
use futures::future::join_all;
use itertools::Itertools;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};
use url::Url;

/// What one source contributed to an aggregation.
#[derive(Debug)]
enum SourceOutcome {
    Collected(Vec<Article>),
    Failed(SourceFailure),
}

/// Fetches, extracts and merges the articles of one category.
///
/// Holds no per-request state; one instance can serve any number of
/// concurrent `aggregate` calls.
#[derive(Clone)]
pub struct NewsAggregator {
    registry: Arc<SourceRegistry>,
    fetcher: Arc<dyn PageFetcher>,
    fetch_timeout: Duration,
}

impl NewsAggregator {
    /// Create an aggregator over a validated registry.
    ///
    /// # Arguments
    ///
    /// * `registry` - Sources to scrape, in priority order
    /// * `fetcher` - Page retrieval, usually an [`HttpFetcher`](crate::fetcher::HttpFetcher)
    ///   optionally wrapped in a [`RetryFetch`](crate::retry::RetryFetch)
    /// * `fetch_timeout` - Budget for each individual page fetch
    pub fn new(
        registry: Arc<SourceRegistry>,
        fetcher: Arc<dyn PageFetcher>,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            fetcher,
            fetch_timeout,
        }
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Scrape every source of `category` and merge the results.
    ///
    /// Articles are deduplicated by `url`; the first occurrence wins, where
    /// sources are ordered by registry priority and articles by page order.
    /// Sources that fail are listed in `failures` and contribute nothing.
    /// This never fails: if every source is down the result is simply empty.
    ///
    /// # Returns
    ///
    /// The merged articles, the per-source failures and the time of the scrape.
    #[instrument(level = "info", skip_all, fields(%category))]
    pub async fn aggregate(&self, category: Category) -> AggregationResult {
        let t0 = Instant::now();
        let sources = self.registry.list_sources(category);

        let outcomes = join_all(sources.iter().map(|source| self.collect_source(source))).await;

        let mut collected = Vec::new();
        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome {
                SourceOutcome::Collected(articles) => collected.extend(articles),
                SourceOutcome::Failed(failure) => failures.push(failure),
            }
        }

        let scraped = collected.len();
        let articles: Vec<Article> = collected
            .into_iter()
            .filter(|a| a.category == category)
            .unique_by(|a| a.url.clone())
            .collect();

        info!(
            sources = sources.len(),
            failed = failures.len(),
            scraped,
            unique = articles.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Aggregation complete"
        );

        AggregationResult {
            category,
            articles,
            failures,
            fetched_at: Utc::now(),
        }
    }

    /// Scrape every seed page of one source concurrently.
    ///
    /// The source fails only when no seed page could be used; the first
    /// seed's error is the one recorded.
    #[instrument(level = "info", skip_all, fields(source = %source.name))]
    async fn collect_source(&self, source: &Source) -> SourceOutcome {
        let results = join_all(source.urls.iter().map(|url| self.scrape_page(source, url))).await;

        let mut articles = Vec::new();
        let mut first_error = None;
        let mut pages_ok = 0usize;

        for (url, result) in source.urls.iter().zip(results) {
            match result {
                Ok(found) => {
                    pages_ok += 1;
                    articles.extend(found);
                }
                Err(reason) => {
                    warn!(%url, kind = reason.kind(), error = %reason, "Seed page unusable");
                    first_error.get_or_insert(reason);
                }
            }
        }

        match first_error {
            Some(reason) if pages_ok == 0 => {
                warn!(kind = reason.kind(), error = %reason, "Source failed; skipping");
                SourceOutcome::Failed(SourceFailure {
                    source_name: source.name.clone(),
                    reason,
                })
            }
            _ => {
                debug!(count = articles.len(), "Source scraped");
                SourceOutcome::Collected(articles)
            }
        }
    }

    async fn scrape_page(&self, source: &Source, url: &Url) -> Result<Vec<Article>, FailureReason> {
        let page = self.fetcher.fetch(url, self.fetch_timeout).await?;
        let articles = extractor::extract(&page, source)?;
        debug!(%url, status = page.status, count = articles.len(), "Seed page scraped");
        Ok(articles)
    }
}

//! Data models for scraped articles and aggregation results.
//!
//! This module defines the core data structures used throughout the application:
//! - [`Category`]: The two editions served, national and international
//! - [`Article`]: One normalized headline scraped from a source page
//! - [`SourceFailure`]: A source that contributed nothing, and why
//! - [`AggregationResult`]: Everything one aggregation call produced
//!
//! Articles are built fresh on every aggregation call and never mutated
//! afterwards. The `url` field is the identity used for deduplication.

use crate::error::{ConfigError, FailureReason};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The edition an article belongs to.
///
/// Derived from the source that produced the article, never from the
/// article text itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[serde(alias = "indian")]
    National,
    International,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::National, Category::International];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::National => "national",
            Category::International => "international",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "national" | "indian" => Ok(Category::National),
            "international" => Ok(Category::International),
            other => Err(ConfigError::UnknownCategory(other.to_string())),
        }
    }
}

/// A news article as scraped from a source page.
///
/// # Fields
///
/// * `title` - Cleaned headline text, never empty
/// * `url` - Absolute link to the story; the deduplication key
/// * `summary` - Teaser text when the page offers one
/// * `image_url` - Absolute thumbnail link when the page offers one
/// * `published_at` - Timestamp as reported by the source, unvalidated
/// * `source_name` - Name of the [`Source`](crate::sources::Source) it came from
/// * `category` - Category of that source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub url: String,
    pub summary: Option<String>,
    pub image_url: Option<String>,
    pub published_at: Option<String>,
    pub source_name: String,
    pub category: Category,
}

/// A source that could not be fetched or parsed during one aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFailure {
    pub source_name: String,
    pub reason: FailureReason,
}

/// Outcome of aggregating every source of one category.
///
/// `articles` is deduplicated by `url` and ordered by source priority, then by
/// position on the source page. `failures` lists sources that contributed
/// nothing; a non-empty failure list does not make the result an error.
#[derive(Debug, Clone, Serialize)]
pub struct AggregationResult {
    pub category: Category,
    pub articles: Vec<Article>,
    pub failures: Vec<SourceFailure>,
    pub fetched_at: DateTime<Utc>,
}

impl AggregationResult {
    /// Every source failed and nothing was collected.
    pub fn is_degraded(&self) -> bool {
        self.articles.is_empty() && !self.failures.is_empty()
    }
}

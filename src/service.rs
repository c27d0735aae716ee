//! Query entry points consumed by the HTTP boundary.

use crate::aggregator::NewsAggregator;
use crate::models::{AggregationResult, Category};
use std::sync::Arc;

/// Fixed-category front end over [`NewsAggregator`].
///
/// Every call is a fresh scrape; nothing is cached between calls.
#[derive(Clone)]
pub struct QueryService {
    aggregator: Arc<NewsAggregator>,
}

impl QueryService {
    pub fn new(aggregator: Arc<NewsAggregator>) -> Self {
        Self { aggregator }
    }

    pub async fn get_national(&self) -> AggregationResult {
        self.aggregator.aggregate(Category::National).await
    }

    pub async fn get_international(&self) -> AggregationResult {
        self.aggregator.aggregate(Category::International).await
    }

    pub fn aggregator(&self) -> &NewsAggregator {
        &self.aggregator
    }
}

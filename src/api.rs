//! HTTP boundary: JSON endpoints over [`QueryService`].
//!
//! # Routes
//!
//! | Method | Path | Response |
//! |--------|------|----------|
//! | GET | `/` | health document |
//! | GET | `/news/national` | JSON array of articles |
//! | GET | `/news/international` | JSON array of articles |
//! | GET | `/news/sources` | configured sources |
//!
//! Article endpoints always answer 200 with a well-formed array, even when
//! some or all sources failed; failures are logged here instead of being
//! returned. Unknown categories fall through to the router's 404.

use crate::models::{AggregationResult, Article, Category};
use crate::service::QueryService;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    service: QueryService,
}

/// Build the application router around `service`.
pub fn create_router(service: QueryService) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/news/national", get(national_news))
        .route("/news/international", get(international_news))
        .route("/news/sources", get(list_sources))
        .layer(CorsLayer::very_permissive())
        .with_state(AppState { service })
}

#[derive(Debug, Serialize)]
struct SourceInfo {
    name: String,
    category: Category,
    urls: Vec<String>,
}

#[derive(Debug, Serialize)]
struct SourcesResponse {
    sources: Vec<SourceInfo>,
    total: usize,
}

async fn health() -> Json<Value> {
    Json(json!({
        "message": "Live News API is running",
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn national_news(State(state): State<AppState>) -> Json<Vec<Article>> {
    articles_response(state.service.get_national().await)
}

async fn international_news(State(state): State<AppState>) -> Json<Vec<Article>> {
    articles_response(state.service.get_international().await)
}

async fn list_sources(State(state): State<AppState>) -> Json<SourcesResponse> {
    let sources: Vec<SourceInfo> = state
        .service
        .aggregator()
        .registry()
        .sources()
        .iter()
        .map(|s| SourceInfo {
            name: s.name.clone(),
            category: s.category,
            urls: s.urls.iter().map(|u| u.to_string()).collect(),
        })
        .collect();
    let total = sources.len();
    Json(SourcesResponse { sources, total })
}

fn articles_response(result: AggregationResult) -> Json<Vec<Article>> {
    for failure in &result.failures {
        warn!(
            category = %result.category,
            source = %failure.source_name,
            kind = failure.reason.kind(),
            error = %failure.reason,
            "Source excluded from response"
        );
    }
    if result.is_degraded() {
        warn!(category = %result.category, "Every source failed; serving an empty list");
    }

    info!(
        category = %result.category,
        count = result.articles.len(),
        failed = result.failures.len(),
        "Serving articles"
    );
    Json(result.articles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::NewsAggregator;
    use crate::aggregator::tests::{FakeFetcher, registry, story, story_spec};
    use crate::error::FetchError;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    fn app(fetcher: FakeFetcher) -> Router {
        let registry = registry(vec![
            story_spec("Desk One", Category::National, "https://one.example.com/"),
            story_spec("Desk Two", Category::National, "https://two.example.com/"),
        ]);
        let aggregator = NewsAggregator::new(registry, Arc::new(fetcher), Duration::from_secs(1));
        create_router(QueryService::new(Arc::new(aggregator)))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let req = Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("build request");
        let resp = app.oneshot(req).await.expect("call router");
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_national_returns_article_array_despite_partial_failure() {
        let fetcher = FakeFetcher::default()
            .page(
                "https://one.example.com/",
                &[
                    story("/a", "Cabinet approves new rail corridor", "Funding cleared"),
                    story("/b", "Space agency schedules lunar launch", ""),
                ]
                .concat(),
            )
            .error("https://two.example.com/", FetchError::Timeout);

        let (status, body) = get_json(app(fetcher), "/news/national").await;
        assert_eq!(status, StatusCode::OK);

        let items = body.as_array().expect("array body");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["url"], "https://one.example.com/a");
        assert_eq!(items[0]["category"], "national");
        assert_eq!(items[0]["summary"], "Funding cleared");
        assert!(items[1]["summary"].is_null());
    }

    #[tokio::test]
    async fn test_all_sources_down_is_still_ok_and_empty() {
        let fetcher = FakeFetcher::default()
            .error("https://one.example.com/", FetchError::HttpStatus(503))
            .error("https://two.example.com/", FetchError::EmptyBody);

        let (status, body) = get_json(app(fetcher), "/news/national").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_international_endpoint() {
        let fetcher = FakeFetcher::default().page(
            "https://wire.example.org/",
            &story("/w", "Ceasefire talks resume in Geneva", "Diplomats meet"),
        );

        let (status, body) = get_json(app(fetcher), "/news/international").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["source_name"], "World Wire");
        assert_eq!(body[0]["category"], "international");
    }

    #[tokio::test]
    async fn test_unknown_category_is_not_found() {
        let (status, _) = get_json(app(FakeFetcher::default()), "/news/sports").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_health_and_sources() {
        let (status, body) = get_json(app(FakeFetcher::default()), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");

        let (status, body) = get_json(app(FakeFetcher::default()), "/news/sources").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 3);
        assert_eq!(body["sources"][0]["name"], "Desk One");
        assert_eq!(body["sources"][2]["category"], "international");
        assert_eq!(body["sources"][2]["urls"][0], "https://wire.example.org/");
    }
}

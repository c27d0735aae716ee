//! Page retrieval for source seed URLs.
//!
//! [`PageFetcher`] is the seam between the aggregator and the network. The
//! production implementation, [`HttpFetcher`], issues exactly one GET per call
//! and classifies every way it can go wrong into a [`FetchError`]. Retries are
//! not done here; wrap a fetcher in [`RetryFetch`](crate::retry::RetryFetch)
//! when they are wanted.

use crate::error::FetchError;
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};
use url::Url;

/// Browser-like User-Agent; several of the scraped sites reject obvious bots.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";
const ACCEPT_LANG: &str = "en-US,en;q=0.5";

/// Raw markup retrieved from one seed URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPage {
    /// The seed URL that was requested; relative links resolve against it.
    pub url: Url,
    pub status: u16,
    pub body: String,
}

/// Retrieve one page.
///
/// Implementations must not retry and must not share mutable state between
/// calls, so that any number of fetches can run concurrently.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch `url`, giving up after `timeout`.
    ///
    /// Succeeds only for a 2xx status with a non-blank body.
    async fn fetch(&self, url: &Url, timeout: Duration) -> Result<RawPage, FetchError>;
}

/// [`PageFetcher`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Build a fetcher sending `user_agent` and browser-style `Accept` headers.
    ///
    /// # Arguments
    ///
    /// * `user_agent` - Value of the `User-Agent` header, see [`DEFAULT_USER_AGENT`]
    ///
    /// # Returns
    ///
    /// A fetcher with a pooled, gzip-capable client, or the `reqwest` error if
    /// the TLS backend could not be initialized.
    pub fn new(user_agent: &str) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANG));

        let client = Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .gzip(true)
            .build()?;

        Ok(Self { client })
    }

    async fn get(&self, url: &Url) -> Result<(u16, String), FetchError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }
        let body = response.text().await?;
        Ok((status.as_u16(), body))
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    #[instrument(level = "info", skip_all, fields(%url, timeout_ms = timeout.as_millis() as u64))]
    async fn fetch(&self, url: &Url, timeout: Duration) -> Result<RawPage, FetchError> {
        let t0 = Instant::now();

        let result = match tokio::time::timeout(timeout, self.get(url)).await {
            Ok(inner) => inner,
            Err(_) => Err(FetchError::Timeout),
        };
        let elapsed_ms = t0.elapsed().as_millis() as u64;

        let (status, body) = match result {
            Ok(ok) => ok,
            Err(e) => {
                warn!(elapsed_ms, reason = e.reason(), error = %e, "Fetch failed");
                return Err(e);
            }
        };

        if body.trim().is_empty() {
            warn!(elapsed_ms, status, "Fetch returned an empty body");
            return Err(FetchError::EmptyBody);
        }

        debug!(elapsed_ms, status, bytes = body.len(), "Fetched page");
        Ok(RawPage {
            url: url.clone(),
            status,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::http::StatusCode;
    use axum::response::Html;
    use axum::routing::get;
    use std::net::SocketAddr;
    use tokio::net::TcpListener;

    async fn spawn_server() -> SocketAddr {
        let app = Router::new()
            .route(
                "/ok",
                get(|| async { Html("<html><body><p>front page</p></body></html>") }),
            )
            .route("/blank", get(|| async { Html("  \n  ") }))
            .route(
                "/missing",
                get(|| async { (StatusCode::NOT_FOUND, "no such page") }),
            )
            .route(
                "/broken",
                get(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
            )
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Html("<p>too late</p>")
                }),
            );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    fn url(addr: SocketAddr, path: &str) -> Url {
        Url::parse(&format!("http://{addr}{path}")).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_success_returns_body() {
        let addr = spawn_server().await;
        let fetcher = HttpFetcher::new(DEFAULT_USER_AGENT).unwrap();

        let page = fetcher
            .fetch(&url(addr, "/ok"), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(page.status, 200);
        assert!(page.body.contains("front page"));
        assert_eq!(page.url, url(addr, "/ok"));
    }

    #[tokio::test]
    async fn test_fetch_non_2xx_is_http_status() {
        let addr = spawn_server().await;
        let fetcher = HttpFetcher::new(DEFAULT_USER_AGENT).unwrap();

        let err = fetcher
            .fetch(&url(addr, "/missing"), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::HttpStatus(404));

        let err = fetcher
            .fetch(&url(addr, "/broken"), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::HttpStatus(502));
    }

    #[tokio::test]
    async fn test_fetch_blank_body_is_empty_body() {
        let addr = spawn_server().await;
        let fetcher = HttpFetcher::new(DEFAULT_USER_AGENT).unwrap();

        let err = fetcher
            .fetch(&url(addr, "/blank"), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::EmptyBody);
    }

    #[tokio::test]
    async fn test_fetch_slow_page_times_out() {
        let addr = spawn_server().await;
        let fetcher = HttpFetcher::new(DEFAULT_USER_AGENT).unwrap();

        let t0 = Instant::now();
        let err = fetcher
            .fetch(&url(addr, "/slow"), Duration::from_millis(200))
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::Timeout);
        assert!(t0.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_fetch_refused_connection_is_network() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let fetcher = HttpFetcher::new(DEFAULT_USER_AGENT).unwrap();
        let err = fetcher
            .fetch(&url(addr, "/ok"), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert_eq!(err.reason(), "network");
    }
}

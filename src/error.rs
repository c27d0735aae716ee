//! Error taxonomy for the scraping pipeline.
//!
//! Three families, with different blast radius:
//!
//! - [`ConfigError`]: the source table or a category name is wrong. Raised while
//!   building the registry or parsing CLI input, never while serving a request.
//! - [`FetchError`]: one seed page could not be retrieved.
//! - [`ParseError`]: one seed page was retrieved but is not markup.
//!
//! Fetch and parse errors are folded into a [`FailureReason`] and recorded on
//! the aggregation result; they never reach the HTTP boundary as a failure.

use serde::Serialize;
use std::io;
use thiserror::Error;

/// Invalid or missing source configuration. Fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown category `{0}` (expected `national` or `international`)")]
    UnknownCategory(String),

    #[error("source `{source_name}`: invalid {field} selector `{selector}`: {reason}")]
    InvalidSelector {
        source_name: String,
        field: &'static str,
        selector: String,
        reason: String,
    },

    #[error("source `{source_name}`: invalid seed url `{url}`: {reason}")]
    InvalidUrl {
        source_name: String,
        url: String,
        reason: String,
    },

    #[error("source `{0}` has no seed urls")]
    NoSeedUrls(String),

    #[error("no sources configured for category `{0}`")]
    EmptyCategory(String),

    #[error("reading source table: {0}")]
    Io(#[from] io::Error),

    #[error("parsing source table: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Why a single page retrieval failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("unexpected HTTP status {0}")]
    HttpStatus(u16),

    #[error("network error: {0}")]
    Network(String),

    #[error("response body was empty")]
    EmptyBody,
}

impl FetchError {
    /// Stable machine-readable tag for logs and JSON output.
    pub fn reason(&self) -> &'static str {
        match self {
            FetchError::Timeout => "timeout",
            FetchError::HttpStatus(_) => "http_status",
            FetchError::Network(_) => "network",
            FetchError::EmptyBody => "empty_body",
        }
    }

    /// Whether a caller-side retry has any chance of succeeding.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Timeout | FetchError::Network(_) => true,
            FetchError::HttpStatus(code) => *code >= 500,
            FetchError::EmptyBody => false,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = e.status() {
            FetchError::HttpStatus(status.as_u16())
        } else {
            FetchError::Network(e.to_string())
        }
    }
}

/// The page body could not be treated as markup at all.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("body contains binary data")]
    BinaryContent,

    #[error("body contains no markup")]
    NotMarkup,
}

/// A per-source failure, as recorded in an aggregation result.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FailureReason {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl FailureReason {
    pub fn kind(&self) -> &'static str {
        match self {
            FailureReason::Fetch(e) => e.reason(),
            FailureReason::Parse(_) => "parse",
        }
    }
}

impl Serialize for FailureReason {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("FailureReason", 2)?;
        s.serialize_field("kind", self.kind())?;
        s.serialize_field("detail", &self.to_string())?;
        s.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_reason_tags() {
        assert_eq!(FetchError::Timeout.reason(), "timeout");
        assert_eq!(FetchError::HttpStatus(404).reason(), "http_status");
        assert_eq!(FetchError::Network("reset".into()).reason(), "network");
        assert_eq!(FetchError::EmptyBody.reason(), "empty_body");
    }

    #[test]
    fn test_transient_classification() {
        assert!(FetchError::Timeout.is_transient());
        assert!(FetchError::Network("dns".into()).is_transient());
        assert!(FetchError::HttpStatus(503).is_transient());
        assert!(!FetchError::HttpStatus(404).is_transient());
        assert!(!FetchError::EmptyBody.is_transient());
    }

    #[test]
    fn test_failure_reason_serializes_kind_and_detail() {
        let reason = FailureReason::from(FetchError::HttpStatus(502));
        let json = serde_json::to_value(&reason).unwrap();
        assert_eq!(json["kind"], "http_status");
        assert_eq!(json["detail"], "unexpected HTTP status 502");

        let reason = FailureReason::from(ParseError::NotMarkup);
        let json = serde_json::to_value(&reason).unwrap();
        assert_eq!(json["kind"], "parse");
    }

    #[test]
    fn test_config_error_message_names_source() {
        let err = ConfigError::InvalidSelector {
            source_name: "BBC News".into(),
            field: "title",
            selector: "h3[".into(),
            reason: "unexpected end".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("BBC News"));
        assert!(msg.contains("title"));
    }
}

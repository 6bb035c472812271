//! Error types for the linkding client.
//!
//! # Design
//! Four status codes get dedicated variants because the service uses them
//! with fixed meanings: 400 (validation failure, body carries field errors),
//! 401 (bad or missing token), 404 and 500. Every other non-2xx status lands
//! in `UnexpectedStatus`. Failures that happen before any response exists are
//! kept apart in `TransportError`.

use std::collections::BTreeMap;

use thiserror::Error;

/// Result alias used by every client operation.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors returned by `LinkdingClient` operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No response was obtained.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The server returned 400. `detail` holds the raw response body,
    /// usually a JSON object mapping field names to messages.
    #[error("bad request: {}", String::from_utf8_lossy(.detail))]
    BadRequest { detail: Vec<u8> },

    /// The server returned 401; the token is missing or invalid.
    #[error("unauthorized")]
    Unauthorized,

    /// The server returned 404.
    #[error("not found")]
    NotFound,

    /// The server returned 500.
    #[error("internal server error")]
    InternalServerError,

    /// The server returned a non-2xx status without a dedicated variant.
    #[error("unexpected HTTP status {status}")]
    UnexpectedStatus { status: u16 },

    /// A success response body was not the expected JSON.
    #[error("failed to decode response body: {0}")]
    Decode(#[source] serde_json::Error),

    /// A request payload could not be serialized.
    #[error("failed to encode request payload: {0}")]
    Encode(#[source] serde_json::Error),
}

impl ApiError {
    /// Status code that produced this error, if a response was received.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::BadRequest { .. } => Some(400),
            ApiError::Unauthorized => Some(401),
            ApiError::NotFound => Some(404),
            ApiError::InternalServerError => Some(500),
            ApiError::UnexpectedStatus { status } => Some(*status),
            ApiError::Transport(_) | ApiError::Decode(_) | ApiError::Encode(_) => None,
        }
    }

    /// Field errors of a `BadRequest`, when the detail is a JSON object of
    /// message lists (`{"url": ["This field may not be blank."]}`).
    pub fn validation_errors(&self) -> Option<BTreeMap<String, Vec<String>>> {
        match self {
            ApiError::BadRequest { detail } => serde_json::from_slice(detail).ok(),
            _ => None,
        }
    }
}

/// Failures that leave no HTTP response to classify.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("URL {0:?} has no host")]
    MissingHost(String),

    /// A base URL carrying a query string or fragment; request paths cannot
    /// be appended to it.
    #[error("base URL {0:?} must not have a query or fragment")]
    QueryInBaseUrl(String),

    /// Connection, DNS, TLS or timeout failure reported by the HTTP stack.
    #[error("request failed: {0}")]
    Connection(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Reading a response body failed.
    #[error("failed to read response body: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(ApiError::Unauthorized.status_code(), Some(401));
        assert_eq!(ApiError::NotFound.status_code(), Some(404));
        assert_eq!(ApiError::InternalServerError.status_code(), Some(500));
        assert_eq!(ApiError::UnexpectedStatus { status: 503 }.status_code(), Some(503));
        assert_eq!(ApiError::BadRequest { detail: Vec::new() }.status_code(), Some(400));
        let io = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        assert_eq!(ApiError::from(TransportError::from(io)).status_code(), None);
    }

    #[test]
    fn bad_request_display_includes_detail() {
        let err = ApiError::BadRequest {
            detail: br#"{"url":["invalid"]}"#.to_vec(),
        };
        assert_eq!(err.to_string(), r#"bad request: {"url":["invalid"]}"#);
    }

    #[test]
    fn validation_errors_parse_field_messages() {
        let err = ApiError::BadRequest {
            detail: br#"{"url":["invalid"],"tag_names":["required"]}"#.to_vec(),
        };
        let fields = err.validation_errors().unwrap();
        assert_eq!(fields["url"], vec!["invalid".to_string()]);
        assert_eq!(fields["tag_names"], vec!["required".to_string()]);
    }

    #[test]
    fn validation_errors_none_for_other_shapes() {
        let err = ApiError::BadRequest {
            detail: b"<html>oops</html>".to_vec(),
        };
        assert!(err.validation_errors().is_none());
        assert!(ApiError::NotFound.validation_errors().is_none());
    }
}

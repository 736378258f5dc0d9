//! Error types for txanalyzer-client
//!
//! Every failure at the API boundary is normalized to an [`ApiError`]
//! carrying a human-readable message and the HTTP status, if any.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message used when the server does not supply one
pub const DEFAULT_ERROR_MESSAGE: &str = "An error occurred";

/// Where a request failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiErrorKind {
    /// The server answered with status >= 400
    Http,
    /// No usable response (connection, TLS, request building)
    Network,
    /// The response body did not match the expected shape
    Decode,
}

impl std::fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiErrorKind::Http => write!(f, "HTTP"),
            ApiErrorKind::Network => write!(f, "NETWORK"),
            ApiErrorKind::Decode => write!(f, "DECODE"),
        }
    }
}

/// Uniform error shape for API calls
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("{message}")]
pub struct ApiError {
    pub message: String,
    /// HTTP status, `None` when no response was received
    pub status: Option<u16>,
    pub kind: ApiErrorKind,
}

/// Error body shape returned by the API (`{ "message": ..., "statusCode": ... }`)
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<serde_json::Value>,
}

impl ApiError {
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: Some(status),
            kind: ApiErrorKind::Http,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            kind: ApiErrorKind::Network,
        }
    }

    /// Undecodable body; `status` is `None` when reqwest failed before one was read
    pub fn decode(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status,
            kind: ApiErrorKind::Decode,
        }
    }

    /// Build from a failing response, taking the server's `message` if present
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        Self::http(status, server_message(body).unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string()))
    }

    pub fn is_not_found(&self) -> bool {
        self.status == Some(404)
    }

    pub fn is_server_error(&self) -> bool {
        self.status.map_or(false, |s| s >= 500)
    }
}

/// Extract `message` from an error body; validation errors send a list
fn server_message(body: &[u8]) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_slice(body).ok()?;
    match parsed.message? {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s),
        serde_json::Value::Array(items) => {
            let parts: Vec<String> = items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .filter(|s| !s.trim().is_empty())
                .collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join("; "))
            }
        }
        _ => None,
    }
}

/// Map a transport failure by what reqwest knows about it
fn transport_error(status: Option<u16>, is_decode: bool, detail: String) -> ApiError {
    match status {
        Some(status) => ApiError::http(status, DEFAULT_ERROR_MESSAGE),
        None if is_decode => ApiError::decode(None, detail),
        None => ApiError::network(DEFAULT_ERROR_MESSAGE),
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        transport_error(error.status().map(|s| s.as_u16()), error.is_decode(), error.to_string())
    }
}

/// Result type with ApiError
pub type ApiResult<T> = Result<T, ApiError>;

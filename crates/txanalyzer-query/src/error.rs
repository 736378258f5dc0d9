//! Error types for txanalyzer-query

use serde::{Deserialize, Serialize};
use thiserror::Error;
use txanalyzer_client::ApiError;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryErrorCode {
    /// The API call failed
    ApiError,
    /// The fetch was cancelled before it finished
    Cancelled,
    /// The query is disabled and made no call
    Disabled,
    /// Cached data did not have the expected shape
    DecodeError,
}

impl std::fmt::Display for QueryErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryErrorCode::ApiError => write!(f, "API_ERROR"),
            QueryErrorCode::Cancelled => write!(f, "CANCELLED"),
            QueryErrorCode::Disabled => write!(f, "DISABLED"),
            QueryErrorCode::DecodeError => write!(f, "DECODE_ERROR"),
        }
    }
}

/// Why a query produced no data
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Query was cancelled")]
    Cancelled,

    #[error("Query is disabled")]
    Disabled,

    #[error("Failed to decode cached data: {0}")]
    Decode(String),
}

impl QueryError {
    pub fn code(&self) -> QueryErrorCode {
        match self {
            QueryError::Api(_) => QueryErrorCode::ApiError,
            QueryError::Cancelled => QueryErrorCode::Cancelled,
            QueryError::Disabled => QueryErrorCode::Disabled,
            QueryError::Decode(_) => QueryErrorCode::DecodeError,
        }
    }

    /// HTTP status of the underlying API failure
    pub fn status(&self) -> Option<u16> {
        match self {
            QueryError::Api(error) => error.status,
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

impl From<serde_json::Error> for QueryError {
    fn from(error: serde_json::Error) -> Self {
        QueryError::Decode(error.to_string())
    }
}

/// Result type with QueryError
pub type QueryResult<T> = Result<T, QueryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_passes_message_through() {
        let error = QueryError::from(ApiError::http(404, "Merchant not found"));
        assert_eq!(error.to_string(), "Merchant not found");
        assert_eq!(error.code(), QueryErrorCode::ApiError);
        assert!(error.is_not_found());
        assert_eq!(QueryError::Cancelled.status(), None);
        assert_eq!(QueryErrorCode::DecodeError.to_string(), "DECODE_ERROR");
    }
}

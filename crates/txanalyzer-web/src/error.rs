//! Error types for txanalyzer-web

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use thiserror::Error;
use txanalyzer_client::ApiError;
use txanalyzer_query::QueryError;

#[derive(Error, Debug)]
pub enum WebError {
    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("Internal server error")]
    InternalError,
}

/// Upstream failures keep their status; anything without one is a bad gateway
fn upstream_status(status: Option<u16>) -> StatusCode {
    status
        .filter(|s| *s >= 400)
        .and_then(|s| StatusCode::from_u16(s).ok())
        .unwrap_or(StatusCode::BAD_GATEWAY)
}

impl WebError {
    pub fn status(&self) -> StatusCode {
        match self {
            WebError::NotFound { .. } => StatusCode::NOT_FOUND,
            WebError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            WebError::Api(e) => upstream_status(e.status),
            WebError::Query(QueryError::Api(e)) => upstream_status(e.status),
            WebError::Query(QueryError::Disabled) => StatusCode::BAD_REQUEST,
            WebError::Query(QueryError::Cancelled) => StatusCode::SERVICE_UNAVAILABLE,
            WebError::Query(QueryError::Decode(_)) => StatusCode::BAD_GATEWAY,
            WebError::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> String {
        match self {
            WebError::NotFound { .. } => "NOT_FOUND".to_string(),
            WebError::BadRequest { .. } => "BAD_REQUEST".to_string(),
            WebError::Api(e) => e.kind.to_string(),
            WebError::Query(e) => e.code().to_string(),
            WebError::InternalError => "INTERNAL_ERROR".to_string(),
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!(target: "txanalyzer::web", "{}", self);
        }
        let body = serde_json::json!({
            "code": self.code(),
            "message": self.to_string(),
            "statusCode": status.as_u16(),
        });
        (status, Json(body)).into_response()
    }
}

pub type WebResult<T> = Result<T, WebError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_status_is_kept() {
        let err = WebError::from(ApiError::http(404, "Merchant not found"));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Merchant not found");

        let err = WebError::from(QueryError::Api(ApiError::network("connection refused")));
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.code(), "API_ERROR");
    }

    #[test]
    fn test_local_errors() {
        assert_eq!(WebError::from(QueryError::Disabled).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            WebError::BadRequest { message: "missing id".into() }.status(),
            StatusCode::BAD_REQUEST
        );
    }
}

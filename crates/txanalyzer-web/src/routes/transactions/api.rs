//! Transaction API endpoints - JSON API

use axum::extract::State;
use axum::Json;
use txanalyzer_core::{
    AnalyzeTransactionsRequest, AnalyzeTransactionsResponse, PatternAnalysisRequest, PatternAnalysisResponse,
};
use txanalyzer_query::{AnalyzePatterns, AnalyzeTransactions, Mutation};

use crate::error::{WebError, WebResult};
use crate::AppState;

/// Ad-hoc analysis of raw transactions; the cache is left alone
pub async fn api_analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeTransactionsRequest>,
) -> WebResult<Json<AnalyzeTransactionsResponse>> {
    if request.transactions.is_empty() {
        return Err(WebError::BadRequest {
            message: "transactions must not be empty".to_string(),
        });
    }
    let mutation = Mutation::new(AnalyzeTransactions::new(state.api().clone()));
    Ok(Json(mutation.mutate(request).await?))
}

/// Pattern detection over raw transactions, without saving anything
pub async fn api_analyze_patterns(
    State(state): State<AppState>,
    Json(request): Json<PatternAnalysisRequest>,
) -> WebResult<Json<PatternAnalysisResponse>> {
    if request.transactions.is_empty() {
        return Err(WebError::BadRequest {
            message: "transactions must not be empty".to_string(),
        });
    }
    let mutation = Mutation::new(AnalyzePatterns::new(state.api().clone()));
    Ok(Json(mutation.mutate(request).await?))
}

#[cfg(test)]
mod tests {
    use crate::test_support::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use txanalyzer_client::testing::{ANALYZE_PATTERNS, ANALYZE_TRANSACTIONS};
    use txanalyzer_client::ApiError;

    fn analyze_request(body: Value) -> Request<Body> {
        post_json("/api/analyze", body)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_analyze_passthrough() {
        let app = TestApp::new();
        app.api.respond(
            ANALYZE_TRANSACTIONS,
            json!({ "normalized_transactions": [], "detected_patterns": [] }),
        );

        let response = app
            .send(analyze_request(json!({
                "transactions": [{ "description": "SPOTIFY P1234", "amount": -9.99, "date": "2024-03-03" }]
            })))
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        let sent = app.api.last_request(ANALYZE_TRANSACTIONS).unwrap();
        assert_eq!(sent["transactions"][0]["description"], "SPOTIFY P1234");
        assert!(app.state.cache().is_empty());
    }

    #[tokio::test]
    async fn test_empty_analysis_rejected() {
        let app = TestApp::new();

        let response = app.send(analyze_request(json!({ "transactions": [] }))).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(app.api.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_pattern_analysis_passthrough() {
        let app = TestApp::new();
        app.api.respond(
            ANALYZE_PATTERNS,
            json!({ "patterns": [{
                "type": "SUBSCRIPTION",
                "merchant": "Spotify",
                "amount": 9.99,
                "frequency": "MONTHLY",
                "confidence": 0.88,
                "next_expected": "2024-04-01"
            }] }),
        );

        let response = app
            .send(post_json(
                "/api/patterns/analyze",
                json!({ "transactions": [{ "description": "SPOTIFY P1234", "amount": -9.99, "date": "2024-03-03" }] }),
            ))
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["patterns"][0]["merchant"], "Spotify");
        let sent = app.api.last_request(ANALYZE_PATTERNS).unwrap();
        assert_eq!(sent["transactions"][0]["description"], "SPOTIFY P1234");
    }

    #[tokio::test]
    async fn test_pattern_analysis_failure_keeps_upstream_status() {
        let app = TestApp::new();
        app.api.fail(ANALYZE_PATTERNS, ApiError::http(422, "Not enough history"));

        let response = app
            .send(post_json(
                "/api/patterns/analyze",
                json!({ "transactions": [{ "description": "GYM", "amount": -30.0, "date": "2024-03-01" }] }),
            ))
            .await;

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(app.notifications.len(), 1);
    }
}

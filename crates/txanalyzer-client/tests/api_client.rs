//! ApiClient against an in-process fake API server

use axum::extract::{Multipart, Path, Query};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use txanalyzer_client::{
    AnalyzerApi, ApiClient, ApiErrorKind, ClientConfig, NotificationCenter, DEFAULT_ERROR_MESSAGE,
};
use txanalyzer_core::{PatternAnalysisRequest, PatternType, TransactionInput, TransactionQuery, UploadFile};

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn transaction_page(amounts: &[f64]) -> Value {
    let items: Vec<Value> = amounts
        .iter()
        .enumerate()
        .map(|(i, amount)| {
            json!({
                "id": format!("t{}", i + 1),
                "description": "CARD PURCHASE",
                "amount": amount,
                "date": "2024-03-01",
                "category": "Other",
                "isSubscription": false
            })
        })
        .collect();
    json!({ "items": items, "total": amounts.len(), "page": 1, "limit": 10, "totalPages": 1 })
}

fn client(base_url: &str) -> (ApiClient, Arc<NotificationCenter>) {
    let center = Arc::new(NotificationCenter::new(10));
    let client = ApiClient::new(ClientConfig::new(base_url), center.clone()).unwrap();
    (client, center)
}

#[tokio::test]
async fn test_get_transactions_sends_query_string() {
    let app = Router::new().route(
        "/api/transactions",
        get(|Query(params): Query<HashMap<String, String>>| async move {
            assert_eq!(params.get("page").map(String::as_str), Some("1"));
            assert_eq!(params.get("limit").map(String::as_str), Some("10"));
            assert_eq!(params.get("sortBy").map(String::as_str), Some("date"));
            assert_eq!(params.get("order").map(String::as_str), Some("desc"));
            assert!(!params.contains_key("search"));
            Json(transaction_page(&[-12.5, 30.0]))
        }),
    );
    let (client, center) = client(&serve(app).await);

    let page = client.get_transactions(&TransactionQuery::latest(10)).await.unwrap();

    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].amount, Decimal::new(-125, 1));
    assert!(center.is_empty());
}

#[tokio::test]
async fn test_error_message_from_server_notifies_once() {
    let app = Router::new().route(
        "/api/merchants/:id",
        get(|| async {
            (
                StatusCode::NOT_FOUND,
                Json(json!({ "statusCode": 404, "message": "Merchant not found" })),
            )
        }),
    );
    let (client, center) = client(&serve(app).await);

    let error = client.get_merchant("m404").await.unwrap_err();

    assert_eq!(error.status, Some(404));
    assert_eq!(error.message, "Merchant not found");
    let toasts = center.drain();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].title, "Error");
    assert_eq!(toasts[0].description, "Merchant not found");
    assert!(toasts[0].is_destructive());
}

#[tokio::test]
async fn test_error_without_message_uses_fallback() {
    let app = Router::new().route(
        "/api/patterns",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "") }),
    );
    let (client, center) = client(&serve(app).await);

    let error = client.get_all_patterns().await.unwrap_err();

    assert_eq!(error.status, Some(500));
    assert_eq!(error.message, DEFAULT_ERROR_MESSAGE);
    let toasts = center.drain();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].description, DEFAULT_ERROR_MESSAGE);
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);
    let (client, center) = client(&base_url);

    let error = client.get_all_patterns().await.unwrap_err();

    assert_eq!(error.status, None);
    assert_eq!(error.kind, ApiErrorKind::Network);
    assert_eq!(center.len(), 1);
}

#[tokio::test]
async fn test_unexpected_body_is_decode_error() {
    let app = Router::new().route("/api/patterns", get(|| async { Json(json!({ "nope": true })) }));
    let (client, center) = client(&serve(app).await);

    let error = client.get_all_patterns().await.unwrap_err();

    assert_eq!(error.kind, ApiErrorKind::Decode);
    assert_eq!(error.status, Some(200));
    assert_eq!(center.len(), 1);
}

#[tokio::test]
async fn test_upload_is_multipart_file_field() {
    let app = Router::new().route(
        "/api/transactions/upload",
        post(|mut multipart: Multipart| async move {
            let field = multipart.next_field().await.unwrap().unwrap();
            assert_eq!(field.name(), Some("file"));
            assert_eq!(field.file_name(), Some("march.csv"));
            assert_eq!(field.content_type(), Some("text/csv"));
            let body = field.bytes().await.unwrap();
            assert_eq!(&body[..], b"date,description,amount\n");
            Json(json!({
                "normalized_transactions": [],
                "detected_patterns": [],
                "processedCount": 12,
                "failedCount": 1,
                "savedResources": { "merchants": [], "transactions": [], "patterns": [] }
            }))
        }),
    );
    let (client, _center) = client(&serve(app).await);

    let response = client
        .upload_transactions(UploadFile::new("march.csv", "date,description,amount\n"))
        .await
        .unwrap();

    assert_eq!(response.processed_count, 12);
    assert_eq!(response.failed_count, 1);
}

#[tokio::test]
async fn test_path_ids_are_encoded() {
    let app = Router::new().route(
        "/api/patterns/merchant/:id",
        get(|Path(id): Path<String>| async move {
            assert_eq!(id, "m 1/2");
            Json(Value::Array(vec![]))
        }),
    );
    let (client, _center) = client(&serve(app).await);

    let patterns = client.get_patterns_by_merchant("m 1/2").await.unwrap();
    assert!(patterns.is_empty());
}

#[tokio::test]
async fn test_deactivate_accepts_empty_body() {
    let app = Router::new().route("/api/merchants/:id", delete(|| async { StatusCode::NO_CONTENT }));
    let (client, center) = client(&format!("{}/", serve(app).await));

    client.deactivate_merchant("m1").await.unwrap();
    assert!(center.is_empty());
}

#[tokio::test]
async fn test_analyze_patterns_posts_transactions() {
    let app = Router::new().route(
        "/api/patterns/analyze",
        post(|Json(body): Json<Value>| async move {
            let transactions = body["transactions"].as_array().unwrap();
            assert_eq!(transactions.len(), 2);
            assert_eq!(transactions[0]["description"], "SPOTIFY P1234");
            assert_eq!(transactions[1]["date"], "2024-04-03");
            Json(json!({
                "patterns": [{
                    "type": "SUBSCRIPTION",
                    "merchant": "Spotify",
                    "amount": 9.99,
                    "frequency": "MONTHLY",
                    "confidence": 0.88,
                    "next_expected": "2024-05-03"
                }]
            }))
        }),
    );
    let (client, center) = client(&serve(app).await);
    let spotify = |date: &str| TransactionInput {
        description: "SPOTIFY P1234".to_string(),
        amount: Decimal::new(-999, 2),
        date: date.to_string(),
    };

    let response = client
        .analyze_patterns(&PatternAnalysisRequest {
            transactions: vec![spotify("2024-03-03"), spotify("2024-04-03")],
        })
        .await
        .unwrap();

    assert_eq!(response.patterns.len(), 1);
    assert_eq!(response.patterns[0].pattern_type, PatternType::Subscription);
    assert_eq!(response.patterns[0].amount, Decimal::new(999, 2));
    assert!(center.is_empty());
}

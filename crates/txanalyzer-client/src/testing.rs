//! In-memory [`AnalyzerApi`] for tests
//!
//! Responses are configured per operation as JSON, so tests can describe
//! the server the way it answers on the wire. Failures notify like the real
//! client does.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use txanalyzer_core::{
    AnalyzeTransactionsRequest, AnalyzeTransactionsResponse, CreateMerchant, Merchant, MerchantPage,
    MerchantQuery, NormalizeMerchantRequest, NormalizeMerchantResponse, Pattern, PatternAnalysisRequest,
    PatternAnalysisResponse, Transaction, TransactionPage, TransactionQuery, UpdateMerchant,
    UploadFile, UploadTransactionsResponse,
};

use crate::api::AnalyzerApi;
use crate::error::{ApiError, ApiResult};
use crate::notify::{Notification, Notifier};

pub const GET_TRANSACTIONS: &str = "get_transactions";
pub const GET_TRANSACTION: &str = "get_transaction";
pub const UPLOAD_TRANSACTIONS: &str = "upload_transactions";
pub const ANALYZE_TRANSACTIONS: &str = "analyze_transactions";
pub const GET_MERCHANTS: &str = "get_merchants";
pub const GET_MERCHANT: &str = "get_merchant";
pub const CREATE_MERCHANT: &str = "create_merchant";
pub const UPDATE_MERCHANT: &str = "update_merchant";
pub const DEACTIVATE_MERCHANT: &str = "deactivate_merchant";
pub const NORMALIZE_MERCHANT: &str = "normalize_merchant";
pub const GET_ALL_PATTERNS: &str = "get_all_patterns";
pub const GET_PATTERNS_BY_MERCHANT: &str = "get_patterns_by_merchant";
pub const ANALYZE_PATTERNS: &str = "analyze_patterns";

#[derive(Default)]
struct FakeState {
    responses: HashMap<&'static str, Value>,
    failures: HashMap<&'static str, ApiError>,
    calls: HashMap<&'static str, usize>,
    requests: Vec<(&'static str, Value)>,
    delay: Option<Duration>,
}

pub struct FakeApi {
    state: Mutex<FakeState>,
    notifier: Arc<dyn Notifier>,
}

impl FakeApi {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            state: Mutex::new(FakeState::default()),
            notifier,
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Answer `operation` with `body` from now on
    pub fn respond(&self, operation: &'static str, body: Value) -> &Self {
        let mut state = self.state();
        state.failures.remove(operation);
        state.responses.insert(operation, body);
        self
    }

    /// Fail `operation` with `error` from now on
    pub fn fail(&self, operation: &'static str, error: ApiError) -> &Self {
        self.state().failures.insert(operation, error);
        self
    }

    /// Delay every call, to keep requests in flight
    pub fn set_delay(&self, delay: Duration) -> &Self {
        self.state().delay = Some(delay);
        self
    }

    pub fn calls(&self, operation: &str) -> usize {
        self.state().calls.get(operation).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.state().calls.values().sum()
    }

    /// Arguments of the most recent call to `operation`
    pub fn last_request(&self, operation: &str) -> Option<Value> {
        self.state()
            .requests
            .iter()
            .rev()
            .find(|(op, _)| *op == operation)
            .map(|(_, args)| args.clone())
    }

    async fn call<T: DeserializeOwned>(&self, operation: &'static str, args: Value) -> ApiResult<T> {
        let delay = {
            let mut state = self.state();
            *state.calls.entry(operation).or_insert(0) += 1;
            state.requests.push((operation, args));
            state.delay
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let outcome = {
            let state = self.state();
            match state.failures.get(operation) {
                Some(error) => Err(error.clone()),
                None => Ok(state.responses.get(operation).cloned().unwrap_or(Value::Null)),
            }
        };

        let result = outcome.and_then(|body| {
            serde_json::from_value(body)
                .map_err(|e| ApiError::decode(Some(200), format!("Unexpected response from server: {}", e)))
        });

        if let Err(ref error) = result {
            self.notifier.notify(Notification::error("Error", error.message.clone()));
        }
        result
    }
}

fn args<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

#[async_trait]
impl AnalyzerApi for FakeApi {
    async fn get_transactions(&self, params: &TransactionQuery) -> ApiResult<TransactionPage> {
        self.call(GET_TRANSACTIONS, args(params)).await
    }

    async fn get_transaction(&self, id: &str) -> ApiResult<Transaction> {
        self.call(GET_TRANSACTION, json!(id)).await
    }

    async fn upload_transactions(&self, file: UploadFile) -> ApiResult<UploadTransactionsResponse> {
        self.call(UPLOAD_TRANSACTIONS, json!({ "file_name": file.file_name, "size": file.len() }))
            .await
    }

    async fn analyze_transactions(
        &self,
        request: &AnalyzeTransactionsRequest,
    ) -> ApiResult<AnalyzeTransactionsResponse> {
        self.call(ANALYZE_TRANSACTIONS, args(request)).await
    }

    async fn get_merchants(&self, params: &MerchantQuery) -> ApiResult<MerchantPage> {
        self.call(GET_MERCHANTS, args(params)).await
    }

    async fn get_merchant(&self, id: &str) -> ApiResult<Merchant> {
        self.call(GET_MERCHANT, json!(id)).await
    }

    async fn create_merchant(&self, data: &CreateMerchant) -> ApiResult<Merchant> {
        self.call(CREATE_MERCHANT, args(data)).await
    }

    async fn update_merchant(&self, id: &str, data: &UpdateMerchant) -> ApiResult<Merchant> {
        self.call(UPDATE_MERCHANT, json!({ "id": id, "data": args(data) })).await
    }

    async fn deactivate_merchant(&self, id: &str) -> ApiResult<()> {
        self.call(DEACTIVATE_MERCHANT, json!(id)).await
    }

    async fn normalize_merchant(
        &self,
        request: &NormalizeMerchantRequest,
    ) -> ApiResult<NormalizeMerchantResponse> {
        self.call(NORMALIZE_MERCHANT, args(request)).await
    }

    async fn get_all_patterns(&self) -> ApiResult<Vec<Pattern>> {
        self.call(GET_ALL_PATTERNS, Value::Null).await
    }

    async fn get_patterns_by_merchant(&self, merchant_id: &str) -> ApiResult<Vec<Pattern>> {
        self.call(GET_PATTERNS_BY_MERCHANT, json!(merchant_id)).await
    }

    async fn analyze_patterns(&self, request: &PatternAnalysisRequest) -> ApiResult<PatternAnalysisResponse> {
        self.call(ANALYZE_PATTERNS, args(request)).await
    }
}

/// Wire-shaped sample payloads
pub mod fixtures {
    use serde_json::{json, Value};

    pub fn transaction_page(amounts: &[f64]) -> Value {
        let items: Vec<Value> = amounts
            .iter()
            .enumerate()
            .map(|(i, amount)| {
                json!({
                    "id": format!("t{}", i + 1),
                    "description": format!("CARD PURCHASE {}", i + 1),
                    "amount": amount,
                    "date": format!("2024-03-{:02}", i + 1),
                    "merchant": { "id": "m1", "name": "Blue Bottle Coffee", "category": "Food & Drink" },
                    "category": "Food & Drink",
                    "isSubscription": false,
                    "flags": []
                })
            })
            .collect();
        json!({
            "items": items,
            "total": amounts.len(),
            "page": 1,
            "limit": 10,
            "totalPages": 1
        })
    }

    pub fn transaction(id: &str) -> Value {
        json!({
            "id": id,
            "description": "NETFLIX.COM 866-579",
            "amount": -15.99,
            "date": "2024-03-02",
            "analysis": {
                "merchant": { "id": "m2", "name": "Netflix", "category": "Entertainment" },
                "category": "Entertainment",
                "confidence": 0.97,
                "isSubscription": true,
                "flags": ["recurring"]
            },
            "createdAt": "2024-03-02T10:00:00.000Z",
            "updatedAt": "2024-03-02T10:00:00.000Z"
        })
    }

    pub fn merchant(id: &str, name: &str) -> Value {
        json!({
            "id": id,
            "originalName": name.to_uppercase(),
            "normalizedName": name,
            "category": "Food & Drink",
            "confidence": 0.91,
            "isActive": true,
            "flags": [],
            "transactionCount": 4,
            "createdAt": "2024-03-01T00:00:00.000Z",
            "updatedAt": "2024-03-01T00:00:00.000Z"
        })
    }

    pub fn merchant_page(names: &[&str], total: u64) -> Value {
        let items: Vec<Value> = names
            .iter()
            .enumerate()
            .map(|(i, name)| merchant(&format!("m{}", i + 1), name))
            .collect();
        json!({ "items": items, "total": total, "page": 1, "limit": 10, "totalPages": 1 })
    }

    pub fn pattern(id: &str, merchant_id: &str, next_expected: &str) -> Value {
        json!({
            "id": id,
            "type": "SUBSCRIPTION",
            "merchantId": merchant_id,
            "amount": 15.99,
            "frequency": "MONTHLY",
            "confidence": 0.88,
            "nextExpectedDate": next_expected,
            "merchantName": "Netflix",
            "createdAt": "2024-03-01T00:00:00.000Z",
            "updatedAt": "2024-03-01T00:00:00.000Z"
        })
    }

    pub fn upload_response(processed: u64, failed: u64) -> Value {
        json!({
            "normalized_transactions": [{
                "original": "AMZN MKTP US*2K3",
                "normalized": {
                    "merchant": "Amazon",
                    "category": "Shopping",
                    "sub_category": "Online",
                    "confidence": 0.93,
                    "is_subscription": false,
                    "flags": []
                }
            }],
            "detected_patterns": [],
            "processedCount": processed,
            "failedCount": failed,
            "savedResources": { "merchants": [], "transactions": [], "patterns": [] }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::NotificationCenter;

    #[tokio::test]
    async fn test_fake_counts_and_notifies() {
        let center = Arc::new(NotificationCenter::new(10));
        let api = FakeApi::new(center.clone());
        api.respond(GET_TRANSACTIONS, fixtures::transaction_page(&[-1.0, 2.0]));
        api.fail(GET_MERCHANT, ApiError::http(404, "Merchant not found"));

        let page = api.get_transactions(&TransactionQuery::latest(10)).await.unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(api.last_request(GET_TRANSACTIONS).unwrap()["limit"], 10);

        let error = api.get_merchant("m1").await.unwrap_err();
        assert_eq!(error.message, "Merchant not found");
        assert_eq!(api.total_calls(), 2);
        assert_eq!(center.drain().len(), 1);
    }

    #[tokio::test]
    async fn test_fake_deactivate_without_body() {
        let api = FakeApi::new(Arc::new(NotificationCenter::default()));
        api.deactivate_merchant("m1").await.unwrap();
        assert_eq!(api.calls(DEACTIVATE_MERCHANT), 1);
    }
}

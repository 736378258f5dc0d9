//! Data models mirrored from the analysis API
//!
//! Field names follow the API's JSON: entities are camelCase, while the
//! analysis payloads keep the snake_case names the API emits.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::{Frequency, PatternType, SortBy, SortOrder};

// ==================== Shared ====================

/// One page of a paginated list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

impl<T> Page<T> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Parse the leading `YYYY-MM-DD` part of an API date or timestamp
pub fn parse_api_date(value: &str) -> Option<NaiveDate> {
    value
        .get(..10)
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
}

/// A raw transaction submitted for analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionInput {
    pub description: String,
    pub amount: Decimal,
    pub date: String,
}

// ==================== Transactions ====================

/// Merchant reference attached to a transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MerchantRef {
    pub id: String,
    pub name: String,
    pub category: String,
}

/// Server-side analysis of one transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionAnalysis {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant: Option<MerchantRef>,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_category: Option<String>,
    pub confidence: f64,
    pub is_subscription: bool,
    #[serde(default)]
    pub flags: Vec<String>,
}

/// Transaction detail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub description: String,
    pub amount: Decimal,
    pub date: String,
    pub analysis: TransactionAnalysis,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl Transaction {
    /// Get the transaction date as NaiveDate
    pub fn date_naive(&self) -> Option<NaiveDate> {
        parse_api_date(&self.date)
    }

    pub fn is_debit(&self) -> bool {
        self.amount < Decimal::ZERO
    }

    /// Merchant name, falling back to the raw description
    pub fn display_name(&self) -> &str {
        self.analysis
            .merchant
            .as_ref()
            .map(|m| m.name.as_str())
            .unwrap_or(&self.description)
    }
}

/// Row of the paginated transaction list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionListItem {
    pub id: String,
    pub description: String,
    pub amount: Decimal,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant: Option<MerchantRef>,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_category: Option<String>,
    pub is_subscription: bool,
    #[serde(default)]
    pub flags: Vec<String>,
}

impl TransactionListItem {
    pub fn date_naive(&self) -> Option<NaiveDate> {
        parse_api_date(&self.date)
    }

    pub fn display_name(&self) -> &str {
        self.merchant
            .as_ref()
            .map(|m| m.name.as_str())
            .unwrap_or(&self.description)
    }

    pub fn is_debit(&self) -> bool {
        self.amount < Decimal::ZERO
    }
}

pub type TransactionPage = Page<TransactionListItem>;

/// Filters for the transaction list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merchant_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<SortBy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<SortOrder>,
}

impl TransactionQuery {
    /// First page of `limit` rows, newest first
    pub fn latest(limit: u32) -> Self {
        Self {
            page: Some(1),
            limit: Some(limit),
            sort_by: Some(SortBy::Date),
            order: Some(SortOrder::Desc),
            ..Default::default()
        }
    }
}

/// Normalization result for one description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedMerchant {
    pub merchant: String,
    pub category: String,
    #[serde(default)]
    pub sub_category: String,
    pub confidence: f64,
    pub is_subscription: bool,
    #[serde(default)]
    pub flags: Vec<String>,
}

/// A description paired with its normalization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedTransaction {
    pub original: String,
    pub normalized: NormalizedMerchant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeTransactionsRequest {
    pub transactions: Vec<TransactionInput>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeTransactionsResponse {
    #[serde(default)]
    pub normalized_transactions: Vec<NormalizedTransaction>,
    #[serde(default)]
    pub detected_patterns: Vec<DetectedPattern>,
}

/// Merchant persisted by an upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedMerchant {
    pub id: String,
    pub normalized_name: String,
}

/// Transaction persisted by an upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedTransaction {
    pub id: String,
    pub description: String,
}

/// Pattern persisted by an upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedPattern {
    pub id: String,
    #[serde(rename = "type")]
    pub pattern_type: PatternType,
    pub merchant: String,
}

/// Identifiers of everything an upload created
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SavedResources {
    #[serde(default)]
    pub merchants: Vec<SavedMerchant>,
    #[serde(default)]
    pub transactions: Vec<SavedTransaction>,
    #[serde(default)]
    pub patterns: Vec<SavedPattern>,
}

/// Result of a CSV upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadTransactionsResponse {
    #[serde(default)]
    pub normalized_transactions: Vec<NormalizedTransaction>,
    #[serde(default)]
    pub detected_patterns: Vec<DetectedPattern>,
    #[serde(rename = "processedCount")]
    pub processed_count: u64,
    #[serde(rename = "failedCount")]
    pub failed_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
    #[serde(rename = "savedResources", default)]
    pub saved_resources: SavedResources,
}

impl UploadTransactionsResponse {
    /// Row-level errors reported by the server
    pub fn row_errors(&self) -> &[String] {
        self.errors.as_deref().unwrap_or(&[])
    }
}

// ==================== Merchants ====================

/// Normalized merchant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Merchant {
    pub id: String,
    pub original_name: String,
    pub normalized_name: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_category: Option<String>,
    pub confidence: f64,
    pub is_active: bool,
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(default)]
    pub transaction_count: u64,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl Merchant {
    /// Whether normalization changed the raw name
    pub fn was_renamed(&self) -> bool {
        !self.original_name.eq_ignore_ascii_case(&self.normalized_name)
    }
}

pub type MerchantPage = Page<Merchant>;

/// Filters for the merchant list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerchantQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMerchant {
    pub original_name: String,
    pub normalized_name: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_category: Option<String>,
}

/// Partial merchant update; unset fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMerchant {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalized_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizeMerchantRequest {
    pub transaction: TransactionInput,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizeMerchantResponse {
    pub normalized: NormalizedMerchant,
}

// ==================== Patterns ====================

/// Recurring-charge hypothesis stored by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pattern {
    pub id: String,
    #[serde(rename = "type")]
    pub pattern_type: PatternType,
    pub merchant_id: String,
    pub amount: Decimal,
    pub frequency: Frequency,
    pub confidence: f64,
    pub next_expected_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant_name: Option<String>,
}

impl Pattern {
    pub fn next_expected(&self) -> Option<NaiveDate> {
        parse_api_date(&self.next_expected_date)
    }

    /// Days from `today` until the next expected charge (negative when overdue)
    pub fn days_until_next(&self, today: NaiveDate) -> Option<i64> {
        self.next_expected().map(|d| (d - today).num_days())
    }

    pub fn display_name(&self) -> &str {
        self.merchant_name.as_deref().unwrap_or(&self.merchant_id)
    }
}

/// Pattern returned by an analysis run, not yet persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedPattern {
    #[serde(rename = "type")]
    pub pattern_type: PatternType,
    pub merchant: String,
    pub amount: Decimal,
    pub frequency: Frequency,
    pub confidence: f64,
    pub next_expected: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternAnalysisRequest {
    pub transactions: Vec<TransactionInput>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternAnalysisResponse {
    #[serde(default)]
    pub patterns: Vec<DetectedPattern>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_transaction_page_from_api_json() {
        let page: TransactionPage = serde_json::from_value(json!({
            "items": [{
                "id": "t1",
                "description": "NETFLIX.COM 866-579",
                "amount": -15.99,
                "date": "2024-03-02",
                "merchant": { "id": "m1", "name": "Netflix", "category": "Entertainment" },
                "category": "Entertainment",
                "isSubscription": true,
                "flags": ["recurring"]
            }],
            "total": 1,
            "page": 1,
            "limit": 10,
            "totalPages": 1
        }))
        .unwrap();

        let item = &page.items[0];
        assert_eq!(item.display_name(), "Netflix");
        assert!(item.is_subscription);
        assert!(item.is_debit());
        assert_eq!(item.amount, Decimal::new(-1599, 2));
        assert_eq!(item.date_naive(), NaiveDate::from_ymd_opt(2024, 3, 2));
        assert!(!page.has_next());
    }

    #[test]
    fn test_upload_response_mixed_casing() {
        let response: UploadTransactionsResponse = serde_json::from_value(json!({
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
            "detected_patterns": [{
                "type": "SUBSCRIPTION",
                "merchant": "Spotify",
                "amount": 9.99,
                "frequency": "MONTHLY",
                "confidence": 0.88,
                "next_expected": "2024-04-01"
            }],
            "processedCount": 12,
            "failedCount": 1,
            "errors": ["row 7: invalid amount"],
            "savedResources": {
                "merchants": [{ "id": "m1", "normalizedName": "Amazon" }],
                "transactions": [{ "id": "t1", "description": "AMZN MKTP US*2K3" }],
                "patterns": [{ "id": "p1", "type": "SUBSCRIPTION", "merchant": "Spotify" }]
            }
        }))
        .unwrap();

        assert_eq!(response.processed_count, 12);
        assert_eq!(response.failed_count, 1);
        assert_eq!(response.row_errors().len(), 1);
        assert_eq!(response.detected_patterns[0].frequency, Frequency::Monthly);
        assert_eq!(response.saved_resources.merchants[0].normalized_name, "Amazon");
    }

    #[test]
    fn test_transaction_query_skips_unset_fields() {
        let value = serde_json::to_value(TransactionQuery::latest(10)).unwrap();
        assert_eq!(
            value,
            json!({ "page": 1, "limit": 10, "sortBy": "date", "order": "desc" })
        );
    }

    #[test]
    fn test_pattern_days_until_next() {
        let pattern: Pattern = serde_json::from_value(json!({
            "id": "p1",
            "type": "RECURRING",
            "merchantId": "m9",
            "amount": 45.0,
            "frequency": "MONTHLY",
            "confidence": 0.7,
            "nextExpectedDate": "2024-05-10T00:00:00.000Z"
        }))
        .unwrap();

        let today = NaiveDate::from_ymd_opt(2024, 5, 3).unwrap();
        assert_eq!(pattern.days_until_next(today), Some(7));
        assert_eq!(pattern.display_name(), "m9");
    }

    #[test]
    fn test_merchant_was_renamed() {
        let merchant: Merchant = serde_json::from_value(json!({
            "id": "m1",
            "originalName": "SQ *BLUE BOTTLE",
            "normalizedName": "Blue Bottle Coffee",
            "category": "Food & Drink",
            "confidence": 0.91,
            "isActive": true,
            "flags": [],
            "transactionCount": 4
        }))
        .unwrap();
        assert!(merchant.was_renamed());
        assert_eq!(merchant.sub_category, None);
    }
}

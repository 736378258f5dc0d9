//! Composite cache keys
//!
//! A key is a list of segments: the operation name first, then identifiers
//! or canonically serialized parameters. Prefix matching selects families of
//! keys for invalidation and cancellation.

use serde::Serialize;
use txanalyzer_core::{MerchantQuery, TransactionQuery};

pub const TRANSACTIONS: &str = "transactions";
pub const TRANSACTION: &str = "transaction";
pub const MERCHANTS: &str = "merchants";
pub const MERCHANT: &str = "merchant";
pub const PATTERNS: &str = "patterns";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new(root: &str) -> Self {
        Self(vec![root.to_string()])
    }

    pub fn segment(mut self, segment: impl Into<String>) -> Self {
        self.0.push(segment.into());
        self
    }

    /// Append parameters as compact JSON with object keys sorted
    pub fn params<T: Serialize>(self, params: &T) -> Self {
        let canonical = serde_json::to_value(params)
            .map(|value| value.to_string())
            .unwrap_or_else(|_| "null".to_string());
        self.segment(canonical)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn root(&self) -> &str {
        self.0.first().map(String::as_str).unwrap_or_default()
    }

    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl std::fmt::Display for QueryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

/// `["transactions", params]`
pub fn transactions(params: &TransactionQuery) -> QueryKey {
    QueryKey::new(TRANSACTIONS).params(params)
}

/// `["transaction", id]`
pub fn transaction(id: &str) -> QueryKey {
    QueryKey::new(TRANSACTION).segment(id)
}

/// `["merchants", params]`
pub fn merchants(params: &MerchantQuery) -> QueryKey {
    QueryKey::new(MERCHANTS).params(params)
}

/// `["merchant", id]`
pub fn merchant(id: &str) -> QueryKey {
    QueryKey::new(MERCHANT).segment(id)
}

/// `["patterns"]`
pub fn patterns() -> QueryKey {
    QueryKey::new(PATTERNS)
}

/// `["patterns", "merchant", id]`
pub fn patterns_by_merchant(merchant_id: &str) -> QueryKey {
    patterns().segment(MERCHANT).segment(merchant_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use txanalyzer_core::{SortBy, SortOrder};

    #[test]
    fn test_equal_params_give_equal_keys() {
        let a = TransactionQuery::latest(10);
        let b = TransactionQuery {
            order: Some(SortOrder::Desc),
            sort_by: Some(SortBy::Date),
            limit: Some(10),
            page: Some(1),
            ..Default::default()
        };
        assert_eq!(transactions(&a), transactions(&b));
        assert_ne!(transactions(&a), transactions(&TransactionQuery::latest(20)));
    }

    #[test]
    fn test_prefix_matching() {
        let list = transactions(&TransactionQuery::default());
        assert!(list.starts_with(&QueryKey::new(TRANSACTIONS)));
        assert!(!transaction("t1").starts_with(&QueryKey::new(TRANSACTIONS)));
        assert!(patterns_by_merchant("m1").starts_with(&patterns()));
        assert!(!patterns().starts_with(&patterns_by_merchant("m1")));
    }

    #[test]
    fn test_display() {
        assert_eq!(merchant("m1").to_string(), "[merchant, m1]");
        assert_eq!(
            merchants(&MerchantQuery {
                is_active: Some(true),
                ..Default::default()
            })
            .to_string(),
            r#"[merchants, {"isActive":true}]"#
        );
    }
}

//! Display statistics derived from the currently loaded pages
//!
//! Nothing here is persisted or sent back to the API; the numbers only
//! describe what the dashboard has in hand.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use txanalyzer_utils::round2;

use crate::models::{MerchantPage, Pattern, TransactionPage};

/// Summary cards shown at the top of the dashboard
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    /// Sum of absolute amounts on the loaded page, to the cent
    pub total_spend: Decimal,
    /// Rows on the loaded page
    pub transaction_count: usize,
    /// `total_spend / transaction_count`, to the cent; 0 when empty
    pub avg_transaction: Decimal,
    /// Merchant total reported by the loaded merchant page
    pub merchant_count: u64,
}

impl DashboardStats {
    pub fn derive(transactions: Option<&TransactionPage>, merchants: Option<&MerchantPage>) -> Self {
        let (sum, count) = transactions
            .map(|page| {
                let sum: Decimal = page.items.iter().map(|t| t.amount.abs()).sum();
                (sum, page.items.len())
            })
            .unwrap_or((Decimal::ZERO, 0));

        let avg = if count > 0 { sum / Decimal::from(count) } else { Decimal::ZERO };

        Self {
            total_spend: round2(sum),
            transaction_count: count,
            avg_transaction: round2(avg),
            merchant_count: merchants.map(|m| m.total).unwrap_or(0),
        }
    }
}

/// Patterns ordered by next expected charge; undated ones go last
pub fn patterns_by_next_charge(patterns: &[Pattern]) -> Vec<&Pattern> {
    let mut sorted: Vec<&Pattern> = patterns.iter().collect();
    sorted.sort_by_key(|p| (p.next_expected().is_none(), p.next_expected()));
    sorted
}

/// Patterns whose next charge falls within `days` of `today`
pub fn upcoming_patterns(patterns: &[Pattern], today: NaiveDate, days: i64) -> Vec<&Pattern> {
    patterns_by_next_charge(patterns)
        .into_iter()
        .filter(|p| {
            p.days_until_next(today)
                .map_or(false, |d| (0..=days).contains(&d))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Page, TransactionListItem};
    use crate::types::{Frequency, PatternType};

    fn item(id: &str, amount: Decimal) -> TransactionListItem {
        TransactionListItem {
            id: id.to_string(),
            description: format!("tx {}", id),
            amount,
            date: "2024-03-01".to_string(),
            merchant: None,
            category: "Other".to_string(),
            sub_category: None,
            is_subscription: false,
            flags: vec![],
        }
    }

    fn page<T>(items: Vec<T>, total: u64) -> Page<T> {
        Page {
            items,
            total,
            page: 1,
            limit: 10,
            total_pages: 1,
        }
    }

    fn pattern(id: &str, next: &str) -> Pattern {
        Pattern {
            id: id.to_string(),
            pattern_type: PatternType::Subscription,
            merchant_id: "m1".to_string(),
            amount: Decimal::new(999, 2),
            frequency: Frequency::Monthly,
            confidence: 0.9,
            next_expected_date: next.to_string(),
            description: None,
            created_at: String::new(),
            updated_at: String::new(),
            merchant_name: None,
        }
    }

    #[test]
    fn test_stats_over_loaded_page() {
        let transactions = page(
            vec![
                item("a", Decimal::new(-1250, 2)),
                item("b", Decimal::new(3000, 2)),
                item("c", Decimal::new(-725, 2)),
            ],
            57,
        );
        let merchants = page(vec![], 14);

        let stats = DashboardStats::derive(Some(&transactions), Some(&merchants));

        assert_eq!(stats.total_spend, Decimal::new(4975, 2));
        assert_eq!(stats.transaction_count, 3);
        assert_eq!(stats.avg_transaction, Decimal::new(1658, 2));
        assert_eq!(stats.merchant_count, 14);
    }

    #[test]
    fn test_average_rounds_half_away_from_zero() {
        let transactions = page(vec![item("a", Decimal::new(-201, 2)), item("b", Decimal::ZERO)], 2);

        let stats = DashboardStats::derive(Some(&transactions), None);

        assert_eq!(stats.total_spend, Decimal::new(201, 2));
        assert_eq!(stats.avg_transaction, Decimal::new(101, 2));
    }

    #[test]
    fn test_stats_without_data() {
        let stats = DashboardStats::derive(None, None);
        assert_eq!(stats, DashboardStats::default());

        let empty = page(Vec::<TransactionListItem>::new(), 0);
        let stats = DashboardStats::derive(Some(&empty), None);
        assert_eq!(stats.avg_transaction, Decimal::ZERO);
    }

    #[test]
    fn test_stats_serialize_camel_case() {
        let json = serde_json::to_value(DashboardStats::default()).unwrap();
        assert!(json.get("totalSpend").is_some());
        assert!(json.get("avgTransaction").is_some());
    }

    #[test]
    fn test_upcoming_patterns() {
        let patterns = vec![
            pattern("late", "2024-06-30"),
            pattern("soon", "2024-06-03"),
            pattern("undated", "unknown"),
            pattern("past", "2024-05-20"),
        ];
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        let ordered: Vec<&str> = patterns_by_next_charge(&patterns).iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ordered, vec!["past", "soon", "late", "undated"]);

        let upcoming: Vec<&str> = upcoming_patterns(&patterns, today, 7).iter().map(|p| p.id.as_str()).collect();
        assert_eq!(upcoming, vec!["soon"]);
    }
}

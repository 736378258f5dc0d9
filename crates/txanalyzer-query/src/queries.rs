//! Typed reads over the analysis API
//!
//! Each builder returns a [`Query`] with its cache key and options; pass it
//! to [`QueryCache::fetch`] or [`QueryCache::observe`].

use std::sync::Arc;
use std::time::Duration;
use txanalyzer_client::AnalyzerApi;
use txanalyzer_config::CacheConfig;
use txanalyzer_core::{Merchant, MerchantPage, MerchantQuery, Pattern, Transaction, TransactionPage, TransactionQuery};

use crate::cache::{Query, QueryCache, QueryOptions};
use crate::key;

/// How long each family of reads stays fresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaleTimes {
    pub transactions: Duration,
    pub merchants: Duration,
    pub patterns: Duration,
}

impl Default for StaleTimes {
    fn default() -> Self {
        Self {
            transactions: Duration::ZERO,
            merchants: Duration::from_secs(5 * 60),
            patterns: Duration::from_secs(5 * 60),
        }
    }
}

impl From<&CacheConfig> for StaleTimes {
    fn from(config: &CacheConfig) -> Self {
        Self {
            transactions: config.transactions_stale_time(),
            merchants: config.merchants_stale_time(),
            patterns: config.patterns_stale_time(),
        }
    }
}

/// Query builders bound to one API and one cache
#[derive(Clone)]
pub struct Queries {
    api: Arc<dyn AnalyzerApi>,
    cache: Arc<QueryCache>,
    stale: StaleTimes,
}

impl Queries {
    pub fn new(api: Arc<dyn AnalyzerApi>, cache: Arc<QueryCache>, stale: StaleTimes) -> Self {
        Self { api, cache, stale }
    }

    pub fn api(&self) -> &Arc<dyn AnalyzerApi> {
        &self.api
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    pub fn transactions(&self, params: &TransactionQuery) -> Query<TransactionPage> {
        let api = Arc::clone(&self.api);
        let params = params.clone();
        Query::new(
            key::transactions(&params),
            QueryOptions::default().stale_time(self.stale.transactions),
            move || {
                let api = Arc::clone(&api);
                let params = params.clone();
                async move { api.get_transactions(&params).await }
            },
        )
    }

    /// Disabled when `id` is empty
    pub fn transaction(&self, id: &str) -> Query<Transaction> {
        let api = Arc::clone(&self.api);
        let id = id.to_string();
        Query::new(
            key::transaction(&id),
            QueryOptions::default()
                .stale_time(self.stale.transactions)
                .enabled(!id.is_empty()),
            move || {
                let api = Arc::clone(&api);
                let id = id.clone();
                async move { api.get_transaction(&id).await }
            },
        )
    }

    pub fn merchants(&self, params: &MerchantQuery) -> Query<MerchantPage> {
        let api = Arc::clone(&self.api);
        let params = params.clone();
        Query::new(
            key::merchants(&params),
            QueryOptions::default().stale_time(self.stale.merchants),
            move || {
                let api = Arc::clone(&api);
                let params = params.clone();
                async move { api.get_merchants(&params).await }
            },
        )
    }

    /// Disabled when `id` is empty
    pub fn merchant(&self, id: &str) -> Query<Merchant> {
        let api = Arc::clone(&self.api);
        let id = id.to_string();
        Query::new(
            key::merchant(&id),
            QueryOptions::default()
                .stale_time(self.stale.merchants)
                .enabled(!id.is_empty()),
            move || {
                let api = Arc::clone(&api);
                let id = id.clone();
                async move { api.get_merchant(&id).await }
            },
        )
    }

    /// Not refetched on focus
    pub fn patterns(&self) -> Query<Vec<Pattern>> {
        let api = Arc::clone(&self.api);
        Query::new(
            key::patterns(),
            QueryOptions::default()
                .stale_time(self.stale.patterns)
                .refetch_on_focus(false),
            move || {
                let api = Arc::clone(&api);
                async move { api.get_all_patterns().await }
            },
        )
    }

    /// Disabled when `merchant_id` is empty
    pub fn patterns_by_merchant(&self, merchant_id: &str) -> Query<Vec<Pattern>> {
        let api = Arc::clone(&self.api);
        let merchant_id = merchant_id.to_string();
        Query::new(
            key::patterns_by_merchant(&merchant_id),
            QueryOptions::default()
                .stale_time(self.stale.patterns)
                .enabled(!merchant_id.is_empty()),
            move || {
                let api = Arc::clone(&api);
                let merchant_id = merchant_id.clone();
                async move { api.get_patterns_by_merchant(&merchant_id).await }
            },
        )
    }
}

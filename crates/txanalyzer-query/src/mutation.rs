//! Writes against the analysis API and their cache side effects
//!
//! A [`Mutation`] drives one [`MutationSpec`] through
//! `idle -> pending -> success | error`, calling its hooks in order:
//! `on_mutate` before the call, then `on_success` or `on_error`, then
//! `on_settled`. Cached reads are only ever invalidated, never patched.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};
use txanalyzer_client::{AnalyzerApi, ApiError, ApiResult};
use txanalyzer_core::{
    AnalyzeTransactionsRequest, AnalyzeTransactionsResponse, CreateMerchant, Merchant, PatternAnalysisRequest,
    PatternAnalysisResponse, UpdateMerchant, UploadFile, UploadTransactionsResponse,
};

use crate::cache::QueryCache;
use crate::key::{self, QueryKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationStatus {
    Idle,
    Pending,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MutationState<T> {
    pub status: MutationStatus,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T> Default for MutationState<T> {
    fn default() -> Self {
        Self {
            status: MutationStatus::Idle,
            data: None,
            error: None,
        }
    }
}

/// One kind of write, with hooks around the call
#[async_trait]
pub trait MutationSpec: Send + Sync {
    type Variables: Send + Sync;
    type Output: Clone + Send + Sync;
    /// Captured by `on_mutate`, handed to the later hooks
    type Context: Send + Sync;

    async fn mutate(&self, variables: &Self::Variables) -> ApiResult<Self::Output>;

    fn on_mutate(&self, variables: &Self::Variables) -> Self::Context;

    fn on_success(&self, _output: &Self::Output, _variables: &Self::Variables, _context: &Self::Context) {}

    fn on_error(&self, _error: &ApiError, _variables: &Self::Variables, _context: Self::Context) {}

    fn on_settled(&self, _variables: &Self::Variables) {}
}

pub struct Mutation<M: MutationSpec> {
    spec: M,
    state: Mutex<MutationState<M::Output>>,
}

impl<M: MutationSpec> Mutation<M> {
    pub fn new(spec: M) -> Self {
        Self {
            spec,
            state: Mutex::new(MutationState::default()),
        }
    }

    fn state_guard(&self) -> MutexGuard<'_, MutationState<M::Output>> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn state(&self) -> MutationState<M::Output> {
        self.state_guard().clone()
    }

    pub fn status(&self) -> MutationStatus {
        self.state_guard().status
    }

    pub fn is_pending(&self) -> bool {
        self.status() == MutationStatus::Pending
    }

    /// Back to idle, forgetting the last outcome
    pub fn reset(&self) {
        *self.state_guard() = MutationState::default();
    }

    /// Run the write; the error, if any, is returned after the hooks ran
    pub async fn mutate(&self, variables: M::Variables) -> ApiResult<M::Output> {
        {
            let mut state = self.state_guard();
            state.status = MutationStatus::Pending;
            state.error = None;
        }

        let context = self.spec.on_mutate(&variables);
        let result = self.spec.mutate(&variables).await;

        match &result {
            Ok(output) => self.spec.on_success(output, &variables, &context),
            Err(error) => self.spec.on_error(error, &variables, context),
        }
        self.spec.on_settled(&variables);

        {
            let mut state = self.state_guard();
            match &result {
                Ok(output) => {
                    state.status = MutationStatus::Success;
                    state.data = Some(output.clone());
                }
                Err(error) => {
                    state.status = MutationStatus::Error;
                    state.error = Some(error.clone());
                }
            }
        }
        result
    }
}

// ==================== Upload ====================

/// CSV upload: cancels list fetches, rolls back on failure and
/// invalidates every read the upload can change
pub struct UploadTransactions {
    api: Arc<dyn AnalyzerApi>,
    cache: Arc<QueryCache>,
}

impl UploadTransactions {
    pub fn new(api: Arc<dyn AnalyzerApi>, cache: Arc<QueryCache>) -> Self {
        Self { api, cache }
    }
}

#[async_trait]
impl MutationSpec for UploadTransactions {
    type Variables = UploadFile;
    type Output = UploadTransactionsResponse;
    type Context = Vec<(QueryKey, Value)>;

    async fn mutate(&self, file: &UploadFile) -> ApiResult<UploadTransactionsResponse> {
        self.api.upload_transactions(file.clone()).await
    }

    fn on_mutate(&self, file: &UploadFile) -> Self::Context {
        let transactions = QueryKey::new(key::TRANSACTIONS);
        let cancelled = self.cache.cancel_queries(&transactions);
        log::info!(
            target: "txanalyzer::query",
            "uploading {} ({} bytes), cancelled {} transaction fetches",
            file.file_name,
            file.len(),
            cancelled
        );
        self.cache.snapshot(&transactions)
    }

    fn on_success(&self, output: &UploadTransactionsResponse, file: &UploadFile, _context: &Self::Context) {
        log::info!(
            target: "txanalyzer::query",
            "upload of {} processed {} rows, {} failed",
            file.file_name,
            output.processed_count,
            output.failed_count
        );
        self.cache.invalidate_queries(&QueryKey::new(key::TRANSACTIONS));
        self.cache.invalidate_queries(&QueryKey::new(key::MERCHANTS));
        self.cache.invalidate_queries(&QueryKey::new(key::PATTERNS));
    }

    fn on_error(&self, error: &ApiError, file: &UploadFile, snapshot: Self::Context) {
        log::error!(target: "txanalyzer::query", "upload of {} failed: {}", file.file_name, error);
        if !snapshot.is_empty() {
            self.cache.restore(snapshot);
        }
    }

    fn on_settled(&self, _file: &UploadFile) {
        self.cache.invalidate_queries(&QueryKey::new(key::TRANSACTIONS));
    }
}

// ==================== Analyze ====================

/// Ad-hoc analysis; leaves the cache alone
pub struct AnalyzeTransactions {
    api: Arc<dyn AnalyzerApi>,
}

impl AnalyzeTransactions {
    pub fn new(api: Arc<dyn AnalyzerApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl MutationSpec for AnalyzeTransactions {
    type Variables = AnalyzeTransactionsRequest;
    type Output = AnalyzeTransactionsResponse;
    type Context = ();

    async fn mutate(&self, request: &AnalyzeTransactionsRequest) -> ApiResult<AnalyzeTransactionsResponse> {
        self.api.analyze_transactions(request).await
    }

    fn on_mutate(&self, _request: &AnalyzeTransactionsRequest) {}

    fn on_error(&self, error: &ApiError, request: &AnalyzeTransactionsRequest, _context: ()) {
        log::error!(
            target: "txanalyzer::query",
            "analysis of {} transactions failed: {}",
            request.transactions.len(),
            error
        );
    }
}

/// Pattern detection over submitted transactions; nothing is persisted
pub struct AnalyzePatterns {
    api: Arc<dyn AnalyzerApi>,
}

impl AnalyzePatterns {
    pub fn new(api: Arc<dyn AnalyzerApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl MutationSpec for AnalyzePatterns {
    type Variables = PatternAnalysisRequest;
    type Output = PatternAnalysisResponse;
    type Context = ();

    async fn mutate(&self, request: &PatternAnalysisRequest) -> ApiResult<PatternAnalysisResponse> {
        self.api.analyze_patterns(request).await
    }

    fn on_mutate(&self, _request: &PatternAnalysisRequest) {}

    fn on_success(&self, output: &PatternAnalysisResponse, request: &PatternAnalysisRequest, _context: &()) {
        log::info!(
            target: "txanalyzer::query",
            "pattern analysis over {} transactions found {} patterns",
            request.transactions.len(),
            output.patterns.len()
        );
    }

    fn on_error(&self, error: &ApiError, request: &PatternAnalysisRequest, _context: ()) {
        log::error!(
            target: "txanalyzer::query",
            "pattern analysis of {} transactions failed: {}",
            request.transactions.len(),
            error
        );
    }
}

// ==================== Merchants ====================

fn invalidate_merchant(cache: &QueryCache, id: &str) {
    cache.invalidate_queries(&QueryKey::new(key::MERCHANTS));
    cache.invalidate_queries(&key::merchant(id));
}

pub struct CreateMerchantMutation {
    api: Arc<dyn AnalyzerApi>,
    cache: Arc<QueryCache>,
}

impl CreateMerchantMutation {
    pub fn new(api: Arc<dyn AnalyzerApi>, cache: Arc<QueryCache>) -> Self {
        Self { api, cache }
    }
}

#[async_trait]
impl MutationSpec for CreateMerchantMutation {
    type Variables = CreateMerchant;
    type Output = Merchant;
    type Context = ();

    async fn mutate(&self, data: &CreateMerchant) -> ApiResult<Merchant> {
        self.api.create_merchant(data).await
    }

    fn on_mutate(&self, _data: &CreateMerchant) {}

    fn on_success(&self, merchant: &Merchant, _data: &CreateMerchant, _context: &()) {
        log::info!(target: "txanalyzer::query", "created merchant {}", merchant.id);
        invalidate_merchant(&self.cache, &merchant.id);
    }

    fn on_settled(&self, _data: &CreateMerchant) {
        self.cache.invalidate_queries(&key::patterns());
    }
}

/// Id and fields of a merchant update
#[derive(Debug, Clone, PartialEq)]
pub struct MerchantUpdate {
    pub id: String,
    pub data: UpdateMerchant,
}

pub struct UpdateMerchantMutation {
    api: Arc<dyn AnalyzerApi>,
    cache: Arc<QueryCache>,
}

impl UpdateMerchantMutation {
    pub fn new(api: Arc<dyn AnalyzerApi>, cache: Arc<QueryCache>) -> Self {
        Self { api, cache }
    }
}

#[async_trait]
impl MutationSpec for UpdateMerchantMutation {
    type Variables = MerchantUpdate;
    type Output = Merchant;
    type Context = ();

    async fn mutate(&self, update: &MerchantUpdate) -> ApiResult<Merchant> {
        self.api.update_merchant(&update.id, &update.data).await
    }

    fn on_mutate(&self, _update: &MerchantUpdate) {}

    fn on_success(&self, _merchant: &Merchant, update: &MerchantUpdate, _context: &()) {
        log::info!(target: "txanalyzer::query", "updated merchant {}", update.id);
        invalidate_merchant(&self.cache, &update.id);
    }

    fn on_settled(&self, _update: &MerchantUpdate) {
        self.cache.invalidate_queries(&key::patterns());
    }
}

pub struct DeactivateMerchantMutation {
    api: Arc<dyn AnalyzerApi>,
    cache: Arc<QueryCache>,
}

impl DeactivateMerchantMutation {
    pub fn new(api: Arc<dyn AnalyzerApi>, cache: Arc<QueryCache>) -> Self {
        Self { api, cache }
    }
}

#[async_trait]
impl MutationSpec for DeactivateMerchantMutation {
    type Variables = String;
    type Output = ();
    type Context = ();

    async fn mutate(&self, id: &String) -> ApiResult<()> {
        self.api.deactivate_merchant(id).await
    }

    fn on_mutate(&self, _id: &String) {}

    fn on_success(&self, _output: &(), id: &String, _context: &()) {
        log::info!(target: "txanalyzer::query", "deactivated merchant {}", id);
        invalidate_merchant(&self.cache, id);
    }

    fn on_settled(&self, _id: &String) {
        self.cache.invalidate_queries(&key::patterns());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::{Queries, StaleTimes};
    use serde_json::json;
    use std::time::Duration;
    use txanalyzer_client::testing::{
        fixtures, FakeApi, DEACTIVATE_MERCHANT, GET_ALL_PATTERNS, GET_MERCHANTS, GET_TRANSACTIONS,
        UPLOAD_TRANSACTIONS,
    };
    use txanalyzer_client::NotificationCenter;
    use txanalyzer_core::{MerchantQuery, TransactionPage, TransactionQuery};

    struct Setup {
        api: Arc<FakeApi>,
        queries: Queries,
        center: Arc<NotificationCenter>,
    }

    fn setup() -> Setup {
        let center = Arc::new(NotificationCenter::default());
        let api = Arc::new(FakeApi::new(center.clone()));
        api.respond(GET_TRANSACTIONS, fixtures::transaction_page(&[-12.5, 30.0]));
        api.respond(GET_MERCHANTS, fixtures::merchant_page(&["Netflix"], 1));
        api.respond(GET_ALL_PATTERNS, json!([fixtures::pattern("p1", "m1", "2024-04-01")]));
        let queries = Queries::new(api.clone(), Arc::new(QueryCache::new()), StaleTimes::default());
        Setup { api, queries, center }
    }

    async fn warm(queries: &Queries) -> (QueryKey, QueryKey, QueryKey) {
        let transactions = queries.transactions(&TransactionQuery::latest(10));
        let merchants = queries.merchants(&MerchantQuery::default());
        let patterns = queries.patterns();
        queries.cache().fetch(&transactions).await.unwrap();
        queries.cache().fetch(&merchants).await.unwrap();
        queries.cache().fetch(&patterns).await.unwrap();
        (transactions.key().clone(), merchants.key().clone(), patterns.key().clone())
    }

    fn upload(queries: &Queries) -> Mutation<UploadTransactions> {
        Mutation::new(UploadTransactions::new(queries.api().clone(), queries.cache().clone()))
    }

    #[tokio::test]
    async fn test_successful_upload_invalidates_each_family_once() {
        let Setup { api, queries, .. } = setup();
        api.respond(UPLOAD_TRANSACTIONS, fixtures::upload_response(2, 0));
        let (transactions, merchants, patterns) = warm(&queries).await;
        let mutation = upload(&queries);
        assert_eq!(mutation.status(), MutationStatus::Idle);

        let response = mutation.mutate(UploadFile::new("march.csv", "a,b\n")).await.unwrap();

        assert_eq!(response.processed_count, 2);
        assert_eq!(mutation.status(), MutationStatus::Success);
        let cache = queries.cache();
        assert_eq!(cache.invalidation_count(&transactions), 1);
        assert_eq!(cache.invalidation_count(&merchants), 1);
        assert_eq!(cache.invalidation_count(&patterns), 1);
    }

    #[tokio::test]
    async fn test_failed_upload_restores_snapshot() {
        let Setup { api, queries, center } = setup();
        api.fail(UPLOAD_TRANSACTIONS, ApiError::http(400, "CSV is missing an amount column"));
        let (transactions, merchants, _) = warm(&queries).await;
        let before: TransactionPage = queries.cache().get_query_data(&transactions).unwrap();
        center.drain();

        let error = upload(&queries)
            .mutate(UploadFile::new("march.csv", "a,b\n"))
            .await
            .unwrap_err();

        assert_eq!(error.message, "CSV is missing an amount column");
        let after: TransactionPage = queries.cache().get_query_data(&transactions).unwrap();
        assert_eq!(after, before);
        assert_eq!(queries.cache().invalidation_count(&merchants), 0);
        assert!(queries.cache().is_invalidated(&transactions));
        assert_eq!(center.drain().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_upload_without_cache_leaves_it_empty() {
        let Setup { api, queries, .. } = setup();
        api.fail(UPLOAD_TRANSACTIONS, ApiError::network("connection refused"));
        let mutation = upload(&queries);

        assert!(mutation.mutate(UploadFile::new("march.csv", "")).await.is_err());

        assert!(queries.cache().is_empty());
        let state = mutation.state();
        assert_eq!(state.status, MutationStatus::Error);
        assert_eq!(state.error.map(|e| e.status), Some(None));
    }

    #[tokio::test(start_paused = true)]
    async fn test_upload_cancels_running_list_fetch() {
        let Setup { api, queries, .. } = setup();
        api.respond(UPLOAD_TRANSACTIONS, fixtures::upload_response(1, 0));
        api.set_delay(Duration::from_secs(5));
        let list = queries.transactions(&TransactionQuery::latest(10));

        assert!(queries.cache().observe(&list).is_loading());
        assert!(queries.cache().is_fetching(list.key()));

        upload(&queries).mutate(UploadFile::new("march.csv", "")).await.unwrap();

        assert!(!queries.cache().is_fetching(list.key()));
        assert_eq!(queries.cache().get_query_data::<TransactionPage>(list.key()), None);
    }

    #[tokio::test]
    async fn test_deactivate_invalidates_merchant_and_patterns() {
        let Setup { api, queries, .. } = setup();
        api.respond(txanalyzer_client::testing::GET_MERCHANT, fixtures::merchant("m1", "Netflix"));
        let (_, merchants, patterns) = warm(&queries).await;
        let detail = queries.merchant("m1");
        queries.cache().fetch(&detail).await.unwrap();

        let mutation = Mutation::new(DeactivateMerchantMutation::new(
            queries.api().clone(),
            queries.cache().clone(),
        ));
        mutation.mutate("m1".to_string()).await.unwrap();

        assert_eq!(api.calls(DEACTIVATE_MERCHANT), 1);
        assert!(queries.cache().is_invalidated(&merchants));
        assert!(queries.cache().is_invalidated(detail.key()));
        assert!(queries.cache().is_invalidated(&patterns));
    }

    #[tokio::test]
    async fn test_failed_merchant_update_still_invalidates_patterns() {
        let Setup { api, queries, .. } = setup();
        api.fail(txanalyzer_client::testing::UPDATE_MERCHANT, ApiError::http(404, "Merchant not found"));
        let (_, merchants, patterns) = warm(&queries).await;

        let mutation = Mutation::new(UpdateMerchantMutation::new(queries.api().clone(), queries.cache().clone()));
        let update = MerchantUpdate {
            id: "m404".to_string(),
            data: UpdateMerchant {
                category: Some("Shopping".to_string()),
                ..Default::default()
            },
        };
        assert!(mutation.mutate(update).await.is_err());

        assert!(!queries.cache().is_invalidated(&merchants));
        assert!(queries.cache().is_invalidated(&patterns));
    }

    #[tokio::test]
    async fn test_analyze_leaves_cache_untouched() {
        let Setup { api, queries, .. } = setup();
        api.respond(
            txanalyzer_client::testing::ANALYZE_TRANSACTIONS,
            json!({ "normalized_transactions": [], "detected_patterns": [] }),
        );
        let (transactions, _, _) = warm(&queries).await;

        let mutation = Mutation::new(AnalyzeTransactions::new(queries.api().clone()));
        let request = AnalyzeTransactionsRequest { transactions: vec![] };
        mutation.mutate(request).await.unwrap();

        assert_eq!(queries.cache().invalidation_count(&transactions), 0);
    }

    #[tokio::test]
    async fn test_pattern_analysis_leaves_cache_untouched() {
        let Setup { api, queries, .. } = setup();
        api.respond(
            txanalyzer_client::testing::ANALYZE_PATTERNS,
            json!({ "patterns": [{
                "type": "SUBSCRIPTION",
                "merchant": "Spotify",
                "amount": 9.99,
                "frequency": "MONTHLY",
                "confidence": 0.88,
                "next_expected": "2024-04-01"
            }] }),
        );
        let (_, _, patterns) = warm(&queries).await;

        let mutation = Mutation::new(AnalyzePatterns::new(queries.api().clone()));
        let response = mutation
            .mutate(PatternAnalysisRequest { transactions: vec![] })
            .await
            .unwrap();

        assert_eq!(response.patterns.len(), 1);
        assert_eq!(mutation.status(), MutationStatus::Success);
        assert_eq!(queries.cache().invalidation_count(&patterns), 0);
    }
}

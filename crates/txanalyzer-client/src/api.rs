//! The operations offered by the analysis API

use async_trait::async_trait;
use txanalyzer_core::{
    AnalyzeTransactionsRequest, AnalyzeTransactionsResponse, CreateMerchant, Merchant, MerchantPage,
    MerchantQuery, NormalizeMerchantRequest, NormalizeMerchantResponse, Pattern, PatternAnalysisRequest,
    PatternAnalysisResponse, Transaction, TransactionPage, TransactionQuery, UpdateMerchant,
    UploadFile, UploadTransactionsResponse,
};

use crate::error::ApiResult;

/// One method per server operation
///
/// Implementations must raise exactly one user-visible notification for
/// each call that fails, before returning the error.
#[async_trait]
pub trait AnalyzerApi: Send + Sync {
    // Transactions
    async fn get_transactions(&self, params: &TransactionQuery) -> ApiResult<TransactionPage>;
    async fn get_transaction(&self, id: &str) -> ApiResult<Transaction>;
    async fn upload_transactions(&self, file: UploadFile) -> ApiResult<UploadTransactionsResponse>;
    async fn analyze_transactions(
        &self,
        request: &AnalyzeTransactionsRequest,
    ) -> ApiResult<AnalyzeTransactionsResponse>;

    // Merchants
    async fn get_merchants(&self, params: &MerchantQuery) -> ApiResult<MerchantPage>;
    async fn get_merchant(&self, id: &str) -> ApiResult<Merchant>;
    async fn create_merchant(&self, data: &CreateMerchant) -> ApiResult<Merchant>;
    async fn update_merchant(&self, id: &str, data: &UpdateMerchant) -> ApiResult<Merchant>;
    async fn deactivate_merchant(&self, id: &str) -> ApiResult<()>;
    async fn normalize_merchant(
        &self,
        request: &NormalizeMerchantRequest,
    ) -> ApiResult<NormalizeMerchantResponse>;

    // Patterns
    async fn get_all_patterns(&self) -> ApiResult<Vec<Pattern>>;
    async fn get_patterns_by_merchant(&self, merchant_id: &str) -> ApiResult<Vec<Pattern>>;
    async fn analyze_patterns(&self, request: &PatternAnalysisRequest) -> ApiResult<PatternAnalysisResponse>;
}

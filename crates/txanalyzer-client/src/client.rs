//! reqwest implementation of [`AnalyzerApi`]

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use txanalyzer_core::{
    AnalyzeTransactionsRequest, AnalyzeTransactionsResponse, CreateMerchant, Merchant, MerchantPage,
    MerchantQuery, NormalizeMerchantRequest, NormalizeMerchantResponse, Pattern, PatternAnalysisRequest,
    PatternAnalysisResponse, Transaction, TransactionPage, TransactionQuery, UpdateMerchant,
    UploadFile, UploadTransactionsResponse,
};

use crate::api::AnalyzerApi;
use crate::error::{ApiError, ApiResult};
use crate::notify::{Notification, Notifier};

/// API client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub user_agent: String,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            user_agent: format!("txanalyzer/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl From<&txanalyzer_config::ApiConfig> for ClientConfig {
    fn from(config: &txanalyzer_config::ApiConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            user_agent: config.user_agent.clone(),
        }
    }
}

/// HTTP client for the analysis API
pub struct ApiClient {
    base_url: String,
    http: Client,
    notifier: Arc<dyn Notifier>,
}

impl ApiClient {
    pub fn new(config: ClientConfig, notifier: Arc<dyn Notifier>) -> ApiResult<Self> {
        let http = Client::builder()
            .user_agent(config.user_agent)
            .build()
            .map_err(|e| ApiError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            notifier,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// URL with one percent-encoded trailing path segment
    fn url_with_id(&self, path: &str, id: &str) -> String {
        format!("{}{}/{}", self.base_url, path, urlencoding::encode(id))
    }

    async fn send(&self, request: RequestBuilder) -> ApiResult<(u16, bytes::Bytes)> {
        let response = request.send().await.map_err(|e| {
            log::debug!(target: "txanalyzer::client", "transport error: {}", e);
            ApiError::from(e)
        })?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| {
            log::debug!(target: "txanalyzer::client", "failed to read body: {}", e);
            ApiError::from(e)
        })?;

        if status >= 400 {
            return Err(ApiError::from_response(status, &body));
        }
        Ok((status, body))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        let (status, body) = self.send(request).await?;
        serde_json::from_slice(&body).map_err(|e| {
            log::debug!(target: "txanalyzer::client", "unexpected response body: {}", e);
            ApiError::decode(Some(status), format!("Unexpected response from server: {}", e))
        })
    }

    /// Report a failed call exactly once, then hand the result back
    fn finish<T>(&self, operation: &str, result: ApiResult<T>) -> ApiResult<T> {
        if let Err(ref error) = result {
            log::error!(
                target: "txanalyzer::client",
                "{} failed [{}] status={:?}: {}",
                operation,
                error.kind,
                error.status,
                error.message
            );
            self.notifier.notify(Notification::error("Error", error.message.clone()));
        }
        result
    }
}

#[async_trait]
impl AnalyzerApi for ApiClient {
    async fn get_transactions(&self, params: &TransactionQuery) -> ApiResult<TransactionPage> {
        let request = self.http.get(self.url("/api/transactions")).query(params);
        let result = self.send_json(request).await;
        self.finish("get_transactions", result)
    }

    async fn get_transaction(&self, id: &str) -> ApiResult<Transaction> {
        let request = self.http.get(self.url_with_id("/api/transactions", id));
        let result = self.send_json(request).await;
        self.finish("get_transaction", result)
    }

    async fn upload_transactions(&self, file: UploadFile) -> ApiResult<UploadTransactionsResponse> {
        let url = self.url("/api/transactions/upload");
        let result = async {
            let part = Part::bytes(file.bytes.to_vec())
                .file_name(file.file_name.clone())
                .mime_str(file.mime())
                .map_err(|e| ApiError::network(format!("Invalid upload content type: {}", e)))?;
            let form = Form::new().part("file", part);
            self.send_json(self.http.post(url).multipart(form)).await
        }
        .await;
        self.finish("upload_transactions", result)
    }

    async fn analyze_transactions(
        &self,
        request: &AnalyzeTransactionsRequest,
    ) -> ApiResult<AnalyzeTransactionsResponse> {
        let builder = self.http.post(self.url("/api/transactions/analyze")).json(request);
        let result = self.send_json(builder).await;
        self.finish("analyze_transactions", result)
    }

    async fn get_merchants(&self, params: &MerchantQuery) -> ApiResult<MerchantPage> {
        let request = self.http.get(self.url("/api/merchants")).query(params);
        let result = self.send_json(request).await;
        self.finish("get_merchants", result)
    }

    async fn get_merchant(&self, id: &str) -> ApiResult<Merchant> {
        let request = self.http.get(self.url_with_id("/api/merchants", id));
        let result = self.send_json(request).await;
        self.finish("get_merchant", result)
    }

    async fn create_merchant(&self, data: &CreateMerchant) -> ApiResult<Merchant> {
        let request = self.http.post(self.url("/api/merchants")).json(data);
        let result = self.send_json(request).await;
        self.finish("create_merchant", result)
    }

    async fn update_merchant(&self, id: &str, data: &UpdateMerchant) -> ApiResult<Merchant> {
        let request = self.http.put(self.url_with_id("/api/merchants", id)).json(data);
        let result = self.send_json(request).await;
        self.finish("update_merchant", result)
    }

    async fn deactivate_merchant(&self, id: &str) -> ApiResult<()> {
        let request = self.http.delete(self.url_with_id("/api/merchants", id));
        let result = self.send(request).await.map(|_| ());
        self.finish("deactivate_merchant", result)
    }

    async fn normalize_merchant(
        &self,
        request: &NormalizeMerchantRequest,
    ) -> ApiResult<NormalizeMerchantResponse> {
        let builder = self.http.post(self.url("/api/merchants/normalize")).json(request);
        let result = self.send_json(builder).await;
        self.finish("normalize_merchant", result)
    }

    async fn get_all_patterns(&self) -> ApiResult<Vec<Pattern>> {
        let request = self.http.get(self.url("/api/patterns"));
        let result = self.send_json(request).await;
        self.finish("get_all_patterns", result)
    }

    async fn get_patterns_by_merchant(&self, merchant_id: &str) -> ApiResult<Vec<Pattern>> {
        let request = self.http.get(self.url_with_id("/api/patterns/merchant", merchant_id));
        let result = self.send_json(request).await;
        self.finish("get_patterns_by_merchant", result)
    }

    async fn analyze_patterns(&self, request: &PatternAnalysisRequest) -> ApiResult<PatternAnalysisResponse> {
        let builder = self.http.post(self.url("/api/patterns/analyze")).json(request);
        let result = self.send_json(builder).await;
        self.finish("analyze_patterns", result)
    }
}

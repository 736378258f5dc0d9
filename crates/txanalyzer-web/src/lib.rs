//! Dashboard server with HTMX support
//!
//! Routes are organized into modules:
//! - routes::dashboard: Dashboard page and its polling sections
//! - routes::merchants: Merchant detail page and merchant writes
//! - routes::transactions: Transaction detail page and ad-hoc analysis
//! - routes::upload: CSV upload dialog and submission
//! - routes::notifications: Toast feed
//! - routes::focus: Focus-regained refetch
//! - routes::settings: Effective configuration

pub mod components;
pub mod error;
pub mod routes;

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderMap, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use txanalyzer_client::{AnalyzerApi, NotificationCenter};
use txanalyzer_config::Config;
use txanalyzer_core::{MerchantQuery, TransactionQuery};
use txanalyzer_query::{Queries, QueryCache, StaleTimes};

pub use error::WebError;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub queries: Queries,
    pub notifications: Arc<NotificationCenter>,
}

impl AppState {
    pub fn new(config: Config, api: Arc<dyn AnalyzerApi>, notifications: Arc<NotificationCenter>) -> Self {
        let cache = Arc::new(QueryCache::with_gc_time(config.cache.gc_time()));
        let queries = Queries::new(api, cache, StaleTimes::from(&config.cache));
        Self {
            config: Arc::new(config),
            queries,
            notifications,
        }
    }

    pub fn api(&self) -> &Arc<dyn AnalyzerApi> {
        self.queries.api()
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        self.queries.cache()
    }

    /// Latest transactions shown on the dashboard
    pub fn dashboard_transactions(&self) -> TransactionQuery {
        TransactionQuery::latest(self.config.dashboard.page_size)
    }

    /// First merchant page shown on the dashboard
    pub fn dashboard_merchants(&self) -> MerchantQuery {
        MerchantQuery {
            page: Some(1),
            limit: Some(self.config.dashboard.page_size),
            is_active: self.config.dashboard.merchants_active_only.then_some(true),
            category: None,
        }
    }
}

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let upload_limit = state.config.dashboard.max_upload_bytes;
    use routes::dashboard::{htmx_merchants, htmx_patterns, htmx_stats, htmx_transactions, page_dashboard};
    use routes::focus::api_focus;
    use routes::merchants::{
        api_create_merchant, api_deactivate_merchant, api_normalize_merchant, api_update_merchant,
        page_merchant_detail,
    };
    use routes::notifications::htmx_notifications;
    use routes::settings::{api_settings, page_settings};
    use routes::transactions::{api_analyze, api_analyze_patterns, page_transaction_detail};
    use routes::upload::{htmx_upload_dialog, htmx_upload_submit};

    Router::new()
        // API endpoints
        .route("/api/health", get(health_check))
        .route("/api/settings", get(api_settings))
        .route("/api/focus", post(api_focus))
        .route("/api/notifications", get(htmx_notifications))
        .route("/api/analyze", post(api_analyze))
        .route("/api/patterns/analyze", post(api_analyze_patterns))
        .route("/api/merchants", post(api_create_merchant))
        .route("/api/merchants/normalize", post(api_normalize_merchant))
        .route(
            "/api/merchants/:id",
            put(api_update_merchant).delete(api_deactivate_merchant),
        )
        // HTMX page routes
        .route("/", get(page_dashboard))
        .route("/dashboard", get(page_dashboard))
        .route("/merchants/:id", get(page_merchant_detail))
        .route("/transactions/:id", get(page_transaction_detail))
        .route("/settings", get(page_settings))
        // HTMX partial routes
        .route("/dashboard/stats", get(htmx_stats))
        .route("/dashboard/merchants", get(htmx_merchants))
        .route("/dashboard/patterns", get(htmx_patterns))
        .route("/dashboard/transactions", get(htmx_transactions))
        .route(
            "/upload",
            get(htmx_upload_dialog)
                .post(htmx_upload_submit)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

// ==================== Template Functions ====================

/// Base HTML template
pub fn base_html(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{} - Transaction Analyzer</title>
    <script src="https://unpkg.com/htmx.org@1.9.10"></script>
    <script src="https://cdn.tailwindcss.com"></script>
    <style>
        .htmx-indicator {{ opacity: 0; transition: opacity 0.3s; }}
        .htmx-request .htmx-indicator {{ opacity: 1; }}
        .htmx-request.htmx-indicator {{ opacity: 1; }}
    </style>
</head>
<body class="min-h-screen bg-gradient-to-b from-zinc-50 to-white text-zinc-900">
    {}
    <div id='toasts' class='fixed bottom-4 right-4 flex flex-col gap-2 z-50'
        hx-get='/api/notifications' hx-trigger='load, every 3s, refresh-toasts from:body' hx-swap='beforeend'></div>
    <script>
    window.addEventListener('focus', function() {{
        htmx.ajax('POST', '/api/focus', {{ swap: 'none' }});
    }});
    </script>
</body>
</html>"#,
        title, content
    )
}

/// Top bar with the title and the upload button
pub fn header_bar(current_path: &str) -> String {
    let links = [("/", "Dashboard"), ("/settings", "Settings")];
    let nav: String = links
        .iter()
        .map(|(path, label)| {
            let is_active = if *path == "/" {
                current_path == "/" || current_path.starts_with("/dashboard")
            } else {
                current_path.starts_with(path)
            };
            let class = if is_active { "text-zinc-900 font-medium" } else { "text-zinc-500 hover:text-zinc-900" };
            format!("<a href='{}' class='text-sm {}'>{}</a>", path, class, label)
        })
        .collect();

    format!(
        r#"<div class='flex items-center justify-between py-6 border-b'>
            <div>
                <h1 class='text-2xl font-semibold'>Transaction Analyzer</h1>
                <p class='text-sm text-zinc-500 mt-1'>Analyze your spending patterns with AI</p>
            </div>
            <div class='flex items-center gap-6'>
                <nav class='flex gap-4'>{}</nav>
                <button hx-get='/upload' hx-target='#upload-dialog' hx-swap='innerHTML'
                    class='bg-zinc-900 text-white px-5 py-2.5 rounded-lg text-sm font-medium'>Upload CSV</button>
            </div>
        </div>
        <div id='upload-dialog'></div>"#,
        nav
    )
}

pub fn is_htmx_request(headers: &HeaderMap) -> bool {
    headers.get("hx-request").is_some()
}

/// Full page for normal requests, bare content for HTMX navigation
pub fn page_response(headers: &HeaderMap, title: &str, current_path: &str, inner_content: &str) -> String {
    if is_htmx_request(headers) {
        format!("<main class='max-w-[1200px] mx-auto p-4 space-y-8'>{}</main>", inner_content)
    } else {
        base_html(
            title,
            &format!(
                "<main class='max-w-[1200px] mx-auto p-4 space-y-8'>{}{}</main>",
                header_bar(current_path),
                inner_content
            ),
        )
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE]);
    match HeaderValue::from_str(config.server.public_url.trim_end_matches('/')) {
        Ok(origin) => layer.allow_origin(origin),
        Err(e) => {
            log::warn!(target: "txanalyzer::web", "public_url is not a valid origin: {}", e);
            layer
        }
    }
}

pub async fn start_server(state: AppState) -> anyhow::Result<()> {
    let addr = state.config.bind_address();
    let router = create_router(state.clone()).layer(cors_layer(&state.config));

    let listener = TcpListener::bind(&addr).await?;
    let collector = QueryCache::spawn_garbage_collector(state.cache());
    log::info!(target: "txanalyzer::web", "Starting dashboard on http://{}", addr);
    log::info!(target: "txanalyzer::web", "Public URL: {}", state.config.server.public_url);
    log::info!(target: "txanalyzer::web", "Analysis API: {}", state.config.api.base_url);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!(target: "txanalyzer::web", "Failed to listen for shutdown signal: {}", e);
            }
        })
        .await?;

    collector.abort();
    log::info!(target: "txanalyzer::web", "Server stopped gracefully");
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_health_check() {
        let app = TestApp::new();
        let response = app.get("/api/health").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "OK");
    }

    #[test]
    fn test_dashboard_queries_follow_config() {
        let app = TestApp::new();
        let merchants = app.state.dashboard_merchants();
        assert_eq!(merchants.limit, Some(10));
        assert_eq!(merchants.is_active, Some(true));
        assert_eq!(app.state.dashboard_transactions().limit, Some(10));
    }

    #[test]
    fn test_page_response_skips_layout_for_htmx() {
        let mut headers = axum::http::HeaderMap::new();
        assert!(super::page_response(&headers, "Dashboard", "/", "x").starts_with("<!DOCTYPE html>"));
        headers.insert("hx-request", "true".parse().unwrap());
        assert!(super::page_response(&headers, "Dashboard", "/", "x").starts_with("<main"));
    }
}

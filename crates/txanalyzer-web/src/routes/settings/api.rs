//! Settings API endpoints - JSON API

use crate::AppState;

pub async fn api_settings(state: axum::extract::State<AppState>) -> axum::Json<serde_json::Value> {
    let config = serde_json::to_value(&*state.config).unwrap_or_default();
    axum::Json(config)
}

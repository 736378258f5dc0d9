//! Focus-regained signal - JSON API

use axum::response::{IntoResponse, Json, Response};

use crate::AppState;

/// Refetch stale reads that opted into focus refetching
///
/// When anything was started the page is told to refresh its sections.
pub async fn api_focus(state: axum::extract::State<AppState>) -> Response {
    let refetched = state.cache().on_focus();
    let body = Json(serde_json::json!({ "refetched": refetched }));
    if refetched > 0 {
        log::debug!(target: "txanalyzer::web", "focus refetched {} queries", refetched);
        ([("HX-Trigger", "dashboard-refresh")], body).into_response()
    } else {
        body.into_response()
    }
}

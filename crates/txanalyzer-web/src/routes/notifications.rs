//! Toast feed - HTMX partial
//!
//! Pending notifications are drained on every poll, so each toast is
//! delivered once.

use axum::response::Html;

use crate::components::toast;
use crate::AppState;

pub async fn htmx_notifications(state: axum::extract::State<AppState>) -> Html<String> {
    let toasts: String = state.notifications.drain().iter().map(toast).collect();
    Html(toasts)
}

#[cfg(test)]
mod tests {
    use crate::test_support::*;
    use txanalyzer_client::{Notification, Notifier};

    #[tokio::test]
    async fn test_toasts_are_delivered_once() {
        let app = TestApp::new();
        app.notifications.notify(Notification::error("Error", "Network unreachable"));
        app.notifications.notify(Notification::info("Upload successful", "Processed 3 transactions"));

        let first = body_text(app.get("/api/notifications").await).await;
        assert!(first.contains("Network unreachable"));
        assert!(first.find("Network unreachable") < first.find("Processed 3 transactions"));

        let second = body_text(app.get("/api/notifications").await).await;
        assert!(second.is_empty());
    }
}

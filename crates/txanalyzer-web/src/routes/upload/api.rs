//! Upload submission - HTMX form handler

use axum::extract::multipart::{Multipart, MultipartError};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use txanalyzer_client::{Notification, Notifier};
use txanalyzer_core::{validate_upload, CoreError, ErrorSeverity, UploadFile};
use txanalyzer_query::{Mutation, UploadTransactions};
use txanalyzer_utils::format_number;

use super::page::{render_dialog, render_summary};
use crate::AppState;

/// Multipart field carrying the CSV
const FILE_FIELD: &str = "file";

/// Events fired on the page after a submission
const REFRESH_TOASTS: &str = "refresh-toasts";
const REFRESH_ALL: &str = "dashboard-refresh, refresh-toasts";

/// Pull the file part out of the form; an empty file name means nothing was chosen
async fn read_upload(mut multipart: Multipart) -> Result<Option<UploadFile>, MultipartError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(str::to_string).unwrap_or_default();
        if file_name.trim().is_empty() {
            return Ok(None);
        }
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await?;
        let mut file = UploadFile::new(file_name, bytes);
        if let Some(content_type) = content_type {
            file = file.with_content_type(content_type);
        }
        return Ok(Some(file));
    }
    Ok(None)
}

fn rejection_notice(error: &CoreError) -> Notification {
    match error.severity() {
        ErrorSeverity::Info => Notification::info(error.title(), error.user_message()),
        ErrorSeverity::Warning | ErrorSeverity::Error => Notification::error(error.title(), error.user_message()),
    }
}

fn unreadable_form_message(error: &MultipartError, limit: usize) -> String {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        format!("The file is larger than the {} byte upload limit", format_number(limit))
    } else {
        error.body_text()
    }
}

fn with_trigger(trigger: &'static str, html: String) -> Response {
    ([("HX-Trigger", trigger)], Html(html)).into_response()
}

pub async fn htmx_upload_submit(state: axum::extract::State<AppState>, multipart: Multipart) -> Response {
    let file = match read_upload(multipart).await {
        Ok(file) => file,
        Err(e) => {
            log::warn!(target: "txanalyzer::web", "unreadable upload form ({}): {}", e.status(), e);
            let message = unreadable_form_message(&e, state.config.dashboard.max_upload_bytes);
            state.notifications.notify(Notification::error("Upload failed", message.clone()));
            return with_trigger(REFRESH_TOASTS, render_dialog(Some(&message)));
        }
    };

    // Nothing below this point runs for a rejected file
    let file = match validate_upload(file.as_ref()) {
        Ok(file) => file.clone(),
        Err(error) => {
            log::warn!(target: "txanalyzer::web", "upload rejected: {}", error);
            state.notifications.notify(rejection_notice(&error));
            return with_trigger(REFRESH_TOASTS, render_dialog(None));
        }
    };

    log::info!(target: "txanalyzer::web", "uploading {} ({} bytes)", file.file_name, file.len());
    let mutation = Mutation::new(UploadTransactions::new(state.api().clone(), state.cache().clone()));
    match mutation.mutate(file).await {
        Ok(response) => {
            state.notifications.notify(Notification::info(
                "Upload successful",
                format!("Processed {} transactions", response.processed_count),
            ));
            with_trigger(REFRESH_ALL, render_summary(&response))
        }
        // The client already raised the error toast; keep the dialog open
        Err(error) => with_trigger(REFRESH_TOASTS, render_dialog(Some(&error.message))),
    }
}

//! Upload dialog rendering

use axum::response::Html;
use txanalyzer_core::UploadTransactionsResponse;
use txanalyzer_utils::{escape_html, format_number};

use crate::components::error_banner;

const CLOSE_DIALOG: &str = "document.getElementById('upload-dialog').innerHTML = ''";

/// Modal upload form; `error` renders an inline banner above the file input
pub fn render_dialog(error: Option<&str>) -> String {
    let banner = error.map(error_banner).unwrap_or_default();
    format!(
        r#"<div id='upload-modal' class='fixed inset-0 bg-black/50 flex items-center justify-center z-40'>
            <div class='bg-white rounded-xl shadow-xl w-full max-w-md p-6'>
                <h2 class='text-lg font-semibold'>Upload Transactions</h2>
                <form id='upload-form' class='space-y-4 mt-4'
                    hx-post='/upload' hx-target='#upload-dialog' hx-swap='innerHTML'
                    hx-encoding='multipart/form-data' hx-indicator='#upload-progress'>
                    {}
                    <div class='space-y-2'>
                        <label for='upload-file' class='text-sm font-medium'>CSV File</label>
                        <input id='upload-file' name='file' type='file' accept='.csv' class='block w-full text-sm'
                            onchange="document.getElementById('upload-submit').disabled = !this.files.length">
                    </div>
                    <div class='flex items-center justify-end gap-2'>
                        <span id='upload-progress' class='htmx-indicator text-sm text-zinc-500'>Processing...</span>
                        <button type='button' onclick="{}"
                            class='border px-4 py-2 rounded-lg text-sm'>Cancel</button>
                        <button id='upload-submit' type='submit' disabled
                            class='bg-zinc-900 text-white px-4 py-2 rounded-lg text-sm disabled:opacity-50'>Upload</button>
                    </div>
                </form>
            </div>
        </div>"#,
        banner, CLOSE_DIALOG
    )
}

/// Result panel shown in place of the closed dialog
pub fn render_summary(response: &UploadTransactionsResponse) -> String {
    let failed = if response.failed_count > 0 {
        format!(
            "<p class='text-sm text-red-600'>Failed: {} rows</p>",
            format_number(response.failed_count)
        )
    } else {
        String::new()
    };
    let row_errors: String = response
        .row_errors()
        .iter()
        .map(|e| format!("<li>{}</li>", escape_html(e)))
        .collect();
    let row_errors = if row_errors.is_empty() {
        row_errors
    } else {
        format!("<ul class='text-xs text-red-600 list-disc ml-5 mt-2'>{}</ul>", row_errors)
    };

    format!(
        r#"<div id='upload-summary' class='bg-green-50 border border-green-200 rounded-xl p-4 flex items-start justify-between'>
            <div class='space-y-1'>
                <p class='font-medium text-green-800'>&#10003; Upload complete</p>
                <p class='text-sm'>Processed: {} transactions</p>
                {}
                <p class='text-sm'>Normalized: {} merchants</p>
                <p class='text-sm'>Patterns detected: {}</p>
                {}
            </div>
            <button type='button' onclick="{}" class='text-sm text-zinc-500 hover:text-zinc-900'>Dismiss</button>
        </div>"#,
        format_number(response.processed_count),
        failed,
        format_number(response.normalized_transactions.len()),
        format_number(response.detected_patterns.len()),
        row_errors,
        CLOSE_DIALOG
    )
}

pub async fn htmx_upload_dialog() -> Html<String> {
    Html(render_dialog(None))
}

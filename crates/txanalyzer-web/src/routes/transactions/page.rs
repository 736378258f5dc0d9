//! Transaction page rendering - Full page endpoints

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Html;
use txanalyzer_core::Transaction;
use txanalyzer_utils::{escape_html, format_money, format_percent};

use crate::components::{badge, display_date, error_banner, flag_tags};
use crate::{page_response, AppState};

fn transaction_detail(transaction: &Transaction) -> String {
    let analysis = &transaction.analysis;
    let merchant = match &analysis.merchant {
        Some(m) => format!(
            "<a href='/merchants/{}' class='font-medium hover:underline'>{}</a>",
            escape_html(&m.id),
            escape_html(&m.name)
        ),
        None => "<span class='text-zinc-500'>Unmatched</span>".to_string(),
    };
    let sub_category = analysis
        .sub_category
        .as_deref()
        .map(|s| badge(s, true))
        .unwrap_or_default();
    let subscription = if analysis.is_subscription { badge("Subscription", false) } else { String::new() };
    let amount_class = if transaction.is_debit() { "text-red-600" } else { "text-green-600" };

    format!(
        r#"<div class='bg-white border rounded-xl shadow-sm p-6'>
            <a href='/' class='text-sm text-zinc-500 hover:text-zinc-900'>&larr; Dashboard</a>
            <div class='flex items-start justify-between mt-2'>
                <div>
                    <h2 class='text-2xl font-semibold'>{}</h2>
                    <p class='font-mono text-sm text-zinc-500'>{}</p>
                </div>
                <p class='text-2xl font-mono {}'>{}</p>
            </div>
            <div class='grid grid-cols-2 md:grid-cols-4 gap-4 mt-6'>
                <div><p class='text-sm text-zinc-500'>Date</p><p class='font-medium'>{}</p></div>
                <div><p class='text-sm text-zinc-500'>Merchant</p>{}</div>
                <div><p class='text-sm text-zinc-500'>Category</p><div class='flex gap-2'>{}{}</div></div>
                <div><p class='text-sm text-zinc-500'>Confidence</p><p class='font-medium'>{}</p></div>
            </div>
            <div class='flex gap-2 mt-4'>{}</div>
            {}
        </div>"#,
        escape_html(transaction.display_name()),
        escape_html(&transaction.description),
        amount_class,
        format_money(transaction.amount),
        display_date(&transaction.date),
        merchant,
        badge(&analysis.category, false),
        sub_category,
        format_percent(analysis.confidence),
        subscription,
        flag_tags(&analysis.flags)
    )
}

pub async fn page_transaction_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> (StatusCode, Html<String>) {
    let query = state.queries.transaction(&id);
    match state.cache().fetch(&query).await {
        Ok(transaction) => (
            StatusCode::OK,
            Html(page_response(
                &headers,
                &escape_html(transaction.display_name()),
                "/transactions",
                &transaction_detail(&transaction),
            )),
        ),
        Err(error) => {
            let status = if error.is_not_found() { StatusCode::NOT_FOUND } else { StatusCode::BAD_GATEWAY };
            let title = if error.is_not_found() { "Transaction not found" } else { "Transaction unavailable" };
            let inner_content = format!(
                "<div class='space-y-4'><h2 class='text-2xl font-semibold'>{}</h2>{}</div>",
                title,
                error_banner(&error.to_string())
            );
            (status, Html(page_response(&headers, title, "/transactions", &inner_content)))
        }
    }
}

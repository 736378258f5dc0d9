//! Merchant page rendering - Full page endpoints

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Html;
use txanalyzer_core::{Merchant, Pattern};
use txanalyzer_query::QueryResult;
use txanalyzer_utils::{escape_html, format_number, format_percent};

use crate::components::{badge, display_date, error_banner, flag_tags, panel};
use crate::routes::dashboard::api::pattern_list;
use crate::{page_response, AppState};

fn merchant_header(merchant: &Merchant) -> String {
    let status = if merchant.is_active { badge("Active", true) } else { badge("Inactive", true) };
    let sub_category = merchant
        .sub_category
        .as_deref()
        .map(|s| badge(s, true))
        .unwrap_or_default();
    format!(
        r#"<div class='bg-white border rounded-xl shadow-sm p-6'>
            <div class='flex items-start justify-between'>
                <div>
                    <a href='/' class='text-sm text-zinc-500 hover:text-zinc-900'>&larr; Dashboard</a>
                    <h2 class='text-2xl font-semibold mt-2'>{}</h2>
                    <p class='font-mono text-sm text-zinc-500'>{}</p>
                </div>
                <div class='flex gap-2'>{}{}{}</div>
            </div>
            <div class='grid grid-cols-3 gap-4 mt-6'>
                <div><p class='text-sm text-zinc-500'>Transactions</p><p class='font-medium'>{}</p></div>
                <div><p class='text-sm text-zinc-500'>Confidence</p><p class='font-medium'>{}</p></div>
                <div><p class='text-sm text-zinc-500'>First seen</p><p class='font-medium'>{}</p></div>
            </div>
            {}
        </div>"#,
        escape_html(&merchant.normalized_name),
        escape_html(&merchant.original_name),
        badge(&merchant.category, false),
        sub_category,
        status,
        format_number(merchant.transaction_count),
        format_percent(merchant.confidence),
        display_date(&merchant.created_at),
        flag_tags(&merchant.flags)
    )
}

pub async fn page_merchant_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> (StatusCode, Html<String>) {
    let cache = state.cache();
    let merchant_query = state.queries.merchant(&id);
    let patterns_query = state.queries.patterns_by_merchant(&id);
    let (merchant, patterns): (QueryResult<Merchant>, QueryResult<Vec<Pattern>>) =
        tokio::join!(cache.fetch(&merchant_query), cache.fetch(&patterns_query));

    let merchant = match merchant {
        Ok(merchant) => merchant,
        Err(error) => {
            let status = if error.is_not_found() { StatusCode::NOT_FOUND } else { StatusCode::BAD_GATEWAY };
            let title = if error.is_not_found() { "Merchant not found" } else { "Merchant unavailable" };
            let inner_content = format!(
                "<div class='space-y-4'><h2 class='text-2xl font-semibold'>{}</h2>{}</div>",
                title,
                error_banner(&error.to_string())
            );
            return (status, Html(page_response(&headers, title, "/merchants", &inner_content)));
        }
    };

    let today = chrono::Local::now().date_naive();
    let patterns = match patterns {
        Ok(patterns) => pattern_list(&patterns, today),
        Err(error) => error_banner(&error.to_string()),
    };

    let inner_content = format!(
        "{}{}",
        merchant_header(&merchant),
        panel("Recurring Payments", "Patterns detected for this merchant", &patterns)
    );
    (
        StatusCode::OK,
        Html(page_response(
            &headers,
            &escape_html(&merchant.normalized_name),
            "/merchants",
            &inner_content,
        )),
    )
}

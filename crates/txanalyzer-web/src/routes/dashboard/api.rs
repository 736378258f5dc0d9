//! Dashboard sections - HTMX partials
//!
//! Each section observes its cached reads: the first request starts the
//! fetch and renders a placeholder that polls until the data is in.

use axum::response::Html;
use chrono::NaiveDate;
use txanalyzer_core::{patterns_by_next_charge, DashboardStats, Merchant, MerchantPage, Pattern, TransactionPage};
use txanalyzer_query::QueryState;
use txanalyzer_utils::{escape_html, format_money, format_number};

use crate::components::{
    badge, display_date, empty_state, error_banner, flag_tags, list_skeleton, panel, section, stats_skeleton,
};
use crate::AppState;

/// Patterns due within this many days get a reminder badge
const DUE_SOON_DAYS: i64 = 7;

/// Placeholders keep polling until data or an error arrives
fn needs_poll<T>(state: &QueryState<T>) -> bool {
    state.is_fetching || (state.data.is_none() && state.error.is_none())
}

fn section_body<T>(state: &QueryState<T>, rows: usize, render: impl FnOnce(&T) -> String) -> String {
    match (&state.data, &state.error) {
        (Some(data), _) => render(data),
        (None, Some(error)) => error_banner(&error.to_string()),
        (None, None) => list_skeleton(rows),
    }
}

// ==================== Stats ====================

fn stat_card(title: &str, value: &str, caption: &str) -> String {
    format!(
        r#"<div class='bg-white border rounded-xl shadow-sm p-6'>
            <p class='text-sm font-medium text-zinc-500'>{}</p>
            <p class='text-2xl font-bold mt-2'>{}</p>
            <p class='text-xs text-zinc-500 mt-1'>{}</p>
        </div>"#,
        title, value, caption
    )
}

fn stats_cards(stats: &DashboardStats) -> String {
    format!(
        "<div class='grid gap-4 md:grid-cols-2 lg:grid-cols-4'>{}{}{}{}</div>",
        stat_card(
            "Total Spend",
            &format_money(stats.total_spend),
            &format!("{} transactions", format_number(stats.transaction_count))
        ),
        stat_card("Transactions", &format_number(stats.transaction_count), "Analyzed transactions"),
        stat_card("Avg. Transaction", &format_money(stats.avg_transaction), "Per transaction"),
        stat_card("Merchants", &format_number(stats.merchant_count), "Unique merchants"),
    )
}

pub fn render_stats(state: &AppState) -> String {
    let cache = state.cache();
    let transactions: QueryState<TransactionPage> =
        cache.observe(&state.queries.transactions(&state.dashboard_transactions()));
    let merchants: QueryState<MerchantPage> = cache.observe(&state.queries.merchants(&state.dashboard_merchants()));
    let patterns: QueryState<Vec<Pattern>> = cache.observe(&state.queries.patterns());

    let loading = transactions.is_loading() || merchants.is_loading() || patterns.is_loading();
    let poll = needs_poll(&transactions) || needs_poll(&merchants) || needs_poll(&patterns);

    let body = if loading {
        stats_skeleton()
    } else {
        stats_cards(&DashboardStats::derive(
            transactions.data.as_ref(),
            merchants.data.as_ref(),
        ))
    };
    section(
        "dashboard-stats",
        "/dashboard/stats",
        state.config.dashboard.poll_interval_ms,
        poll,
        &body,
    )
}

pub async fn htmx_stats(state: axum::extract::State<AppState>) -> Html<String> {
    Html(render_stats(&state))
}

// ==================== Merchants ====================

fn merchant_card(merchant: &Merchant) -> String {
    let sub_category = merchant
        .sub_category
        .as_deref()
        .map(|s| badge(s, true))
        .unwrap_or_default();
    format!(
        r#"<div class='border rounded-lg p-4'>
            <div class='flex items-start justify-between gap-4'>
                <div>
                    <p class='text-xs text-zinc-500'>Original</p>
                    <p class='font-mono text-sm'>{}</p>
                    <p class='text-xs text-zinc-500 mt-2'>Normalized</p>
                    <a href='/merchants/{}' class='font-medium hover:underline'>{}</a>
                </div>
                <div class='flex gap-2'>{}{}</div>
            </div>
            {}
        </div>"#,
        escape_html(&merchant.original_name),
        escape_html(&merchant.id),
        escape_html(&merchant.normalized_name),
        badge(&merchant.category, false),
        sub_category,
        flag_tags(&merchant.flags)
    )
}

fn merchant_list(page: &MerchantPage) -> String {
    if page.items.is_empty() {
        return empty_state("No merchants yet. Upload a CSV to get started.");
    }
    let cards: String = page.items.iter().map(merchant_card).collect();
    format!("<div class='space-y-4'>{}</div>", cards)
}

pub fn render_merchants(state: &AppState) -> String {
    let merchants: QueryState<MerchantPage> = state
        .cache()
        .observe(&state.queries.merchants(&state.dashboard_merchants()));
    let body = panel(
        "Normalized Merchants",
        "AI-powered merchant name normalization and categorization",
        &section_body(&merchants, 3, merchant_list),
    );
    section(
        "dashboard-merchants",
        "/dashboard/merchants",
        state.config.dashboard.poll_interval_ms,
        needs_poll(&merchants),
        &body,
    )
}

pub async fn htmx_merchants(state: axum::extract::State<AppState>) -> Html<String> {
    Html(render_merchants(&state))
}

// ==================== Patterns ====================

pub(crate) fn pattern_card(pattern: &Pattern, today: NaiveDate) -> String {
    let due_soon = match pattern.days_until_next(today) {
        Some(0) => badge("Due today", false),
        Some(days) if (1..=DUE_SOON_DAYS).contains(&days) => badge(&format!("Due in {} days", days), false),
        _ => String::new(),
    };
    let description = pattern
        .description
        .as_deref()
        .map(|d| format!("<p class='text-sm text-zinc-600 mt-2'>{}</p>", escape_html(d)))
        .unwrap_or_default();
    format!(
        r#"<div class='border rounded-lg p-4'>
            <div class='flex items-start justify-between gap-4'>
                <div>
                    <p class='font-medium'>{}</p>
                    <p class='text-sm text-zinc-500'>{} &bull; {}</p>
                </div>
                <div class='text-right'>
                    <p class='font-medium'>{}</p>
                    <p class='text-sm text-zinc-500'>Next: {}</p>
                    {}
                </div>
            </div>
            {}
        </div>"#,
        escape_html(pattern.merchant_name.as_deref().unwrap_or("Unknown Merchant")),
        escape_html(&pattern.pattern_type.as_str().to_lowercase()),
        escape_html(&pattern.frequency.as_str().to_lowercase()),
        format_money(pattern.amount.abs()),
        display_date(&pattern.next_expected_date),
        due_soon,
        description
    )
}

pub(crate) fn pattern_list(patterns: &[Pattern], today: NaiveDate) -> String {
    if patterns.is_empty() {
        return empty_state("No recurring payments detected yet.");
    }
    let cards: String = patterns_by_next_charge(patterns)
        .into_iter()
        .map(|p| pattern_card(p, today))
        .collect();
    format!("<div class='space-y-4'>{}</div>", cards)
}

pub fn render_patterns(state: &AppState) -> String {
    let patterns: QueryState<Vec<Pattern>> = state.cache().observe(&state.queries.patterns());
    let today = chrono::Local::now().date_naive();
    let body = panel(
        "Detected Patterns",
        "Subscription and recurring payment detection",
        &section_body(&patterns, 3, |p| pattern_list(p, today)),
    );
    section(
        "dashboard-patterns",
        "/dashboard/patterns",
        state.config.dashboard.poll_interval_ms,
        needs_poll(&patterns),
        &body,
    )
}

pub async fn htmx_patterns(state: axum::extract::State<AppState>) -> Html<String> {
    Html(render_patterns(&state))
}

// ==================== Transactions ====================

fn transaction_table(page: &TransactionPage) -> String {
    if page.items.is_empty() {
        return empty_state("No transactions yet.");
    }
    let rows: String = page
        .items
        .iter()
        .map(|t| {
            let amount_class = if t.is_debit() { "text-red-600" } else { "text-green-600" };
            let subscription = if t.is_subscription { badge("Subscription", true) } else { String::new() };
            format!(
                r#"<tr class='border-b last:border-0 hover:bg-zinc-50'>
                    <td class='py-3 px-2 text-sm text-zinc-500 whitespace-nowrap'>{}</td>
                    <td class='py-3 px-2'>
                        <a href='/transactions/{}' class='font-medium hover:underline'>{}</a>
                        <p class='text-xs text-zinc-500 font-mono'>{}</p>
                    </td>
                    <td class='py-3 px-2 text-sm'>{} {}</td>
                    <td class='py-3 px-2 text-right font-mono {}'>{}</td>
                </tr>"#,
                display_date(&t.date),
                escape_html(&t.id),
                escape_html(t.display_name()),
                escape_html(&t.description),
                escape_html(&t.category),
                subscription,
                amount_class,
                format_money(t.amount)
            )
        })
        .collect();
    format!(
        r#"<table class='w-full'>
            <thead><tr class='text-left text-xs text-zinc-500 border-b'>
                <th class='py-2 px-2'>Date</th><th class='py-2 px-2'>Merchant</th>
                <th class='py-2 px-2'>Category</th><th class='py-2 px-2 text-right'>Amount</th>
            </tr></thead>
            <tbody>{}</tbody>
        </table>"#,
        rows
    )
}

pub fn render_transactions(state: &AppState) -> String {
    let transactions: QueryState<TransactionPage> = state
        .cache()
        .observe(&state.queries.transactions(&state.dashboard_transactions()));
    let body = panel(
        "Recent Transactions",
        "Latest transactions by date",
        &section_body(&transactions, 5, transaction_table),
    );
    section(
        "dashboard-transactions",
        "/dashboard/transactions",
        state.config.dashboard.poll_interval_ms,
        needs_poll(&transactions),
        &body,
    )
}

pub async fn htmx_transactions(state: axum::extract::State<AppState>) -> Html<String> {
    Html(render_transactions(&state))
}

//! Settings page rendering - Full page endpoints

use txanalyzer_utils::escape_html;

use crate::{page_response, AppState};

fn setting(label: &str, value: &str) -> String {
    format!(
        "<div><p class='text-sm text-zinc-500'>{}</p><p class='font-medium'>{}</p></div>",
        label,
        escape_html(value)
    )
}

pub async fn page_settings(
    state: axum::extract::State<AppState>,
    headers: axum::http::HeaderMap,
) -> axum::response::Html<String> {
    let config = &state.config;
    let section = |title: &str, items: Vec<String>| {
        format!(
            "<div class='bg-white border rounded-xl shadow-sm p-6'>\
                <h3 class='text-lg font-semibold mb-4'>{}</h3>\
                <div class='grid grid-cols-2 gap-4'>{}</div></div>",
            title,
            items.concat()
        )
    };

    let inner_content = format!(
        "<div class='mb-6'><h2 class='text-2xl font-semibold'>Settings</h2></div>{}{}{}{}",
        section(
            "Server",
            vec![
                setting("Host", &config.server.host),
                setting("Port", &config.server.port.to_string()),
                setting("Public URL", &config.server.public_url),
            ]
        ),
        section("Analysis API", vec![setting("Base URL", &config.api.base_url)]),
        section(
            "Cache",
            vec![
                setting("Merchants fresh for", &format!("{}s", config.cache.merchants_stale_secs)),
                setting("Patterns fresh for", &format!("{}s", config.cache.patterns_stale_secs)),
                setting("Transactions fresh for", &format!("{}s", config.cache.transactions_stale_secs)),
            ]
        ),
        section(
            "Dashboard",
            vec![
                setting("Rows per list", &config.dashboard.page_size.to_string()),
                setting(
                    "Merchants shown",
                    if config.dashboard.merchants_active_only { "Active only" } else { "All" },
                ),
                setting("Placeholder poll", &format!("{}ms", config.dashboard.poll_interval_ms)),
            ]
        ),
    );

    axum::response::Html(page_response(&headers, "Settings", "/settings", &inner_content))
}

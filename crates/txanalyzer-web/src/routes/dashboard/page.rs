//! Dashboard page rendering - Full page endpoints

use txanalyzer_query::{key, QueryKey};

use super::api::{render_merchants, render_patterns, render_stats, render_transactions};
use crate::{page_response, AppState};

pub async fn page_dashboard(
    state: axum::extract::State<AppState>,
    headers: axum::http::HeaderMap,
) -> axum::response::Html<String> {
    // A full page load gives failed reads another chance and refreshes
    // stale ones; the polling sections only render what is cached
    let cache = state.cache();
    let mut reset = 0;
    let mut refreshed = 0;
    for root in [key::TRANSACTIONS, key::MERCHANTS, key::PATTERNS] {
        let prefix = QueryKey::new(root);
        reset += cache.reset_failed(&prefix);
        refreshed += cache.refetch_stale(&prefix);
    }
    if reset > 0 || refreshed > 0 {
        log::debug!(
            target: "txanalyzer::web",
            "dashboard load: retrying {} failed reads, refreshing {} stale reads",
            reset,
            refreshed
        );
    }

    let inner_content = format!(
        r#"{}
        <div class='space-y-4'>
            <div class='inline-flex bg-zinc-100 rounded-lg p-1' role='tablist'>
                <button class='dashboard-tab px-3 py-1.5 text-sm font-medium rounded-md bg-white shadow-sm'
                    data-tab='merchants' onclick="showDashboardTab('merchants')">Merchant Analysis</button>
                <button class='dashboard-tab px-3 py-1.5 text-sm font-medium rounded-md text-zinc-500'
                    data-tab='patterns' onclick="showDashboardTab('patterns')">Pattern Detection</button>
            </div>
            <div id='tab-merchants' class='dashboard-panel'>{}</div>
            <div id='tab-patterns' class='dashboard-panel hidden'>{}</div>
        </div>
        {}
        <script>
        function showDashboardTab(name) {{
            document.querySelectorAll('.dashboard-panel').forEach(function(panel) {{
                panel.classList.toggle('hidden', panel.id !== 'tab-' + name);
            }});
            document.querySelectorAll('.dashboard-tab').forEach(function(tab) {{
                var active = tab.dataset.tab === name;
                tab.classList.toggle('bg-white', active);
                tab.classList.toggle('shadow-sm', active);
                tab.classList.toggle('text-zinc-500', !active);
            }});
        }}
        </script>"#,
        render_stats(&state),
        render_merchants(&state),
        render_patterns(&state),
        render_transactions(&state),
    );

    axum::response::Html(page_response(&headers, "Dashboard", "/", &inner_content))
}

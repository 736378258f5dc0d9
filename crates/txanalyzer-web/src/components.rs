//! Shared HTML fragments

use txanalyzer_client::Notification;
use txanalyzer_core::parse_api_date;
use txanalyzer_utils::escape_html;

/// Self-refreshing dashboard section
///
/// While `fetching`, the section polls its own URL until the fetch settles.
/// Every section also reloads on the `dashboard-refresh` event.
pub fn section(id: &str, url: &str, poll_ms: u64, fetching: bool, body: &str) -> String {
    let trigger = if fetching {
        format!("load delay:{}ms, dashboard-refresh from:body", poll_ms)
    } else {
        "dashboard-refresh from:body".to_string()
    };
    format!(
        "<div id='{}' hx-get='{}' hx-trigger='{}' hx-swap='outerHTML'>{}</div>",
        id, url, trigger, body
    )
}

/// Pulsing placeholder rows
pub fn list_skeleton(rows: usize) -> String {
    let row = "<div class='animate-pulse border rounded-lg p-4 space-y-2'>\
        <div class='h-4 bg-zinc-200 rounded w-1/3'></div>\
        <div class='h-3 bg-zinc-100 rounded w-1/2'></div></div>";
    format!("<div class='space-y-4'>{}</div>", row.repeat(rows))
}

pub fn stats_skeleton() -> String {
    let card = "<div class='animate-pulse bg-white border rounded-xl p-6 space-y-3'>\
        <div class='h-3 bg-zinc-100 rounded w-1/2'></div>\
        <div class='h-7 bg-zinc-200 rounded w-2/3'></div>\
        <div class='h-3 bg-zinc-100 rounded w-1/3'></div></div>";
    format!("<div class='grid gap-4 md:grid-cols-2 lg:grid-cols-4'>{}</div>", card.repeat(4))
}

pub fn error_banner(message: &str) -> String {
    format!(
        "<div class='bg-red-50 border border-red-200 text-red-700 text-sm rounded-lg p-3'>{}</div>",
        escape_html(message)
    )
}

pub fn empty_state(text: &str) -> String {
    format!("<p class='text-sm text-zinc-500 py-6 text-center'>{}</p>", escape_html(text))
}

/// Small rounded label; `outline` renders the secondary style
pub fn badge(text: &str, outline: bool) -> String {
    let class = if outline {
        "border border-zinc-300 text-zinc-700"
    } else {
        "bg-zinc-900 text-white"
    };
    format!(
        "<span class='inline-block text-xs font-medium px-2 py-0.5 rounded-full {}'>{}</span>",
        class,
        escape_html(text)
    )
}

pub fn flag_tags(flags: &[String]) -> String {
    if flags.is_empty() {
        return String::new();
    }
    let tags: String = flags
        .iter()
        .map(|flag| {
            format!(
                "<span class='text-xs bg-zinc-100 text-zinc-600 px-2 py-0.5 rounded'>{}</span>",
                escape_html(flag)
            )
        })
        .collect();
    format!("<div class='flex flex-wrap gap-1 mt-2'>{}</div>", tags)
}

pub fn toast(notification: &Notification) -> String {
    let class = if notification.is_destructive() {
        "bg-red-600 text-white border-red-700"
    } else {
        "bg-white text-zinc-900 border-zinc-200"
    };
    format!(
        "<div class='toast w-80 border rounded-lg shadow-lg p-4 cursor-pointer {}' onclick='this.remove()'>\
            <p class='text-sm font-semibold'>{}</p><p class='text-sm opacity-90 mt-1'>{}</p></div>",
        class,
        escape_html(&notification.title),
        escape_html(&notification.description)
    )
}

/// API date as `Mar 1, 2024`; unparseable values are shown as sent
pub fn display_date(raw: &str) -> String {
    parse_api_date(raw)
        .map(|d| d.format("%b %-d, %Y").to_string())
        .unwrap_or_else(|| escape_html(raw))
}

/// Content card with a heading and a muted subtitle
pub fn panel(title: &str, subtitle: &str, body: &str) -> String {
    format!(
        r#"<div class='bg-white border rounded-xl shadow-sm'>
            <div class='p-6 pb-2'>
                <h3 class='text-lg font-semibold'>{}</h3>
                <p class='text-sm text-zinc-500'>{}</p>
            </div>
            <div class='p-6 pt-2'>{}</div>
        </div>"#,
        title, subtitle, body
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_polls_only_while_fetching() {
        let polling = section("s", "/dashboard/stats", 750, true, "");
        assert!(polling.contains("load delay:750ms"));

        let idle = section("s", "/dashboard/stats", 750, false, "");
        assert!(!idle.contains("load delay"));
        assert!(idle.contains("dashboard-refresh from:body"));
    }

    #[test]
    fn test_toast_escapes_text() {
        let html = toast(&Notification::error("Error", "<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("bg-red-600"));
    }

    #[test]
    fn test_display_date() {
        assert_eq!(display_date("2024-03-01"), "Mar 1, 2024");
        assert_eq!(display_date("2024-04-15T00:00:00.000Z"), "Apr 15, 2024");
        assert_eq!(display_date("soon"), "soon");
    }
}

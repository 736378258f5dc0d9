//! Dashboard routes - Stats, merchants, patterns and recent transactions

pub mod api;
pub mod page;

pub use api::{htmx_merchants, htmx_patterns, htmx_stats, htmx_transactions};
pub use page::page_dashboard;

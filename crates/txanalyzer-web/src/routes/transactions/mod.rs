//! Transaction routes - Detail page and ad-hoc transaction/pattern analysis

pub mod api;
pub mod page;

pub use api::{api_analyze, api_analyze_patterns};
pub use page::page_transaction_detail;

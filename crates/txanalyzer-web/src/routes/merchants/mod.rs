//! Merchant routes - Detail page and merchant writes

pub mod api;
pub mod page;

pub use api::{api_create_merchant, api_deactivate_merchant, api_normalize_merchant, api_update_merchant};
pub use page::page_merchant_detail;

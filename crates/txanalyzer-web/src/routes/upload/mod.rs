//! Upload routes - CSV upload dialog

pub mod api;
pub mod page;

pub use api::htmx_upload_submit;
pub use page::htmx_upload_dialog;

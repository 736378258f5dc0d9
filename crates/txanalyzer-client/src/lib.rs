//! HTTP client for the transaction analysis API
//!
//! - api: the [`AnalyzerApi`] trait, one method per server operation
//! - client: reqwest implementation
//! - error: [`ApiError`] normalization
//! - notify: user-visible notifications raised on failure

pub mod api;
pub mod client;
pub mod error;
pub mod notify;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use api::AnalyzerApi;
pub use client::{ApiClient, ClientConfig};
pub use error::{ApiError, ApiErrorKind, ApiResult, DEFAULT_ERROR_MESSAGE};
pub use notify::{LogNotifier, Notification, NotificationCenter, NotificationVariant, Notifier};

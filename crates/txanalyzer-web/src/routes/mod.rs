//! Route modules for the dashboard server
//!
//! - dashboard: Dashboard page, stats cards, merchant/pattern tabs, recent transactions
//! - merchants: Merchant detail page and merchant writes
//! - transactions: Transaction detail page and ad-hoc analysis
//! - upload: CSV upload dialog
//! - settings: Effective configuration
//! - notifications: Toast feed
//! - focus: Focus-regained refetch
//!
//! Each module follows a consistent structure:
//! - mod.rs: Module declaration and exports
//! - api.rs: JSON API endpoints and HTMX partials
//! - page.rs: HTMX page rendering

pub mod dashboard;
pub mod focus;
pub mod merchants;
pub mod notifications;
pub mod settings;
pub mod transactions;
pub mod upload;

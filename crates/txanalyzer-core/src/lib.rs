//! Core data model and client-side rules for the transaction dashboard
//!
//! - models: entities and DTOs mirrored from the analysis API
//! - types: pattern type, frequency and sort enums
//! - upload: upload payloads and pre-submission validation
//! - stats: display statistics derived from loaded pages

pub mod error;
pub mod models;
pub mod stats;
pub mod types;
pub mod upload;

pub use error::{CoreError, CoreResult, ErrorSeverity};
pub use models::*;
pub use stats::{patterns_by_next_charge, upcoming_patterns, DashboardStats};
pub use types::{Frequency, PatternType, SortBy, SortOrder};
pub use upload::{is_csv_file_name, validate_upload, UploadFile, CSV_EXTENSION};

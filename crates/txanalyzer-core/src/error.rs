//! Error types for txanalyzer-core
//!
//! Client-side failures raised before anything reaches the network.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    /// Informational
    Info,
    /// Warning - operation was refused
    Warning,
    /// Error - operation failed
    Error,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "info"),
            ErrorSeverity::Warning => write!(f, "warning"),
            ErrorSeverity::Error => write!(f, "error"),
        }
    }
}

/// Core error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("No file selected")]
    MissingFile,

    #[error("Invalid file type: {file_name}")]
    InvalidFileType { file_name: String },
}

impl CoreError {
    /// Get the severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CoreError::MissingFile => ErrorSeverity::Info,
            CoreError::InvalidFileType { .. } => ErrorSeverity::Warning,
        }
    }

    /// Notification title shown to the user
    pub fn title(&self) -> &'static str {
        match self {
            CoreError::MissingFile => "No file selected",
            CoreError::InvalidFileType { .. } => "Invalid file type",
        }
    }

    /// Notification body shown to the user
    pub fn user_message(&self) -> String {
        match self {
            CoreError::MissingFile => "Choose a CSV file to upload".to_string(),
            CoreError::InvalidFileType { .. } => "Please upload a CSV file".to_string(),
        }
    }
}

/// Result type with CoreError
pub type CoreResult<T> = Result<T, CoreError>;

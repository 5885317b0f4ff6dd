use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable error codes surfaced at the fallible edges (ingest, config, CLI I/O).
///
/// Report computations themselves are total and never produce an `AppError`.
pub mod codes {
    pub const INGEST_JSON_PARSE_FAILED: &str = "INGEST_JSON_PARSE_FAILED";
    pub const INGEST_CSV_HEADERS_FAILED: &str = "INGEST_CSV_HEADERS_FAILED";
    pub const INGEST_CSV_MAPPING_INVALID: &str = "INGEST_CSV_MAPPING_INVALID";
    pub const CONFIG_READ_FAILED: &str = "CONFIG_READ_FAILED";
    pub const CONFIG_PARSE_FAILED: &str = "CONFIG_PARSE_FAILED";
    pub const CONFIG_INVALID: &str = "CONFIG_INVALID";
    pub const WINDOW_INVALID: &str = "WINDOW_INVALID";
    pub const INPUT_READ_FAILED: &str = "INPUT_READ_FAILED";
    pub const ARG_INVALID: &str = "ARG_INVALID";
    pub const OUTPUT_WRITE_FAILED: &str = "OUTPUT_WRITE_FAILED";
}

/// Single structured error shape used across the workspace.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppError {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
    pub retryable: bool,
}

impl AppError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            retryable: false,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.details {
            Some(d) => write!(f, "[{}] {} ({d})", self.code, self.message),
            None => write!(f, "[{}] {}", self.code, self.message),
        }
    }
}

impl std::error::Error for AppError {}

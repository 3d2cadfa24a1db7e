//! Error types for the loading and validation layers
//!
//! The projection and estate math never fails; these errors only surface when
//! reading client files, writing exports, or strictly validating overrides.

use std::path::PathBuf;

/// Errors raised outside the pure calculation core
#[derive(Debug, thiserror::Error)]
pub enum PlanningError {
    /// Reading or writing a file failed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Client file is not valid JSON for the expected shape
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Row export failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// An assumption override is non-finite or outside its domain
    #[error("Invalid assumption {field}: {value}")]
    InvalidAssumption { field: &'static str, value: f64 },

    /// Date string could not be parsed
    #[error("Invalid date: {0}")]
    InvalidDate(String),
}

/// Alias for Result with `PlanningError`
pub type Result<T> = std::result::Result<T, PlanningError>;

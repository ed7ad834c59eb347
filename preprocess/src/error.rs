//! Error types for the inventory preprocessing pipeline.
//!
//! - [`InventoryError`] - failure reading one monthly CSV (file is skipped)
//! - [`SalesError`] - sales-summary JSON errors
//! - [`ReportError`] - reading or writing the summary report
//! - [`ConfigError`] - invalid environment overrides
//! - [`PipelineError`] - top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use std::path::PathBuf;
use thiserror::Error;

pub use crate::parser::CsvError;

// =============================================================================
// Inventory Errors
// =============================================================================

/// Errors while aggregating a single monthly inventory file.
///
/// None of these abort a run: the aggregator logs them and skips the file.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// The monthly file does not exist.
    #[error("Inventory file not found: {}", .0.display())]
    MissingSourceFile(PathBuf),

    /// Failed to open or read the file.
    #[error("Failed to read inventory file: {0}")]
    Io(#[from] std::io::Error),

    /// A required column is absent from the header row.
    #[error("Missing column '{column}' in {}", path.display())]
    MissingColumn { path: PathBuf, column: String },

    /// A row could not be parsed.
    #[error("Malformed row: {0}")]
    Csv(#[from] CsvError),
}

// =============================================================================
// Sales Errors
// =============================================================================

/// Errors from the sales-summary source.
#[derive(Debug, Error)]
pub enum SalesError {
    /// Failed to read the file.
    #[error("Failed to read sales file: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not a sales summary.
    #[error("Invalid sales JSON in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

// =============================================================================
// Report Errors
// =============================================================================

/// Errors reading or writing the summary report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// IO error.
    #[error("Report IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("Report JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Invalid configuration value.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A month is not written `YYYY.MM`.
    #[error("Invalid month '{0}', expected YYYY.MM")]
    InvalidMonth(String),

    /// An environment override could not be parsed.
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline errors.
///
/// Returned by [`crate::transform::pipeline::run_full`] and
/// [`crate::transform::pipeline::run_merge`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Sales source error.
    #[error("Sales error: {0}")]
    Sales(#[from] SalesError),

    /// Report error.
    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Merge mode needs an existing report to merge into.
    #[error("Existing report not found: {}", .0.display())]
    MissingMergeTarget(PathBuf),

    /// Merge mode was invoked without months.
    #[error("No months to merge")]
    NoMonths,
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for inventory operations.
pub type InventoryResult<T> = Result<T, InventoryError>;

/// Result type for sales operations.
pub type SalesResult<T> = Result<T, SalesError>;

/// Result type for report operations.
pub type ReportResult<T> = Result<T, ReportError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // ReportError -> PipelineError
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let pipeline_err: PipelineError = ReportError::from(io).into();
        assert!(pipeline_err.to_string().contains("read-only"));

        // ConfigError -> PipelineError
        let pipeline_err: PipelineError = ConfigError::InvalidMonth("2024-01".into()).into();
        assert!(pipeline_err.to_string().contains("2024-01"));
    }

    #[test]
    fn test_csv_error_into_inventory_error() {
        let err: InventoryError = CsvError::new(12, "invalid float literal")
            .with_column("预计库存金额")
            .into();
        let msg = err.to_string();
        assert!(msg.contains("Line 12"));
        assert!(msg.contains("预计库存金额"));
    }

    #[test]
    fn test_missing_merge_target_format() {
        let err = PipelineError::MissingMergeTarget(PathBuf::from("out/summary.json"));
        assert!(err.to_string().contains("out/summary.json"));
    }
}

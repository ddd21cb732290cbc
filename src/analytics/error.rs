//! Error types for analytics operations

use crate::error::AppError;

/// Result type for analytics operations
pub type AnalyticsResult<T> = std::result::Result<T, AnalyticsError>;

/// Errors that can occur in analytics operations
///
/// Missing data is never an error here: sparse inputs produce null fields,
/// empty lists or exclusion markers in the reports themselves.
#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    /// Invalid date range
    #[error("Invalid date range: {0}")]
    InvalidDateRange(String),

    /// Malformed input data (end before start, duplicate budget period,
    /// overlapping labor rates, negative quantities)
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    /// The snapshot could not be loaded
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl AnalyticsError {
    /// Short label used for metrics and log fields
    pub fn kind(&self) -> &'static str {
        match self {
            AnalyticsError::InvalidDateRange(_) => "invalid_date_range",
            AnalyticsError::DataIntegrity(_) => "data_integrity",
            AnalyticsError::Storage(_) => "storage",
            AnalyticsError::InvalidConfiguration(_) => "configuration",
        }
    }
}

impl From<AnalyticsError> for AppError {
    fn from(err: AnalyticsError) -> Self {
        match err {
            AnalyticsError::InvalidDateRange(msg) => AppError::Validation(msg),
            AnalyticsError::DataIntegrity(msg) => AppError::DataIntegrity(msg),
            AnalyticsError::InvalidConfiguration(msg) => AppError::Configuration(msg),
            AnalyticsError::Storage(msg) => AppError::Storage(msg),
        }
    }
}

//! Analytics error types.

use thiserror::Error;

/// Analytics errors.
///
/// Deliberately small: data-quality conditions are represented as
/// missing values in results, so only source failures and rejected
/// parameters appear here.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// The data source failed to produce a relation.
    #[error("data source error: {0}")]
    Source(#[from] edustats_source::SourceError),

    /// A query parameter failed validation before any computation.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type for analytics operations.
pub type Result<T> = std::result::Result<T, AnalyticsError>;

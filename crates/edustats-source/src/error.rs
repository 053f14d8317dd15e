//! Data-source error types.

use edustats_domain::Relation;
use thiserror::Error;

/// Data-source errors. These are the only failures that cross the
/// analytics boundary; everything data-quality-shaped is represented
/// as missing values instead.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The backend has no relation under this name.
    #[error("relation not found: {0}")]
    RelationNotFound(Relation),

    /// Backend-specific read failure (file unreadable, connection
    /// loss, malformed store).
    #[error("backend error: {0}")]
    Backend(String),

    /// IO error while reading a relation.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for data-source operations.
pub type Result<T> = std::result::Result<T, SourceError>;

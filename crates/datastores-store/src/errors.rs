//! Error handling for datastores-store
//!
//! Wraps datastores-core ExError with store-specific helpers

use std::path::Path;

use datastores_core::errors::{DatastoresError, ExError, ExErrorKind};

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create an IO error for `path`
pub fn io_error(operation: &str, path: &Path, err: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::Io)
        .with_op(operation.to_string())
        .with_entity_id(path.display().to_string())
        .with_message(err.to_string())
}

/// Create a parse error for a file that could not be decoded
pub fn parse_error(operation: &str, path: &Path, reason: impl std::fmt::Display) -> ExError {
    ExError::new(ExErrorKind::Serialization)
        .with_op(operation.to_string())
        .with_entity_id(path.display().to_string())
        .with_message(reason.to_string())
}

/// Create a validation error for file content that decoded but is unusable
pub fn invalid_file(operation: &str, path: &Path, reason: impl Into<String>) -> ExError {
    ExError::new(ExErrorKind::InvalidInput)
        .with_op(operation.to_string())
        .with_entity_id(path.display().to_string())
        .with_message(reason.into())
}

/// Lift a core error, keeping its classification
pub fn from_core(operation: &str, err: DatastoresError) -> ExError {
    ExError::from(err).with_op(operation.to_string())
}

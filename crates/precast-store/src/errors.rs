//! Error handling for precast-store
//!
//! Wraps precast-core ExError with store-specific helpers

use precast_core::errors::{ExError, ExErrorKind};
use rusqlite::ErrorCode;

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create a migration error
pub fn migration_error(migration_id: &str, reason: &str) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("migration")
        .with_message(format!("Migration {} failed: {}", migration_id, reason))
}

/// Create a checksum mismatch error
pub fn checksum_mismatch(migration_id: &str, expected: &str, actual: &str) -> ExError {
    ExError::new(ExErrorKind::ConstraintViolation)
        .with_op("migration_checksum")
        .with_message(format!(
            "Checksum mismatch for migration {}: expected {}, got {}",
            migration_id, expected, actual
        ))
}

/// Create a database error from rusqlite::Error
///
/// Constraint failures (including the balance CHECK and the ledger's
/// append-only triggers) become `ConstraintViolation`; an interrupted
/// statement becomes `Timeout`.
pub fn from_rusqlite(err: rusqlite::Error) -> ExError {
    let kind = match err.sqlite_error_code() {
        Some(ErrorCode::ConstraintViolation) => ExErrorKind::ConstraintViolation,
        Some(ErrorCode::OperationInterrupted) => ExErrorKind::Timeout,
        _ => ExErrorKind::Persistence,
    };
    ExError::new(kind)
        .with_op("sqlite")
        .with_message(err.to_string())
}

/// Create a serialization error for a column that failed to decode
pub fn decode_error(column: &str, reason: impl std::fmt::Display) -> ExError {
    ExError::new(ExErrorKind::Serialization)
        .with_op("sqlite_decode")
        .with_message(format!("Cannot decode column {}: {}", column, reason))
}

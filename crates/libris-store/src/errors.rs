//! Error helpers for libris-store
//!
//! Wraps backend errors into `LbError` with the right kind.

use libris_core::errors::{LbError, LbErrorKind};

/// Result type alias using LbError
pub type Result<T> = std::result::Result<T, LbError>;

pub fn migration_error(migration_id: &str, reason: &str) -> LbError {
    LbError::new(LbErrorKind::Persistence)
        .with_op("migration")
        .with_message(format!("Migration {} failed: {}", migration_id, reason))
}

pub fn checksum_mismatch(migration_id: &str, expected: &str, actual: &str) -> LbError {
    LbError::new(LbErrorKind::Persistence)
        .with_op("migration_checksum")
        .with_message(format!(
            "Checksum mismatch for migration {}: recorded {}, embedded {}",
            migration_id, expected, actual
        ))
}

pub fn binding_error(op: &str, message: impl Into<String>) -> LbError {
    LbError::new(LbErrorKind::Binding)
        .with_op(op.to_string())
        .with_message(message)
}

pub fn decoding_error(op: &str, message: impl Into<String>) -> LbError {
    LbError::new(LbErrorKind::Decoding)
        .with_op(op.to_string())
        .with_message(message)
}

pub fn transaction_error(op: &str, cause: LbError) -> LbError {
    LbError::new(LbErrorKind::Transaction)
        .with_op(op.to_string())
        .with_message("transaction control statement failed")
        .with_source(cause)
}

/// A write step failed and the transaction was rolled back; `cause` is the
/// step's own error.
pub fn write_rolled_back(op: &str, cause: LbError) -> LbError {
    LbError::new(LbErrorKind::Transaction)
        .with_op(op.to_string())
        .with_message("write rolled back after step failure")
        .with_source(cause)
}

pub fn cancelled_error(op: &str) -> LbError {
    LbError::new(LbErrorKind::Cancelled)
        .with_op(op.to_string())
        .with_message("request cancelled by caller")
}

/// Map a rusqlite error; an interrupted statement is a timeout.
pub fn from_rusqlite(err: rusqlite::Error) -> LbError {
    let kind = match &err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::OperationInterrupted =>
        {
            LbErrorKind::Timeout
        }
        rusqlite::Error::FromSqlConversionFailure(..)
        | rusqlite::Error::InvalidColumnType(..)
        | rusqlite::Error::Utf8Error(_) => LbErrorKind::Decoding,
        rusqlite::Error::InvalidParameterCount(..) | rusqlite::Error::InvalidParameterName(_) => {
            LbErrorKind::Binding
        }
        _ => LbErrorKind::Persistence,
    };
    LbError::new(kind)
        .with_op("sqlite")
        .with_message(err.to_string())
}

/// Map a sqlx error; `57014` (query_canceled) is a statement timeout.
#[cfg(feature = "postgres")]
pub fn from_sqlx(err: sqlx::Error) -> LbError {
    let kind = match &err {
        sqlx::Error::Database(db) if db.code().as_deref() == Some("57014") => {
            LbErrorKind::Timeout
        }
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => LbErrorKind::Decoding,
        sqlx::Error::Configuration(_) => LbErrorKind::Configuration,
        sqlx::Error::Io(_) => LbErrorKind::Io,
        _ => LbErrorKind::Persistence,
    };
    LbError::new(kind)
        .with_op("postgres")
        .with_message(err.to_string())
}

pub fn io_error(operation: &str, err: std::io::Error) -> LbError {
    LbError::new(LbErrorKind::Io)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interrupt_maps_to_timeout() {
        let err = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_INTERRUPT),
            None,
        );
        assert_eq!(from_rusqlite(err).kind(), LbErrorKind::Timeout);
    }

    #[test]
    fn test_rolled_back_write_keeps_cause() {
        let cause = binding_error("link_authors", "2 placeholders, 1 argument");
        let err = write_rolled_back("create_book", cause);
        assert_eq!(err.kind(), LbErrorKind::Transaction);
        assert_eq!(
            err.source_error().map(|e| e.kind()),
            Some(LbErrorKind::Binding)
        );
    }

    #[test]
    fn test_parameter_count_maps_to_binding() {
        let err = rusqlite::Error::InvalidParameterCount(1, 2);
        assert_eq!(from_rusqlite(err).kind(), LbErrorKind::Binding);
    }

    #[test]
    fn test_constraint_failure_is_persistence() {
        let err = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CONSTRAINT),
            Some("UNIQUE constraint failed: authors.name".to_string()),
        );
        let mapped = from_rusqlite(err);
        assert_eq!(mapped.kind(), LbErrorKind::Persistence);
        assert!(mapped.message().contains("authors.name"));
    }
}

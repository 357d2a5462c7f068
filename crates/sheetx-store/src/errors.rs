//! Error handling for sheetx-store
//!
//! Wraps sheetx-core ExError with store-specific helpers

use sheetx_core::errors::{ExError, ExErrorKind, SheetXError};
use sheetx_core::SessionError;
use std::path::Path;

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create an IO error
pub fn io_error(operation: &str, err: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::Io)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}

/// Create a serialization error for a document at `path`
pub fn document_error(operation: &str, path: &Path, err: serde_json::Error) -> ExError {
    ExError::new(ExErrorKind::Serialization)
        .with_op(operation.to_string())
        .with_entity_id(path.display().to_string())
        .with_message(format!("{}: {}", path.display(), err))
}

/// Creating a workbook over an existing file
pub fn workbook_exists(path: &Path) -> ExError {
    ExError::new(ExErrorKind::AlreadyExists)
        .with_op("workbook_create")
        .with_entity_id(path.display().to_string())
        .with_message(format!("workbook file {} already exists", path.display()))
}

/// Opening a workbook file that is not there
pub fn workbook_missing(path: &Path) -> ExError {
    ExError::new(ExErrorKind::NotFound)
        .with_op("workbook_open")
        .with_entity_id(path.display().to_string())
        .with_message(format!("workbook file {} not found", path.display()))
}

/// Another process holds the workbook's lock file
pub fn workbook_locked(lock_path: &Path, workbook_id: &str) -> ExError {
    ExError::new(ExErrorKind::BatchInProgress)
        .with_op("workbook_lock")
        .with_entity_id(workbook_id)
        .with_message(format!(
            "lock file {} is held by another process; delete it if no sheetx run is active",
            lock_path.display()
        ))
}

/// Retained snapshot whose content no longer matches its digest
pub fn digest_mismatch(path: &Path) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("vault_read")
        .with_entity_id(path.display().to_string())
        .with_message(format!("snapshot file {} failed digest verification", path.display()))
}

/// Vault failures surface through the core vault trait as persistence errors
pub fn into_persistence(err: ExError) -> SheetXError {
    SheetXError::Persistence {
        message: err.to_string(),
    }
}

/// Session failures surface through the core session trait
///
/// Interrupted or timed-out I/O may succeed on retry; anything else means
/// the document cannot be used right now.
pub fn into_session(err: &ExError, io_kind: Option<std::io::ErrorKind>) -> SessionError {
    use std::io::ErrorKind;

    let message = err.to_string();
    match io_kind {
        Some(ErrorKind::Interrupted | ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
            SessionError::Transient { message }
        }
        _ => SessionError::Unavailable { message },
    }
}

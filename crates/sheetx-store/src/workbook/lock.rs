//! Cross-process lock on a workbook file
//!
//! The in-process `BatchGuard` only sees batches run through one applier.
//! Separate `sheetx` processes coordinate through `<workbook>.lock`, created
//! exclusively and removed when the lock is dropped.

use crate::errors::{io_error, workbook_locked, Result};
use sheetx_core_types::WorkbookId;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Held for as long as one process works on the workbook
#[derive(Debug)]
pub struct WorkbookLock {
    path: PathBuf,
}

impl WorkbookLock {
    /// Create the lock file next to `workbook_path`
    ///
    /// # Errors
    ///
    /// Returns `BatchInProgress` if the lock file already exists, or an I/O
    /// error if it cannot be created.
    pub fn acquire(workbook_path: &Path, workbook_id: &WorkbookId) -> Result<Self> {
        let path = lock_path(workbook_path);
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(workbook_locked(&path, workbook_id.as_str()));
            }
            Err(e) => return Err(io_error("workbook_lock", e)),
        };
        // Owner pid, for whoever finds a stale lock
        writeln!(file, "{}", std::process::id()).map_err(|e| io_error("workbook_lock", e))?;
        tracing::debug!(path = %path.display(), workbook_id = %workbook_id, "workbook locked");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for WorkbookLock {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %err, "could not release workbook lock");
        }
    }
}

fn lock_path(workbook_path: &Path) -> PathBuf {
    let mut name = workbook_path.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheetx_core::errors::ExErrorKind;
    use tempfile::TempDir;

    #[test]
    fn test_second_lock_refused_until_release() {
        let dir = TempDir::new().unwrap();
        let book = dir.path().join("book.json");
        let id = WorkbookId::new("book");

        let first = WorkbookLock::acquire(&book, &id).unwrap();
        assert_eq!(first.path(), dir.path().join("book.json.lock"));

        let err = WorkbookLock::acquire(&book, &id).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::BatchInProgress);
        assert_eq!(err.code(), "ERR_BATCH_IN_PROGRESS");

        drop(first);
        assert!(!dir.path().join("book.json.lock").exists());
        assert!(WorkbookLock::acquire(&book, &id).is_ok());
    }
}

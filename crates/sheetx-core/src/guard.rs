//! One in-flight batch per workbook
//!
//! `try_acquire` hands out a lease that releases the workbook when
//! dropped. A second acquisition for the same workbook while the lease is
//! alive is rejected, never queued.
//!
//! The guard covers appliers sharing it inside one process. File-backed
//! workbooks shared between processes are also covered by
//! `sheetx_store::WorkbookLock`.

use crate::errors::{Result, SheetXError};
use sheetx_core_types::WorkbookId;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Default)]
pub struct BatchGuard {
    active: Arc<Mutex<HashSet<WorkbookId>>>,
}

impl BatchGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    ///
    /// Returns `SheetXError::BatchInProgress` when the workbook is already
    /// leased, or `Internal` if the lock is poisoned.
    pub fn try_acquire(&self, workbook_id: &WorkbookId) -> Result<BatchLease> {
        let mut active = self.active.lock().map_err(|_| SheetXError::Internal {
            message: "batch guard lock poisoned".to_string(),
        })?;
        if !active.insert(workbook_id.clone()) {
            return Err(SheetXError::BatchInProgress {
                workbook_id: workbook_id.to_string(),
            });
        }
        Ok(BatchLease {
            active: Arc::clone(&self.active),
            workbook_id: workbook_id.clone(),
        })
    }

    pub fn is_active(&self, workbook_id: &WorkbookId) -> bool {
        self.active
            .lock()
            .map(|a| a.contains(workbook_id))
            .unwrap_or(false)
    }
}

/// Exclusive claim on one workbook for the life of a batch
#[derive(Debug)]
pub struct BatchLease {
    active: Arc<Mutex<HashSet<WorkbookId>>>,
    workbook_id: WorkbookId,
}

impl BatchLease {
    pub fn workbook_id(&self) -> &WorkbookId {
        &self.workbook_id
    }
}

impl Drop for BatchLease {
    fn drop(&mut self) {
        if let Ok(mut active) = self.active.lock() {
            active.remove(&self.workbook_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_rejected_until_drop() {
        let guard = BatchGuard::new();
        let wb = WorkbookId::new("book.json");

        let lease = guard.try_acquire(&wb).unwrap();
        let err = guard.try_acquire(&wb).unwrap_err();
        assert!(matches!(err, SheetXError::BatchInProgress { .. }));

        drop(lease);
        assert!(!guard.is_active(&wb));
        assert!(guard.try_acquire(&wb).is_ok());
    }

    #[test]
    fn test_different_workbooks_independent() {
        let guard = BatchGuard::new();
        let _a = guard.try_acquire(&WorkbookId::new("a")).unwrap();
        assert!(guard.try_acquire(&WorkbookId::new("b")).is_ok());
    }

    #[test]
    fn test_clones_share_state() {
        let guard = BatchGuard::new();
        let other = guard.clone();
        let _lease = guard.try_acquire(&WorkbookId::new("a")).unwrap();
        assert!(other.try_acquire(&WorkbookId::new("a")).is_err());
    }
}

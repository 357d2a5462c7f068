//! Pre-batch state capture and restore
//!
//! A snapshot holds whole copies of every sheet a batch touches plus the
//! named-range table. Rollback writes them back verbatim; there are no
//! per-operation inverses.
//!
//! Persistence of retained snapshots lives behind `SnapshotVault`.

pub mod digest;
pub mod vault;

pub use digest::{named_ranges_digest, sheet_digest, state_digest};
pub use vault::{CommittedState, InMemorySnapshotVault, RetainedSnapshot, SnapshotKey, SnapshotVault};

use crate::config::ApplierConfig;
use crate::errors::{Result, SheetXError};
use crate::io::{bounded, IoFailure};
use crate::model::{NamedRanges, Sheet};
use crate::session::WorkbookSession;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sheetx_core_types::{BatchId, WorkbookId};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

/// Restorable capture of pre-batch state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub workbook_id: WorkbookId,
    pub batch_id: BatchId,
    pub taken_at: DateTime<Utc>,
    /// `None` records a sheet that did not exist before the batch
    pub sheets: BTreeMap<String, Option<Sheet>>,
    pub named_ranges: NamedRanges,
    pub digest: String,
}

impl Snapshot {
    pub fn key(&self) -> SnapshotKey {
        SnapshotKey {
            workbook_id: self.workbook_id.clone(),
            batch_id: self.batch_id.clone(),
            taken_at: self.taken_at,
        }
    }

    /// Recompute the digest and compare with the stored one
    ///
    /// # Errors
    ///
    /// Returns `SheetXError::Serialization` if JSON serialization fails.
    pub fn verify(&self) -> Result<bool> {
        Ok(state_digest(&self.sheets, &self.named_ranges)? == self.digest)
    }
}

#[derive(Debug, Clone)]
pub struct SnapshotManager {
    io_timeout: Duration,
    verify_restore: bool,
}

impl SnapshotManager {
    pub fn new(config: &ApplierConfig) -> Self {
        Self {
            io_timeout: config.io_timeout(),
            verify_restore: config.verify_restore,
        }
    }

    /// Capture the listed sheets and the named-range table
    ///
    /// # Errors
    ///
    /// Returns `SheetXError::SnapshotCapture` if any read fails or overruns
    /// its bound. Nothing is written either way.
    pub fn capture(
        &self,
        session: &dyn WorkbookSession,
        sheets: &BTreeSet<String>,
        batch_id: &BatchId,
    ) -> Result<Snapshot> {
        let mut captured = BTreeMap::new();
        for name in sheets {
            let sheet = bounded("read_sheet", self.io_timeout, || session.read_sheet(name))
                .map_err(|e| capture_error(Some(name), e))?;
            captured.insert(name.clone(), sheet);
        }
        let named_ranges = bounded("named_ranges", self.io_timeout, || session.named_ranges())
            .map_err(|e| capture_error(None, e))?;

        let digest = state_digest(&captured, &named_ranges)?;
        tracing::debug!(
            batch_id = %batch_id,
            sheet_count = captured.len(),
            digest = %digest,
            "snapshot captured"
        );

        Ok(Snapshot {
            workbook_id: session.workbook_id(),
            batch_id: batch_id.clone(),
            taken_at: Utc::now(),
            sheets: captured,
            named_ranges,
            digest,
        })
    }

    /// Write the captured state back
    ///
    /// Idempotent: every sheet is replaced wholesale, sheets absent before
    /// the batch are removed, and the named-range table is overwritten.
    ///
    /// # Errors
    ///
    /// Returns `SheetXError::Restore` carrying `applied` when any write
    /// fails, overruns its bound, or the read-back digest differs.
    pub fn restore(&self, session: &mut dyn WorkbookSession, snapshot: &Snapshot, applied: &[u32]) -> Result<()> {
        let fail = |message: String| SheetXError::Restore {
            message,
            applied: applied.to_vec(),
        };

        for (name, sheet) in &snapshot.sheets {
            let written = match sheet {
                Some(sheet) => bounded("write_sheet", self.io_timeout, || session.write_sheet(sheet)),
                None => bounded("remove_sheet", self.io_timeout, || session.remove_sheet(name)),
            };
            written.map_err(|e| fail(format!("sheet {}: {}", name, e)))?;
        }
        bounded("write_named_ranges", self.io_timeout, || {
            session.write_named_ranges(&snapshot.named_ranges)
        })
        .map_err(|e| fail(format!("named ranges: {}", e)))?;

        if self.verify_restore {
            self.verify_restored(&*session, snapshot).map_err(fail)?;
        }
        Ok(())
    }

    fn verify_restored(&self, session: &dyn WorkbookSession, snapshot: &Snapshot) -> std::result::Result<(), String> {
        for (name, expected) in &snapshot.sheets {
            let actual = bounded("read_sheet", self.io_timeout, || session.read_sheet(name))
                .map_err(|e| format!("read-back of {}: {}", name, e))?;
            let same = sheet_digest(actual.as_ref()).map_err(|e| e.to_string())?
                == sheet_digest(expected.as_ref()).map_err(|e| e.to_string())?;
            if !same {
                return Err(format!("sheet {} differs from snapshot after restore", name));
            }
        }
        Ok(())
    }
}

fn capture_error(sheet: Option<&String>, failure: IoFailure) -> SheetXError {
    SheetXError::SnapshotCapture {
        sheet: sheet.cloned(),
        message: failure.to_string(),
    }
}

//! File-backed snapshot vault
//!
//! Each retained snapshot is one JSON file. On read the snapshot's state
//! digest is recomputed and compared, so a file edited or truncated on
//! disk is refused rather than restored.

mod layout;

use crate::atomic::atomic_write;
use crate::errors::{digest_mismatch, document_error, into_persistence, io_error, Result};
use chrono::{DateTime, Utc};
use layout::{is_batch_file, snapshot_path, workbook_dir};
use sheetx_core::errors::{ExError, SheetXError};
use sheetx_core::snapshot::{RetainedSnapshot, SnapshotKey};
use sheetx_core::SnapshotVault;
use sheetx_core_types::{BatchId, WorkbookId};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct FsSnapshotVault {
    root: PathBuf,
}

impl FsSnapshotVault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read_file(path: &Path) -> Result<RetainedSnapshot> {
        let bytes = fs::read(path).map_err(|e| io_error("vault_read", e))?;
        let retained: RetainedSnapshot =
            serde_json::from_slice(&bytes).map_err(|e| document_error("vault_read", path, e))?;
        if !retained.snapshot.verify().map_err(ExError::from)? {
            return Err(digest_mismatch(path));
        }
        Ok(retained)
    }

    /// Snapshot files under `dir`, oldest first; a missing dir is empty
    fn files_in(dir: &Path) -> Result<Vec<PathBuf>> {
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut files: Vec<PathBuf> = fs::read_dir(dir)
            .map_err(|e| io_error("vault_list", e))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        files.sort();
        Ok(files)
    }

    fn find(&self, workbook_id: &WorkbookId, batch_id: &BatchId) -> sheetx_core::Result<Option<PathBuf>> {
        let dir = workbook_dir(&self.root, workbook_id);
        Ok(Self::files_in(&dir)
            .map_err(into_persistence)?
            .into_iter()
            .find(|p| is_batch_file(p, batch_id)))
    }

    fn workbook_dirs(&self) -> Result<Vec<PathBuf>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        Ok(fs::read_dir(&self.root)
            .map_err(|e| io_error("vault_list", e))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_dir())
            .collect())
    }
}

impl SnapshotVault for FsSnapshotVault {
    fn put(&mut self, retained: RetainedSnapshot) -> sheetx_core::Result<()> {
        let path = snapshot_path(&self.root, &retained.snapshot.key());
        let bytes = serde_json::to_vec_pretty(&retained)?;
        atomic_write(&path, &bytes).map_err(into_persistence)?;
        tracing::debug!(
            batch_id = %retained.snapshot.batch_id,
            expires_at = %retained.expires_at,
            path = %path.display(),
            "snapshot retained"
        );
        Ok(())
    }

    fn get(&self, workbook_id: &WorkbookId, batch_id: &BatchId) -> sheetx_core::Result<RetainedSnapshot> {
        let not_found = || SheetXError::SnapshotNotFound {
            batch_id: batch_id.to_string(),
        };
        let path = self.find(workbook_id, batch_id)?.ok_or_else(not_found)?;
        let retained = Self::read_file(&path).map_err(into_persistence)?;
        if &retained.snapshot.workbook_id != workbook_id {
            return Err(not_found());
        }
        Ok(retained)
    }

    fn remove(&mut self, workbook_id: &WorkbookId, batch_id: &BatchId) -> sheetx_core::Result<()> {
        if let Some(path) = self.find(workbook_id, batch_id)? {
            fs::remove_file(&path).map_err(|e| into_persistence(io_error("vault_remove", e)))?;
            tracing::debug!(batch_id = %batch_id, path = %path.display(), "retained snapshot dropped");
        }
        Ok(())
    }

    fn purge_expired(&mut self, now: DateTime<Utc>) -> sheetx_core::Result<usize> {
        let mut purged = 0;
        for dir in self.workbook_dirs().map_err(into_persistence)? {
            for path in Self::files_in(&dir).map_err(into_persistence)? {
                match Self::read_file(&path) {
                    Ok(retained) if retained.is_expired(now) => {
                        fs::remove_file(&path)
                            .map_err(|e| into_persistence(io_error("vault_remove", e)))?;
                        purged += 1;
                    }
                    Ok(_) => {}
                    Err(err) => {
                        tracing::warn!(path = %path.display(), error = %err, "skipping unreadable snapshot file");
                    }
                }
            }
        }
        Ok(purged)
    }

    fn list(&self, workbook_id: &WorkbookId) -> sheetx_core::Result<Vec<(SnapshotKey, DateTime<Utc>)>> {
        let dir = workbook_dir(&self.root, workbook_id);
        let mut keys = Vec::new();
        for path in Self::files_in(&dir).map_err(into_persistence)? {
            match Self::read_file(&path) {
                Ok(retained) => keys.push((retained.snapshot.key(), retained.expires_at)),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "skipping unreadable snapshot file");
                }
            }
        }
        keys.sort_by_key(|(k, _)| k.taken_at);
        Ok(keys)
    }
}

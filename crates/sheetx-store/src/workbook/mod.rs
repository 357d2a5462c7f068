//! File-backed workbook session
//!
//! The workbook is one JSON document. Every session call re-reads the file,
//! so a change made by another process between calls is seen by the next
//! call, and every write replaces the whole document atomically.

mod lock;

pub use lock::WorkbookLock;

use crate::atomic::atomic_write;
use crate::errors::{
    document_error, into_session, io_error, workbook_exists, workbook_missing, Result,
};
use sheetx_core::model::{ChangeRecord, NamedRanges, WorkbookSchema};
use sheetx_core::{SessionError, Sheet, Workbook, WorkbookSession};
use sheetx_core_types::WorkbookId;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct FsWorkbookSession {
    path: PathBuf,
    id: WorkbookId,
}

impl FsWorkbookSession {
    /// Write `workbook` to a new file at `path`
    ///
    /// # Errors
    ///
    /// Returns `AlreadyExists` if the file is there, or an I/O error.
    pub fn create(path: impl Into<PathBuf>, workbook: &Workbook) -> Result<Self> {
        let path = path.into();
        if path.exists() {
            return Err(workbook_exists(&path));
        }
        let bytes = serde_json::to_vec_pretty(workbook)
            .map_err(|e| document_error("workbook_create", &path, e))?;
        atomic_write(&path, &bytes)?;
        tracing::debug!(path = %path.display(), workbook_id = %workbook.id, "workbook created");
        Ok(Self {
            id: workbook.id.clone(),
            path,
        })
    }

    /// Open an existing workbook file
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the file is missing, or an I/O or
    /// serialization error if it cannot be read.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            return Err(workbook_missing(&path));
        }
        let workbook = read_document(&path)?;
        Ok(Self {
            id: workbook.id,
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Take the cross-process lock on this workbook
    ///
    /// # Errors
    ///
    /// Returns `BatchInProgress` while another process holds it.
    pub fn lock(&self) -> Result<WorkbookLock> {
        WorkbookLock::acquire(&self.path, &self.id)
    }

    /// Current document contents
    ///
    /// # Errors
    ///
    /// Returns an I/O or serialization error if the file cannot be read.
    pub fn load(&self) -> Result<Workbook> {
        read_document(&self.path)
    }

    fn read_doc(&self) -> std::result::Result<Workbook, SessionError> {
        let bytes = fs::read(&self.path).map_err(|e| {
            let kind = e.kind();
            into_session(&io_error("workbook_read", e), Some(kind))
        })?;
        serde_json::from_slice(&bytes)
            .map_err(|e| into_session(&document_error("workbook_read", &self.path, e), None))
    }

    fn update(&mut self, change: impl FnOnce(&mut Workbook)) -> std::result::Result<(), SessionError> {
        let mut workbook = self.read_doc()?;
        change(&mut workbook);
        let bytes = serde_json::to_vec_pretty(&workbook)
            .map_err(|e| into_session(&document_error("workbook_write", &self.path, e), None))?;
        atomic_write(&self.path, &bytes).map_err(|e| SessionError::Transient {
            message: e.to_string(),
        })
    }
}

fn read_document(path: &Path) -> Result<Workbook> {
    let bytes = fs::read(path).map_err(|e| io_error("workbook_read", e))?;
    serde_json::from_slice(&bytes).map_err(|e| document_error("workbook_read", path, e))
}

impl WorkbookSession for FsWorkbookSession {
    fn workbook_id(&self) -> WorkbookId {
        self.id.clone()
    }

    fn schema(&self) -> std::result::Result<WorkbookSchema, SessionError> {
        Ok(self.read_doc()?.schema())
    }

    fn read_sheet(&self, name: &str) -> std::result::Result<Option<Sheet>, SessionError> {
        Ok(self.read_doc()?.sheets.remove(name))
    }

    fn write_sheet(&mut self, sheet: &Sheet) -> std::result::Result<(), SessionError> {
        self.update(|wb| {
            wb.sheets.insert(sheet.name.clone(), sheet.clone());
        })
    }

    fn remove_sheet(&mut self, name: &str) -> std::result::Result<(), SessionError> {
        self.update(|wb| {
            wb.sheets.remove(name);
        })
    }

    fn named_ranges(&self) -> std::result::Result<NamedRanges, SessionError> {
        Ok(self.read_doc()?.named_ranges)
    }

    fn write_named_ranges(&mut self, ranges: &NamedRanges) -> std::result::Result<(), SessionError> {
        self.update(|wb| wb.named_ranges = ranges.clone())
    }

    fn append_history(&mut self, records: &[ChangeRecord]) -> std::result::Result<(), SessionError> {
        self.update(|wb| wb.history.extend_from_slice(records))
    }
}

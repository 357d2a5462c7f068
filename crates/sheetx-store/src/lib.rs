//! SheetX Store - file-backed persistence
//!
//! Provides:
//! - `FsWorkbookSession`: a JSON workbook document behind the
//!   `WorkbookSession` seam, written with temp→rename
//! - `FsSnapshotVault`: retained snapshots on disk, one file per batch,
//!   verified against their SHA-256 digest on read
//! - `WorkbookLock`: `<workbook>.lock`, so separate processes never run
//!   batches on one file at the same time

pub mod errors;
pub mod vault;
pub mod workbook;

mod atomic;

pub use errors::Result;
pub use vault::FsSnapshotVault;
pub use workbook::{FsWorkbookSession, WorkbookLock};

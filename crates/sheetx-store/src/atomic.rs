//! Atomic write primitive
//!
//! Uses temp→rename so a reader never sees a partial document

use crate::errors::{io_error, Result};
use std::fs;
use std::path::Path;

/// Atomically replace `target_path` with `content`
pub fn atomic_write(target_path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = target_path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_error("create_parent_dir", e))?;
    }

    // same directory, so the rename stays on one filesystem
    let temp_path = target_path.with_extension("tmp");
    fs::write(&temp_path, content).map_err(|e| io_error("write_temp", e))?;
    fs::rename(&temp_path, target_path).map_err(|e| io_error("rename_temp", e))?;

    Ok(())
}

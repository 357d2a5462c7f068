//! On-disk layout of the snapshot vault
//!
//! `<root>/<workbook digest prefix>/<taken_at millis>-<batch id>.json`
//!
//! Workbook ids are often file paths, so the directory name is a digest
//! prefix of the id rather than the id itself.

use sha2::{Digest, Sha256};
use sheetx_core::snapshot::SnapshotKey;
use sheetx_core_types::{BatchId, WorkbookId};
use std::path::{Path, PathBuf};

const WORKBOOK_DIR_LEN: usize = 16;

pub fn workbook_dir(root: &Path, workbook_id: &WorkbookId) -> PathBuf {
    let digest = hex::encode(Sha256::digest(workbook_id.as_str().as_bytes()));
    root.join(&digest[..WORKBOOK_DIR_LEN])
}

pub fn snapshot_path(root: &Path, key: &SnapshotKey) -> PathBuf {
    workbook_dir(root, &key.workbook_id).join(format!(
        "{:013}-{}.json",
        key.taken_at.timestamp_millis(),
        key.batch_id
    ))
}

/// Whether `path` names the file of `batch_id`
pub fn is_batch_file(path: &Path, batch_id: &BatchId) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(&format!("-{}.json", batch_id)))
}

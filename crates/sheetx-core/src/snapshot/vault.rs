//! Retention of committed snapshots for external rollback requests

use crate::errors::{Result, SheetXError};
use crate::snapshot::{named_ranges_digest, sheet_digest, Snapshot};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sheetx_core_types::{BatchId, WorkbookId};
use std::collections::BTreeMap;

/// Identity of a retained snapshot
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SnapshotKey {
    pub workbook_id: WorkbookId,
    pub batch_id: BatchId,
    pub taken_at: DateTime<Utc>,
}

/// Digests of what a batch left behind, sheet by sheet
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CommittedState {
    pub sheets: BTreeMap<String, String>,
    pub named_ranges: String,
}

impl CommittedState {
    /// Digest the post-commit capture of the batch's sheets
    ///
    /// # Errors
    ///
    /// Returns `SheetXError::Serialization` if JSON serialization fails.
    pub fn of(committed: &Snapshot) -> Result<Self> {
        let sheets = committed
            .sheets
            .iter()
            .map(|(name, sheet)| Ok((name.clone(), sheet_digest(sheet.as_ref())?)))
            .collect::<Result<_>>()?;
        Ok(Self {
            sheets,
            named_ranges: named_ranges_digest(&committed.named_ranges)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetainedSnapshot {
    pub snapshot: Snapshot,
    pub expires_at: DateTime<Utc>,
    pub committed: CommittedState,
}

impl RetainedSnapshot {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Whether restoring over `current` only undoes this batch
    ///
    /// Every sheet and the named-range table must hold either what the
    /// batch committed or what the snapshot restores. The second case
    /// covers a rollback retried after a partial restore.
    ///
    /// # Errors
    ///
    /// Returns `SheetXError::Serialization` if JSON serialization fails.
    pub fn restorable_over(&self, current: &Snapshot) -> Result<bool> {
        for (name, sheet) in &current.sheets {
            let now = sheet_digest(sheet.as_ref())?;
            let before = sheet_digest(self.snapshot.sheets.get(name).and_then(Option::as_ref))?;
            if self.committed.sheets.get(name) != Some(&now) && now != before {
                return Ok(false);
            }
        }
        let names_now = named_ranges_digest(&current.named_ranges)?;
        Ok(names_now == self.committed.named_ranges
            || names_now == named_ranges_digest(&self.snapshot.named_ranges)?)
    }
}

/// Storage for snapshots kept past commit
pub trait SnapshotVault {
    /// # Errors
    ///
    /// Returns `SheetXError::Persistence` if the snapshot cannot be stored.
    fn put(&mut self, retained: RetainedSnapshot) -> Result<()>;

    /// Read the snapshot of `batch_id` without removing it
    ///
    /// # Errors
    ///
    /// Returns `SnapshotNotFound` or `Persistence`.
    fn get(&self, workbook_id: &WorkbookId, batch_id: &BatchId) -> Result<RetainedSnapshot>;

    /// Drop the snapshot of `batch_id`; an absent entry is not an error
    ///
    /// # Errors
    ///
    /// Returns `SheetXError::Persistence` on storage failure.
    fn remove(&mut self, workbook_id: &WorkbookId, batch_id: &BatchId) -> Result<()>;

    /// Remove and return the snapshot of `batch_id`
    ///
    /// An expired snapshot is dropped and reported as expired.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotNotFound`, `SnapshotExpired` or `Persistence`.
    fn take(&mut self, workbook_id: &WorkbookId, batch_id: &BatchId, now: DateTime<Utc>) -> Result<Snapshot> {
        let retained = self.get(workbook_id, batch_id)?;
        self.remove(workbook_id, batch_id)?;
        if retained.is_expired(now) {
            return Err(SheetXError::SnapshotExpired {
                batch_id: batch_id.to_string(),
            });
        }
        Ok(retained.snapshot)
    }

    /// Drop every snapshot past its window; returns how many went
    ///
    /// # Errors
    ///
    /// Returns `SheetXError::Persistence` on storage failure.
    fn purge_expired(&mut self, now: DateTime<Utc>) -> Result<usize>;

    /// Keys currently held for a workbook, oldest first
    ///
    /// # Errors
    ///
    /// Returns `SheetXError::Persistence` on storage failure.
    fn list(&self, workbook_id: &WorkbookId) -> Result<Vec<(SnapshotKey, DateTime<Utc>)>>;
}

#[derive(Debug, Default)]
pub struct InMemorySnapshotVault {
    entries: BTreeMap<SnapshotKey, RetainedSnapshot>,
}

impl InMemorySnapshotVault {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn key_of(&self, workbook_id: &WorkbookId, batch_id: &BatchId) -> Option<SnapshotKey> {
        self.entries
            .keys()
            .find(|k| &k.workbook_id == workbook_id && &k.batch_id == batch_id)
            .cloned()
    }
}

impl SnapshotVault for InMemorySnapshotVault {
    fn put(&mut self, retained: RetainedSnapshot) -> Result<()> {
        self.entries.insert(retained.snapshot.key(), retained);
        Ok(())
    }

    fn get(&self, workbook_id: &WorkbookId, batch_id: &BatchId) -> Result<RetainedSnapshot> {
        self.key_of(workbook_id, batch_id)
            .and_then(|key| self.entries.get(&key).cloned())
            .ok_or_else(|| SheetXError::SnapshotNotFound {
                batch_id: batch_id.to_string(),
            })
    }

    fn remove(&mut self, workbook_id: &WorkbookId, batch_id: &BatchId) -> Result<()> {
        if let Some(key) = self.key_of(workbook_id, batch_id) {
            self.entries.remove(&key);
        }
        Ok(())
    }

    fn purge_expired(&mut self, now: DateTime<Utc>) -> Result<usize> {
        let before = self.entries.len();
        self.entries.retain(|_, r| !r.is_expired(now));
        Ok(before - self.entries.len())
    }

    fn list(&self, workbook_id: &WorkbookId) -> Result<Vec<(SnapshotKey, DateTime<Utc>)>> {
        let mut keys: Vec<_> = self
            .entries
            .iter()
            .filter(|(k, _)| &k.workbook_id == workbook_id)
            .map(|(k, r)| (k.clone(), r.expires_at))
            .collect();
        keys.sort_by_key(|(k, _)| k.taken_at);
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn retained(batch_id: &BatchId, expires_in: Duration) -> RetainedSnapshot {
        let now = Utc::now();
        RetainedSnapshot {
            snapshot: Snapshot {
                workbook_id: WorkbookId::new("wb"),
                batch_id: batch_id.clone(),
                taken_at: now,
                sheets: BTreeMap::new(),
                named_ranges: BTreeMap::new(),
                digest: String::new(),
            },
            expires_at: now + expires_in,
            committed: CommittedState::default(),
        }
    }

    #[test]
    fn test_take_within_window() {
        let mut vault = InMemorySnapshotVault::new();
        let batch = BatchId::new();
        vault.put(retained(&batch, Duration::minutes(15))).unwrap();

        let snapshot = vault.take(&WorkbookId::new("wb"), &batch, Utc::now()).unwrap();
        assert_eq!(snapshot.batch_id, batch);
        assert!(vault.is_empty());
    }

    #[test]
    fn test_take_expired_is_refused_and_dropped() {
        let mut vault = InMemorySnapshotVault::new();
        let batch = BatchId::new();
        vault.put(retained(&batch, Duration::seconds(-1))).unwrap();

        let err = vault.take(&WorkbookId::new("wb"), &batch, Utc::now()).unwrap_err();
        assert!(matches!(err, SheetXError::SnapshotExpired { .. }));
        assert!(vault.is_empty());
    }

    #[test]
    fn test_get_leaves_entry_in_place() {
        let mut vault = InMemorySnapshotVault::new();
        let batch = BatchId::new();
        vault.put(retained(&batch, Duration::minutes(15))).unwrap();

        let first = vault.get(&WorkbookId::new("wb"), &batch).unwrap();
        let second = vault.get(&WorkbookId::new("wb"), &batch).unwrap();
        assert_eq!(first, second);
        assert_eq!(vault.len(), 1);

        vault.remove(&WorkbookId::new("wb"), &batch).unwrap();
        vault.remove(&WorkbookId::new("wb"), &batch).unwrap();
        assert!(vault.is_empty());
    }

    #[test]
    fn test_take_unknown() {
        let mut vault = InMemorySnapshotVault::new();
        let err = vault
            .take(&WorkbookId::new("wb"), &BatchId::new(), Utc::now())
            .unwrap_err();
        assert!(matches!(err, SheetXError::SnapshotNotFound { .. }));
    }

    #[test]
    fn test_purge_only_expired() {
        let mut vault = InMemorySnapshotVault::new();
        vault.put(retained(&BatchId::new(), Duration::seconds(-5))).unwrap();
        vault.put(retained(&BatchId::new(), Duration::minutes(5))).unwrap();

        assert_eq!(vault.purge_expired(Utc::now()).unwrap(), 1);
        assert_eq!(vault.list(&WorkbookId::new("wb")).unwrap().len(), 1);
    }
}

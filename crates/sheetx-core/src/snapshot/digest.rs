//! Deterministic digests of captured workbook state
//!
//! Canonical JSON (sorted maps throughout the model) hashed with SHA-256
//! and hex-encoded. Equal content gives equal digests regardless of when
//! or by which batch it was captured.

use crate::errors::Result;
use crate::model::{NamedRanges, Sheet};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Digest of one sheet, or of its absence
///
/// # Errors
///
/// Returns `SheetXError::Serialization` if JSON serialization fails.
pub fn sheet_digest(sheet: Option<&Sheet>) -> Result<String> {
    let canonical = serde_json::to_string(&sheet)?;
    Ok(hash_string(&canonical))
}

/// Digest over every captured sheet plus the named-range table
///
/// # Errors
///
/// Returns `SheetXError::Serialization` if JSON serialization fails.
pub fn state_digest(sheets: &BTreeMap<String, Option<Sheet>>, named_ranges: &NamedRanges) -> Result<String> {
    let canonical = serde_json::to_string(&(sheets, named_ranges))?;
    Ok(hash_string(&canonical))
}

/// Digest of the named-range table alone
///
/// # Errors
///
/// Returns `SheetXError::Serialization` if JSON serialization fails.
pub fn named_ranges_digest(named_ranges: &NamedRanges) -> Result<String> {
    let canonical = serde_json::to_string(named_ranges)?;
    Ok(hash_string(&canonical))
}

pub(crate) fn hash_string(s: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    hex::encode(hasher.finalize())
}

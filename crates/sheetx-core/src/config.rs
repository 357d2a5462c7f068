//! Applier configuration
//!
//! Loaded from TOML; every field has a default so an empty document is a
//! valid configuration.
//!
//! ```toml
//! default_sheet = "Inputs"
//! io_timeout_ms = 2000
//!
//! [reference]
//! tolerance = 0.05
//!
//! [retry]
//! max_attempts = 5
//! ```

use crate::errors::{Result, SheetXError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Hard row limit of the grid
pub const GRID_MAX_ROWS: u32 = 1_048_576;

/// Hard column limit of the grid (column `XFD`)
pub const GRID_MAX_COLS: u32 = 16_384;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApplierConfig {
    /// Sheet that is valid even when missing; created on first write
    pub default_sheet: String,
    /// Rows past the current sheet height that writes may still target
    pub auto_extend_rows: u32,
    /// Columns past the current sheet width that writes may still target
    pub auto_extend_cols: u32,
    pub max_column_width: f64,
    pub max_row_height: f64,
    pub reference: ReferenceConfig,
    pub retry: RetryConfig,
    /// Bound on every session call made during capture, apply and restore
    pub io_timeout_ms: u64,
    /// How long a committed batch's snapshot stays available for rollback
    pub retention_secs: u64,
    /// Re-read restored sheets and compare digests
    pub verify_restore: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReferenceConfig {
    pub tolerance: f64,
    pub min_confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    /// Total attempts for an idempotent operation, first try included
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles after each failure
    pub backoff_ms: u64,
}

impl Default for ApplierConfig {
    fn default() -> Self {
        Self {
            default_sheet: "Sheet1".to_string(),
            auto_extend_rows: 1000,
            auto_extend_cols: 26,
            max_column_width: 255.0,
            max_row_height: 409.0,
            reference: ReferenceConfig::default(),
            retry: RetryConfig::default(),
            io_timeout_ms: 5000,
            retention_secs: 900,
            verify_restore: true,
        }
    }
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            tolerance: 0.02,
            min_confidence: 0.7,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_ms: 50,
        }
    }
}

impl RetryConfig {
    /// Delay before attempt `attempt` (1-based; attempt 1 has no delay)
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        let factor = 1u64 << (attempt - 2).min(16);
        Duration::from_millis(self.backoff_ms.saturating_mul(factor))
    }
}

impl ApplierConfig {
    /// Parse and validate a TOML document
    ///
    /// # Errors
    ///
    /// Returns `SheetXError::Config` on malformed TOML, unknown keys or
    /// out-of-range values.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: ApplierConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    ///
    /// # Errors
    ///
    /// Returns `SheetXError::Config` if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| SheetXError::Config {
            message: format!("cannot read {}: {}", path.display(), e),
        })?;
        Self::from_toml_str(&text)
    }

    /// # Errors
    ///
    /// Returns `SheetXError::Config` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let fail = |message: String| Err(SheetXError::Config { message });

        if self.default_sheet.trim().is_empty() {
            return fail("default_sheet must not be empty".to_string());
        }
        let tol = self.reference.tolerance;
        if !tol.is_finite() || tol <= 0.0 || tol >= 1.0 {
            return fail(format!("reference.tolerance must be in (0, 1), got {}", tol));
        }
        let conf = self.reference.min_confidence;
        if !(0.0..=1.0).contains(&conf) {
            return fail(format!(
                "reference.min_confidence must be in [0, 1], got {}",
                conf
            ));
        }
        if self.retry.max_attempts == 0 {
            return fail("retry.max_attempts must be at least 1".to_string());
        }
        if self.io_timeout_ms == 0 {
            return fail("io_timeout_ms must be positive".to_string());
        }
        for (name, value) in [
            ("max_column_width", self.max_column_width),
            ("max_row_height", self.max_row_height),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return fail(format!("{} must be a positive number", name));
            }
        }
        Ok(())
    }

    pub fn io_timeout(&self) -> Duration {
        Duration::from_millis(self.io_timeout_ms)
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_yields_defaults() {
        let config = ApplierConfig::from_toml_str("").unwrap();
        assert_eq!(config, ApplierConfig::default());
        assert_eq!(config.reference.tolerance, 0.02);
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn test_partial_override() {
        let config = ApplierConfig::from_toml_str(
            r#"
            default_sheet = "Inputs"
            [retry]
            max_attempts = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.default_sheet, "Inputs");
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.backoff_ms, 50);
    }

    #[test]
    fn test_rejects_unknown_key() {
        let result = ApplierConfig::from_toml_str("colour = \"red\"");
        assert!(matches!(result, Err(SheetXError::Config { .. })));
    }

    #[test]
    fn test_rejects_zero_attempts() {
        let result = ApplierConfig::from_toml_str("[retry]\nmax_attempts = 0");
        assert!(matches!(result, Err(SheetXError::Config { .. })));
    }

    #[test]
    fn test_rejects_tolerance_out_of_range() {
        let result = ApplierConfig::from_toml_str("[reference]\ntolerance = 1.5");
        assert!(matches!(result, Err(SheetXError::Config { .. })));
    }

    #[test]
    fn test_backoff_doubles() {
        let retry = RetryConfig {
            max_attempts: 4,
            backoff_ms: 10,
        };
        assert_eq!(retry.backoff_for(1), Duration::ZERO);
        assert_eq!(retry.backoff_for(2), Duration::from_millis(10));
        assert_eq!(retry.backoff_for(3), Duration::from_millis(20));
        assert_eq!(retry.backoff_for(4), Duration::from_millis(40));
    }
}

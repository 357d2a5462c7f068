//! Subcommand implementations
//!
//! Every subcommand that touches a workbook goes through
//! `apply_engine_command`; results are printed to stdout as JSON.

pub mod batch;
pub mod init;
pub mod rollback;
pub mod show;

use anyhow::Context;
use clap::Args;
use sheetx_core::{ApplierConfig, TransactionalApplier};
use sheetx_store::{FsSnapshotVault, FsWorkbookSession, WorkbookLock};
use std::path::{Path, PathBuf};

/// Workbook, vault and config locations shared by most subcommands
#[derive(Debug, Args)]
pub struct WorkbookArgs {
    /// Workbook JSON file
    #[arg(long, short = 'w')]
    pub workbook: PathBuf,

    /// Snapshot vault directory (default: <workbook>.vault next to the file)
    #[arg(long)]
    pub vault: Option<PathBuf>,

    /// Applier configuration (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl WorkbookArgs {
    /// Open the workbook under its lock file; keep the lock alive for the
    /// whole command
    pub fn open(&self) -> anyhow::Result<(FsWorkbookSession, FsSnapshotVault, TransactionalApplier, WorkbookLock)> {
        let session = FsWorkbookSession::open(&self.workbook)
            .with_context(|| format!("opening workbook {}", self.workbook.display()))?;
        let lock = session.lock()?;
        let vault = FsSnapshotVault::new(self.vault_dir());
        let applier = TransactionalApplier::new(load_config(self.config.as_deref())?)?;
        Ok((session, vault, applier, lock))
    }

    fn vault_dir(&self) -> PathBuf {
        self.vault
            .clone()
            .unwrap_or_else(|| self.workbook.with_extension("vault"))
    }
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<ApplierConfig> {
    match path {
        Some(path) => Ok(ApplierConfig::load(path)?),
        None => Ok(ApplierConfig::default()),
    }
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

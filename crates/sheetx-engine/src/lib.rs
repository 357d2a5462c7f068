//! SheetX Engine - Orchestration layer
//!
//! Dispatches engine commands (simulate, apply, rollback of a retained
//! batch, purge) against a workbook session and snapshot vault, and shapes
//! the results into review payloads for a presentation layer.

pub mod commands;

pub use commands::batch::ApplyOptions;
pub use commands::engine_command::{
    apply_engine_command, EngineCommand, EngineCommandResult, RollbackResult,
};
pub use commands::review::{ReviewMode, ReviewPayload};

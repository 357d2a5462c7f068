//! Batch lifecycle state machine

use crate::errors::{Result, SheetXError};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchState {
    Idle,
    Validating,
    /// Some operation failed validation; nothing was touched
    Rejected,
    Snapshotting,
    /// Pre-state could not be captured; nothing was touched
    FailedSnapshot,
    Applying,
    Committed,
    RollingBack,
    RolledBack,
    /// Restore failed; the workbook may be partially mutated
    RestoreFailed,
}

impl BatchState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            BatchState::Rejected
                | BatchState::FailedSnapshot
                | BatchState::Committed
                | BatchState::RolledBack
                | BatchState::RestoreFailed
        )
    }

    /// Whether `self -> to` is a defined edge
    pub fn can_transition_to(self, to: BatchState) -> bool {
        use BatchState::*;
        matches!(
            (self, to),
            (Idle, Validating)
                | (Validating, Rejected)
                | (Validating, Snapshotting)
                | (Snapshotting, FailedSnapshot)
                | (Snapshotting, Applying)
                | (Applying, Committed)
                | (Applying, RollingBack)
                | (RollingBack, RolledBack)
                | (RollingBack, RestoreFailed)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BatchState::Idle => "idle",
            BatchState::Validating => "validating",
            BatchState::Rejected => "rejected",
            BatchState::Snapshotting => "snapshotting",
            BatchState::FailedSnapshot => "failed_snapshot",
            BatchState::Applying => "applying",
            BatchState::Committed => "committed",
            BatchState::RollingBack => "rolling_back",
            BatchState::RolledBack => "rolled_back",
            BatchState::RestoreFailed => "restore_failed",
        }
    }
}

impl fmt::Display for BatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current state plus every state visited, in order
#[derive(Debug, Clone)]
pub struct BatchStateMachine {
    state: BatchState,
    trace: Vec<BatchState>,
}

impl Default for BatchStateMachine {
    fn default() -> Self {
        Self {
            state: BatchState::Idle,
            trace: vec![BatchState::Idle],
        }
    }
}

impl BatchStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> BatchState {
        self.state
    }

    pub fn trace(&self) -> &[BatchState] {
        &self.trace
    }

    /// # Errors
    ///
    /// Returns `SheetXError::IllegalTransition` for an undefined edge; the
    /// state is left unchanged.
    pub fn transition(&mut self, to: BatchState) -> Result<()> {
        if !self.state.can_transition_to(to) {
            return Err(SheetXError::IllegalTransition {
                from: self.state.to_string(),
                to: to.to_string(),
            });
        }
        tracing::debug!(
            event = sheetx_core_types::schema::EVENT_TRANSITION,
            from = self.state.as_str(),
            state = to.as_str(),
        );
        self.state = to;
        self.trace.push(to);
        Ok(())
    }
}

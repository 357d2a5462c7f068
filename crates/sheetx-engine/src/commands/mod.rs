//! Command orchestration layer.
//!
//! Provides high-level command functions that coordinate between the core
//! applier and the persistence layer.

pub mod batch;
pub mod engine_command;
pub mod review;

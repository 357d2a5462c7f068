//! Core types shared across SheetX facilities
//!
//! This crate provides foundational types used by the error, logging and
//! transaction layers:
//!
//! - **Correlation types**: RequestId, TraceId, BatchId, WorkbookId, RequestContext
//! - **Schema constants**: Canonical field keys and event names

pub mod correlation;
pub mod schema;

pub use correlation::{BatchId, RequestContext, RequestId, TraceId, WorkbookId};

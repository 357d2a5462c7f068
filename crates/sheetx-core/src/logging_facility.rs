//! Structured logging facility for SheetX
//!
//! One initialization point (`init(profile)`) plus the canonical
//! operation macros (`log_op_start!`, `log_op_end!`, `log_op_error!`).
//! Tests install an in-memory capture layer instead.
//!
//! # Usage
//!
//! ```rust
//! use sheetx_core::logging_facility::{init, Profile};
//!
//! init(Profile::Development);
//! ```

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, Profile};
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};

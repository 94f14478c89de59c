//! Structured logging facility
//!
//! - Single initialization point via `init(profile)`
//! - Op boundary macros (`log_op_start!`, `log_op_end!`, `log_op_error!`)
//! - Test capture layer for deterministic assertions
//!
//! ```rust
//! use libris_core::logging_facility::{init, Profile};
//!
//! init(Profile::Development);
//! ```

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, Profile};
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};

//! Core types shared across the libris crates
//!
//! - **Correlation**: `RequestId` attached to every HTTP request and error
//! - **Sensitive data**: `Sensitive<T>` wrapper that redacts itself
//! - **Schema constants**: canonical log field keys and event names

pub mod correlation;
pub mod schema;
pub mod sensitive;

pub use correlation::RequestId;
pub use sensitive::Sensitive;

//! Schema bootstrap
//!
//! Embedded per-dialect migrations, recorded with checksums in
//! `schema_version` and applied idempotently.

mod checksums;
mod embedded;
mod runner;

pub use runner::{applied_migrations, apply_migrations};

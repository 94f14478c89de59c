//! Synthetic seed data
//!
//! Provides:
//! - Deterministic catalog generation from a fixed RNG seed
//! - Insertion through the catalog statements in one transaction

pub mod filler;
pub mod words;

pub use filler::{fill, SeedPlan, SeedReport};

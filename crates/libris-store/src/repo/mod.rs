//! Repository layer
//!
//! One function per catalog statement: compile for the executor's dialect,
//! bind, execute, scan.

pub mod catalog_repo;

pub use catalog_repo::CatalogRepo;

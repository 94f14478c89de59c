//! libris store: SQL generation and persistence for the catalog
//!
//! Provides:
//! - Dialect abstraction (PostgreSQL, SQLite) and capability flags
//! - Query template compiler, parameter binder and result scanner
//! - Backend executors with statement logging and transactions
//! - Connection pool and database settings
//! - Embedded schema migrations
//! - Synthetic seed data

pub mod binder;
pub mod compiler;
pub mod db;
pub mod dialect;
pub mod errors;
pub mod exec;
pub mod migrations;
pub mod pool;
pub mod repo;
pub mod scanner;
pub mod seed;

// Re-export key types
pub use db::{connect, open_executor, DatabaseSettings};
pub use dialect::{Capabilities, Dialect, TxMode};
pub use errors::Result;
pub use exec::{in_transaction, Cancellation, Executor, SqliteExecutor};
pub use pool::{CatalogPool, Pool};
pub use repo::CatalogRepo;

//! Command orchestration layer.
//!
//! Read orchestration, the transactional write orchestrator, and the
//! `EngineQuery` / `EngineCommand` entry points that wrap them.

pub mod book_query;
pub mod create_book;
pub mod engine_command;
pub mod engine_query;

use book_query::ReadStrategy;
use create_book::AuthorResolution;

/// Strategy choices fixed at startup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineOptions {
    pub read_strategy: ReadStrategy,
    pub author_resolution: AuthorResolution,
}

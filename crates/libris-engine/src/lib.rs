//! libris engine: read and write orchestration
//!
//! Coordinates input validation from `libris-core` with the statements,
//! executors and transactions of `libris-store`.

pub mod commands;

pub use commands::book_query::{query_books, ReadStrategy};
pub use commands::create_book::{create_book, AuthorResolution};
pub use commands::engine_command::{apply_engine_command, EngineCommand, EngineCommandResult};
pub use commands::engine_query::{apply_engine_query, EngineQuery, EngineQueryResult};
pub use commands::EngineOptions;

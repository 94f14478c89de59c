//! Engine-level read-only query surface.
//!
//! `apply_engine_query` is the single entry point for catalog reads. Raw
//! listing parameters are validated here, so a rejected request never
//! reaches the database.

#![allow(clippy::result_large_err)]

use libris_core::errors::LbError;
use libris_core::model::{BookPage, BookQueryParams};
use libris_core::rules::validate_query;
use libris_core::{log_op_end, log_op_error, log_op_start};
use libris_store::errors::Result;
use libris_store::migrations::applied_migrations;
use libris_store::Executor;

use crate::commands::book_query::query_books;
use crate::commands::EngineOptions;

/// Read-only queries supported by the engine.
#[derive(Debug, Clone)]
pub enum EngineQuery {
    /// Filtered, sorted, paginated listing of books with their authors.
    ListBooks(BookQueryParams),
    /// Schema state, for health checks.
    SchemaStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineQueryResult {
    Books(BookPage),
    SchemaStatus { applied_migrations: Vec<String> },
}

/// Apply a read-only engine query.
pub fn apply_engine_query(
    query: EngineQuery,
    exec: &mut dyn Executor,
    options: &EngineOptions,
) -> Result<EngineQueryResult> {
    match query {
        EngineQuery::ListBooks(params) => {
            log_op_start!("list_books");
            let start = std::time::Instant::now();

            let result = (|| -> Result<EngineQueryResult> {
                let query = validate_query(params).map_err(LbError::from)?;
                let page = query_books(exec, &query, options.read_strategy)?;
                Ok(EngineQueryResult::Books(page))
            })();

            let elapsed = start.elapsed().as_millis() as u64;
            match &result {
                Ok(EngineQueryResult::Books(page)) => {
                    log_op_end!("list_books", duration_ms = elapsed, total = page.total)
                }
                Ok(_) => log_op_end!("list_books", duration_ms = elapsed),
                Err(e) => {
                    let e_clone = e.clone();
                    log_op_error!("list_books", e_clone, duration_ms = elapsed);
                }
            }
            result
        }

        EngineQuery::SchemaStatus => {
            log_op_start!("schema_status");
            let start = std::time::Instant::now();

            let result = applied_migrations(exec)
                .map(|applied_migrations| EngineQueryResult::SchemaStatus { applied_migrations });

            let elapsed = start.elapsed().as_millis() as u64;
            match &result {
                Ok(_) => log_op_end!("schema_status", duration_ms = elapsed),
                Err(e) => {
                    let e_clone = e.clone();
                    log_op_error!("schema_status", e_clone, duration_ms = elapsed);
                }
            }
            result
        }
    }
}

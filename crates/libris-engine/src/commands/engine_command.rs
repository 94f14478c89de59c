//! Engine-level write commands.

#![allow(clippy::result_large_err)]

use libris_core::errors::LbError;
use libris_core::ids::IdGenerator;
use libris_core::model::{CreatedBook, NewBookRequest};
use libris_core::rules::validate_new_book;
use libris_core::{log_op_end, log_op_error, log_op_start};
use libris_store::errors::Result;
use libris_store::seed::{fill, SeedPlan, SeedReport};
use libris_store::Executor;

use crate::commands::create_book::create_book;
use crate::commands::EngineOptions;

/// Engine-level commands that write to the catalog.
#[derive(Debug, Clone)]
pub enum EngineCommand {
    /// Create a book, creating or reusing its authors by name.
    CreateBook(NewBookRequest),
    /// Insert generated sample data.
    FillCatalog(SeedPlan),
}

/// Result of applying an engine command.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommandResult {
    BookCreated(CreatedBook),
    CatalogFilled(SeedReport),
}

/// Apply an engine command.
pub fn apply_engine_command(
    cmd: EngineCommand,
    exec: &mut dyn Executor,
    ids: &dyn IdGenerator,
    options: &EngineOptions,
) -> Result<EngineCommandResult> {
    match cmd {
        EngineCommand::CreateBook(request) => {
            log_op_start!("create_book");
            let start = std::time::Instant::now();

            let result = (|| -> Result<EngineCommandResult> {
                let book = validate_new_book(request).map_err(LbError::from)?;
                let created = create_book(exec, ids, &book, options.author_resolution)?;
                Ok(EngineCommandResult::BookCreated(created))
            })();

            let elapsed = start.elapsed().as_millis() as u64;
            match &result {
                Ok(EngineCommandResult::BookCreated(created)) => {
                    log_op_end!("create_book", duration_ms = elapsed, book_id = %created.id)
                }
                Ok(_) => log_op_end!("create_book", duration_ms = elapsed),
                Err(e) => {
                    let e_clone = e.clone();
                    log_op_error!("create_book", e_clone, duration_ms = elapsed);
                }
            }
            result
        }

        EngineCommand::FillCatalog(plan) => {
            log_op_start!("fill_catalog", books = plan.books, authors = plan.authors);
            let start = std::time::Instant::now();

            let result = fill(exec, ids, &plan).map(EngineCommandResult::CatalogFilled);

            let elapsed = start.elapsed().as_millis() as u64;
            match &result {
                Ok(_) => log_op_end!("fill_catalog", duration_ms = elapsed),
                Err(e) => {
                    let e_clone = e.clone();
                    log_op_error!("fill_catalog", e_clone, duration_ms = elapsed);
                }
            }
            result
        }
    }
}

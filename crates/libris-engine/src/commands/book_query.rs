//! Book listing

#![allow(clippy::result_large_err)]

use libris_core::model::{BookPage, BookQuery};
use libris_store::errors::Result;
use libris_store::exec::in_transaction;
use libris_store::{CatalogRepo, Executor, TxMode};
use serde::Deserialize;

/// How a listing is read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadStrategy {
    /// One statement returning `(total, books_json)`
    #[default]
    Aggregate,
    /// `COUNT` then the page, inside one read-only transaction
    TwoStatement,
}

/// Total and one page of books matching `query`
///
/// Both strategies return the same result for the same data.
pub fn query_books(
    exec: &mut dyn Executor,
    query: &BookQuery,
    strategy: ReadStrategy,
) -> Result<BookPage> {
    match strategy {
        ReadStrategy::Aggregate => CatalogRepo::aggregate_books(exec, query),
        ReadStrategy::TwoStatement => in_transaction(exec, TxMode::Read, "query_books", |exec| {
            let total = CatalogRepo::count_books(exec, query)?;
            let books = CatalogRepo::page_books(exec, query)?;
            Ok(BookPage { total, books })
        }),
    }
}

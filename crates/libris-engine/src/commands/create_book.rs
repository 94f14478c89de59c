//! Transactional book creation
//!
//! Begin → InsertBook → ResolveAuthors → LinkAuthors → Commit. Each step
//! takes the previous step's result; any failure rolls the whole write back.

#![allow(clippy::result_large_err)]

use libris_core::errors::{LbError, LbErrorKind};
use libris_core::ids::IdGenerator;
use libris_core::model::{Author, CreatedBook, NewBook};
use libris_store::errors::{write_rolled_back, Result};
use libris_store::exec::in_transaction;
use libris_store::{CatalogRepo, Executor, TxMode};
use std::collections::HashMap;
use uuid::Uuid;

const OP: &str = "create_book";

/// How submitted author names become author ids
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthorResolution {
    /// One `INSERT ... ON CONFLICT DO UPDATE ... RETURNING` statement
    #[default]
    UpsertReturning,
    /// Conflict-skipping insert, then a lookup by name
    InsertThenSelect,
}

impl AuthorResolution {
    /// Pick the strategy a backend supports
    pub fn from_capability(upsert_returning: bool) -> Self {
        if upsert_returning {
            AuthorResolution::UpsertReturning
        } else {
            AuthorResolution::InsertThenSelect
        }
    }
}

#[derive(Debug)]
struct InsertedBook {
    id: Uuid,
}

#[derive(Debug)]
struct ResolvedAuthors {
    book: InsertedBook,
    /// In submitted-name order
    author_ids: Vec<Uuid>,
}

#[derive(Debug)]
struct LinkedAuthors {
    book: InsertedBook,
    links: u64,
}

fn trace_step(step: &'static str, book_id: Uuid, count: usize) {
    tracing::debug!(
        component = module_path!(),
        op = OP,
        step,
        book_id = %book_id,
        author_count = count,
    );
}

fn insert_book(
    exec: &mut dyn Executor,
    ids: &dyn IdGenerator,
    book: &NewBook,
) -> Result<InsertedBook> {
    let id = CatalogRepo::insert_book(exec, ids.next_id(), book)?;
    trace_step("insert_book", id, 0);
    Ok(InsertedBook { id })
}

fn resolve_authors(
    exec: &mut dyn Executor,
    ids: &dyn IdGenerator,
    names: &[String],
    resolution: AuthorResolution,
    book: InsertedBook,
) -> Result<ResolvedAuthors> {
    let fresh: Vec<Uuid> = names.iter().map(|_| ids.next_id()).collect();
    let stored: Vec<Author> = match resolution {
        AuthorResolution::UpsertReturning => CatalogRepo::upsert_authors(exec, &fresh, names)?,
        AuthorResolution::InsertThenSelect => {
            CatalogRepo::insert_authors_skip_conflicts(exec, &fresh, names)?;
            CatalogRepo::select_authors_by_name(exec, names)?
        }
    };

    let by_name: HashMap<&str, Uuid> = stored.iter().map(|a| (a.name.as_str(), a.id)).collect();
    let author_ids = names
        .iter()
        .map(|name| {
            by_name.get(name.as_str()).copied().ok_or_else(|| {
                LbError::new(LbErrorKind::Persistence)
                    .with_op(OP)
                    .with_message(format!("author '{}' was not resolved to an id", name))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    trace_step("resolve_authors", book.id, author_ids.len());
    Ok(ResolvedAuthors { book, author_ids })
}

fn link_authors(exec: &mut dyn Executor, resolved: ResolvedAuthors) -> Result<LinkedAuthors> {
    let links = CatalogRepo::link_authors(exec, resolved.book.id, &resolved.author_ids)?;
    trace_step("link_authors", resolved.book.id, resolved.author_ids.len());
    Ok(LinkedAuthors {
        book: resolved.book,
        links,
    })
}

/// Create a book and its authors as one unit
///
/// Authors are matched by exact name: existing names are reused, new ones
/// created. Concurrent writers introducing the same name converge on one
/// author row.
///
/// # Errors
/// `Transaction` whenever the write does not commit. Every earlier step is
/// rolled back and the failing step's error is the source; a failed
/// rollback is reported together with it.
pub fn create_book(
    exec: &mut dyn Executor,
    ids: &dyn IdGenerator,
    book: &NewBook,
    resolution: AuthorResolution,
) -> Result<CreatedBook> {
    let linked = in_transaction(exec, TxMode::Write, OP, |exec| {
        let inserted = insert_book(exec, ids, book)?;
        let resolved = resolve_authors(exec, ids, &book.authors, resolution, inserted)?;
        link_authors(exec, resolved)
    })
    .map_err(|err| match err.kind() {
        LbErrorKind::Transaction => err,
        _ => write_rolled_back(OP, err),
    })?;

    tracing::debug!(
        component = module_path!(),
        op = OP,
        book_id = %linked.book.id,
        links = linked.links,
        "book committed"
    );
    Ok(CreatedBook {
        id: linked.book.id,
    })
}

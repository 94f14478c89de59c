//! Catalog repository
//!
//! Reads and writes books and authors through any `Executor`

#![allow(clippy::result_large_err)]

use crate::binder::{bind, AuthorRows, BookRow, LinkRows};
use crate::compiler::{
    compile_insert_authors, compile_insert_book, compile_link_authors, compile_read,
    compile_select_authors, compile_upsert_authors, ReadShape,
};
use crate::errors::Result;
use crate::exec::Executor;
use crate::scanner::{scan_aggregate, scan_authors, scan_books, scan_count, scan_returned_id};
use libris_core::model::{Author, Book, BookPage, BookQuery, NewBook};
use uuid::Uuid;

/// Catalog persistence operations
pub struct CatalogRepo;

impl CatalogRepo {
    /// Number of books matching the query's filter, ignoring pagination
    pub fn count_books(exec: &mut dyn Executor, query: &BookQuery) -> Result<u64> {
        let stmt = compile_read(exec.dialect(), ReadShape::Count, query);
        let args = bind(&stmt, query)?;
        scan_count(&exec.query(&stmt, &args)?)
    }

    /// One page of matching books with their authors
    pub fn page_books(exec: &mut dyn Executor, query: &BookQuery) -> Result<Vec<Book>> {
        let stmt = compile_read(exec.dialect(), ReadShape::Page, query);
        let args = bind(&stmt, query)?;
        scan_books(&exec.query(&stmt, &args)?)
    }

    /// Total and page in a single statement
    pub fn aggregate_books(exec: &mut dyn Executor, query: &BookQuery) -> Result<BookPage> {
        let stmt = compile_read(exec.dialect(), ReadShape::Aggregate, query);
        let args = bind(&stmt, query)?;
        scan_aggregate(&exec.query(&stmt, &args)?)
    }

    /// Insert a book row; returns the id the database reports back
    pub fn insert_book(exec: &mut dyn Executor, id: Uuid, book: &NewBook) -> Result<Uuid> {
        let stmt = compile_insert_book(exec.dialect());
        let args = bind(&stmt, &BookRow { id, book })?;
        scan_returned_id(&exec.query(&stmt, &args)?)
    }

    /// Insert authors, skipping names that already exist; returns rows inserted
    pub fn insert_authors_skip_conflicts(
        exec: &mut dyn Executor,
        ids: &[Uuid],
        names: &[String],
    ) -> Result<u64> {
        let stmt = compile_insert_authors(exec.dialect(), names.len())?;
        let args = bind(&stmt, &AuthorRows { ids, names })?;
        exec.execute(&stmt, &args)
    }

    /// Stored authors whose names are in `names`
    pub fn select_authors_by_name(
        exec: &mut dyn Executor,
        names: &[String],
    ) -> Result<Vec<Author>> {
        let stmt = compile_select_authors(exec.dialect(), names.len())?;
        let args = bind(&stmt, &AuthorRows { ids: &[], names })?;
        scan_authors(&exec.query(&stmt, &args)?)
    }

    /// Insert-or-fetch every name in one statement
    pub fn upsert_authors(
        exec: &mut dyn Executor,
        ids: &[Uuid],
        names: &[String],
    ) -> Result<Vec<Author>> {
        let stmt = compile_upsert_authors(exec.dialect(), names.len())?;
        let args = bind(&stmt, &AuthorRows { ids, names })?;
        scan_authors(&exec.query(&stmt, &args)?)
    }

    /// Link a book to authors; existing pairs are left alone
    pub fn link_authors(
        exec: &mut dyn Executor,
        book_id: Uuid,
        author_ids: &[Uuid],
    ) -> Result<u64> {
        let stmt = compile_link_authors(exec.dialect(), author_ids.len())?;
        let args = bind(&stmt, &LinkRows {
            book_id,
            author_ids,
        })?;
        exec.execute(&stmt, &args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::SqliteExecutor;
    use crate::migrations::apply_migrations;
    use chrono::NaiveDate;
    use libris_core::errors::LbErrorKind;

    fn setup() -> SqliteExecutor {
        let mut exec = SqliteExecutor::open_in_memory().unwrap();
        apply_migrations(&mut exec).unwrap();
        exec
    }

    fn id(n: u64) -> Uuid {
        Uuid::from_u64_pair(0, n)
    }

    fn book(title: &str) -> NewBook {
        NewBook {
            title: title.to_string(),
            number_of_pages: 100,
            published_at: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
            authors: vec!["Ada".to_string()],
        }
    }

    #[test]
    fn test_insert_book_returns_id() {
        let mut exec = setup();
        let returned = CatalogRepo::insert_book(&mut exec, id(1), &book("Dune")).unwrap();
        assert_eq!(returned, id(1));
        assert_eq!(
            CatalogRepo::count_books(&mut exec, &BookQuery::default()).unwrap(),
            1
        );
    }

    #[test]
    fn test_insert_authors_skips_existing_names() {
        let mut exec = setup();
        let names = vec!["Ada".to_string()];
        assert_eq!(
            CatalogRepo::insert_authors_skip_conflicts(&mut exec, &[id(1)], &names).unwrap(),
            1
        );
        assert_eq!(
            CatalogRepo::insert_authors_skip_conflicts(&mut exec, &[id(2)], &names).unwrap(),
            0
        );

        let stored = CatalogRepo::select_authors_by_name(&mut exec, &names).unwrap();
        assert_eq!(stored, vec![Author { id: id(1), name: "Ada".to_string() }]);
    }

    #[test]
    fn test_upsert_returns_existing_id() {
        let mut exec = setup();
        CatalogRepo::insert_authors_skip_conflicts(&mut exec, &[id(1)], &["Ada".to_string()])
            .unwrap();

        let mut resolved = CatalogRepo::upsert_authors(
            &mut exec,
            &[id(2), id(3)],
            &["Ada".to_string(), "Bob".to_string()],
        )
        .unwrap();
        resolved.sort_by(|a, b| a.name.cmp(&b.name));

        assert_eq!(resolved[0].id, id(1));
        assert_eq!(resolved[1].id, id(3));
    }

    #[test]
    fn test_link_is_conflict_safe() {
        let mut exec = setup();
        CatalogRepo::insert_book(&mut exec, id(10), &book("Dune")).unwrap();
        CatalogRepo::insert_authors_skip_conflicts(&mut exec, &[id(1)], &["Ada".to_string()])
            .unwrap();

        assert_eq!(CatalogRepo::link_authors(&mut exec, id(10), &[id(1)]).unwrap(), 1);
        assert_eq!(CatalogRepo::link_authors(&mut exec, id(10), &[id(1)]).unwrap(), 0);
    }

    #[test]
    fn test_link_to_unknown_author_fails() {
        let mut exec = setup();
        CatalogRepo::insert_book(&mut exec, id(10), &book("Dune")).unwrap();
        let err = CatalogRepo::link_authors(&mut exec, id(10), &[id(99)]).unwrap_err();
        assert_eq!(err.kind(), LbErrorKind::Persistence);
    }

    #[test]
    fn test_empty_name_list_is_binding_error() {
        let mut exec = setup();
        let err = CatalogRepo::select_authors_by_name(&mut exec, &[]).unwrap_err();
        assert_eq!(err.kind(), LbErrorKind::Binding);
    }
}

// Engine entry points: op-boundary logging and result shapes

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{count, empty_catalog};
use libris_core::ids::SequentialIds;
use libris_core::logging_facility::test_capture::init_test_capture;
use libris_core::model::{BookQueryParams, NewBookRequest};
use libris_engine::{
    apply_engine_command, apply_engine_query, AuthorResolution, EngineCommand,
    EngineCommandResult, EngineOptions, EngineQuery, EngineQueryResult, ReadStrategy,
};
use libris_store::seed::SeedPlan;

fn request(title: &str, authors: &[&str]) -> NewBookRequest {
    NewBookRequest {
        title: Some(title.to_string()),
        number_of_pages: Some(128),
        published_at: Some("2004-02-29".to_string()),
        authors: Some(authors.iter().map(|a| a.to_string()).collect()),
    }
}

#[test]
fn test_create_then_list_logs_op_boundaries() {
    // Given: An empty catalog and event capture
    let capture = init_test_capture();
    let mut exec = empty_catalog();
    let options = EngineOptions::default();

    // When: A book is created through the engine
    let result = apply_engine_command(
        EngineCommand::CreateBook(request("Surface Tension", &["Quill Marsh"])),
        &mut exec,
        &SequentialIds::starting_at(500),
        &options,
    )
    .unwrap();
    let EngineCommandResult::BookCreated(created) = result else {
        panic!("expected BookCreated, got {:?}", result);
    };

    // Then: start and end were logged, the end carrying the new id
    capture.assert_event_exists("create_book", "start");
    let ends = capture.count_events(|e| {
        e.op.as_deref() == Some("create_book")
            && e.event.as_deref() == Some("end")
            && e.field("book_id") == Some(created.id.to_string().as_str())
    });
    assert_eq!(ends, 1);

    // When: Listing with a search for the title
    let params = BookQueryParams {
        search: Some("surface tension".to_string()),
        ..Default::default()
    };
    let result =
        apply_engine_query(EngineQuery::ListBooks(params), &mut exec, &options).unwrap();

    // Then: The book comes back and the op was logged
    let EngineQueryResult::Books(page) = result else {
        panic!("expected Books, got {:?}", result);
    };
    assert_eq!(page.total, 1);
    assert_eq!(page.books[0].id, created.id);
    assert_eq!(page.books[0].authors[0].name, "Quill Marsh");
    capture.assert_event_exists("list_books", "end");
}

#[test]
fn test_statements_are_logged_with_arguments() {
    // Given: Event capture and a catalog
    let capture = init_test_capture();
    let mut exec = empty_catalog();

    // When: A book with a distinctive author is created
    apply_engine_command(
        EngineCommand::CreateBook(request("Logged", &["Ysolde Varga"])),
        &mut exec,
        &SequentialIds::starting_at(900),
        &EngineOptions::default(),
    )
    .unwrap();

    // Then: Some statement event shows the author name among its arguments
    let statements = capture.count_events(|e| {
        e.event.as_deref() == Some("statement")
            && e.field("args").is_some_and(|a| a.contains("Ysolde Varga"))
            && e.field("sql").is_some_and(|s| s.contains("authors"))
    });
    assert!(statements >= 1);
}

#[test]
fn test_options_select_strategies() {
    // Given: Options that use the fallback write path and two-statement reads
    let mut exec = empty_catalog();
    let options = EngineOptions {
        read_strategy: ReadStrategy::TwoStatement,
        author_resolution: AuthorResolution::InsertThenSelect,
    };

    // When: Two books share an author
    for title in ["First", "Second"] {
        apply_engine_command(
            EngineCommand::CreateBook(request(title, &["Shared", "Other"])),
            &mut exec,
            &SequentialIds::starting_at(if title == "First" { 1 } else { 100 }),
            &options,
        )
        .unwrap();
    }

    // Then: The author exists once and both books list it
    assert_eq!(count(&exec, "SELECT COUNT(*) FROM authors"), 2);
    let result = apply_engine_query(
        EngineQuery::ListBooks(BookQueryParams::default()),
        &mut exec,
        &options,
    )
    .unwrap();
    let EngineQueryResult::Books(page) = result else {
        panic!("expected Books");
    };
    assert_eq!(page.total, 2);
    assert!(page.books.iter().all(|b| b.authors.len() == 2));
}

#[test]
fn test_fill_catalog_reports_counts() {
    // Given: An empty catalog
    let capture = init_test_capture();
    let mut exec = empty_catalog();

    // When: The catalog is filled through the engine
    let result = apply_engine_command(
        EngineCommand::FillCatalog(SeedPlan {
            books: 25,
            authors: 5,
            seed: 42,
        }),
        &mut exec,
        &SequentialIds::starting_at(10_000),
        &EngineOptions::default(),
    )
    .unwrap();

    // Then: The report matches the rows written
    let EngineCommandResult::CatalogFilled(report) = result else {
        panic!("expected CatalogFilled");
    };
    assert_eq!(report.books, 25);
    assert_eq!(report.authors, 5);
    assert_eq!(count(&exec, "SELECT COUNT(*) FROM books"), 25);
    assert_eq!(
        count(&exec, "SELECT COUNT(*) FROM book_authors"),
        report.links as i64
    );
    capture.assert_event_exists("fill_catalog", "end");
}

#[test]
fn test_schema_status_lists_migrations() {
    let mut exec = empty_catalog();

    let result = apply_engine_query(
        EngineQuery::SchemaStatus,
        &mut exec,
        &EngineOptions::default(),
    )
    .unwrap();

    assert_eq!(
        result,
        EngineQueryResult::SchemaStatus {
            applied_migrations: vec!["001_catalog_schema".to_string()],
        }
    );
}

#[test]
fn test_failed_write_logs_end_error() {
    // Given: A catalog missing its books table
    let capture = init_test_capture();
    let mut exec = empty_catalog();
    libris_store::Executor::batch(&mut exec, "DROP TABLE book_authors; DROP TABLE books")
        .unwrap();

    // When: A valid book is submitted
    let err = apply_engine_command(
        EngineCommand::CreateBook(request("Nowhere To Go", &["Pell Orrin"])),
        &mut exec,
        &SequentialIds::starting_at(7_000),
        &EngineOptions::default(),
    )
    .unwrap_err();

    // Then: The op ends in error with the transaction code
    assert_eq!(err.code(), "ERR_TRANSACTION");
    let failed = capture.count_events(|e| {
        e.op.as_deref() == Some("create_book")
            && e.event.as_deref() == Some("end_error")
            && e.field("err.code") == Some("ERR_TRANSACTION")
    });
    assert!(failed >= 1);
}

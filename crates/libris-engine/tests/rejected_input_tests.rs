// Rejected input never reaches the database
// Nothing in this binary may issue a statement: the assertions count
// statement events across the whole process.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use libris_core::errors::LbErrorKind;
use libris_core::ids::RandomIds;
use libris_core::logging_facility::test_capture::init_test_capture;
use libris_core::model::{BookQueryParams, NewBookRequest};
use libris_core_types::schema::{EVENT_STATEMENT, EVENT_STATEMENT_ERROR};
use libris_engine::{
    apply_engine_command, apply_engine_query, EngineCommand, EngineOptions, EngineQuery,
};
use libris_store::exec::SqliteExecutor;

fn assert_no_statements() {
    let capture = init_test_capture();
    assert_eq!(
        capture.count_events(|e| {
            matches!(
                e.event.as_deref(),
                Some(EVENT_STATEMENT) | Some(EVENT_STATEMENT_ERROR)
            )
        }),
        0
    );
}

fn valid_request() -> NewBookRequest {
    NewBookRequest {
        title: Some("Dune".to_string()),
        number_of_pages: Some(412),
        published_at: Some("1965-08-01".to_string()),
        authors: Some(vec!["Frank Herbert".to_string()]),
    }
}

#[test]
fn test_unknown_sort_column_is_rejected() {
    // Given: A connection to a database with no tables at all
    let capture = init_test_capture();
    let mut exec = SqliteExecutor::open_in_memory().unwrap();

    // When: A listing asks to sort on a column outside the allow-list
    let params = BookQueryParams {
        sort: Some("title; DROP TABLE books".to_string()),
        ..Default::default()
    };
    let err = apply_engine_query(
        EngineQuery::ListBooks(params),
        &mut exec,
        &EngineOptions::default(),
    )
    .unwrap_err();

    // Then: A validation error naming the field, and no statement ran
    assert_eq!(err.kind(), LbErrorKind::Validation);
    assert_eq!(err.field(), Some("sort"));
    assert_no_statements();

    // And: The failure was logged at the op boundary
    let failed = capture.count_events(|e| {
        e.op.as_deref() == Some("list_books")
            && e.field("err.code") == Some("ERR_VALIDATION")
            && e.field("error").is_some_and(|m| m.contains("DROP TABLE"))
    });
    assert_eq!(failed, 1);
}

#[test]
fn test_out_of_range_paging_is_rejected() {
    let mut exec = SqliteExecutor::open_in_memory().unwrap();
    let cases = [
        (
            BookQueryParams {
                limit: Some(0),
                ..Default::default()
            },
            "limit",
        ),
        (
            BookQueryParams {
                limit: Some(101),
                ..Default::default()
            },
            "limit",
        ),
        (
            BookQueryParams {
                offset: Some(-1),
                ..Default::default()
            },
            "offset",
        ),
        (
            BookQueryParams {
                direction: Some("sideways".to_string()),
                ..Default::default()
            },
            "direction",
        ),
    ];

    for (params, field) in cases {
        let err = apply_engine_query(
            EngineQuery::ListBooks(params),
            &mut exec,
            &EngineOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), LbErrorKind::Validation);
        assert_eq!(err.field(), Some(field));
    }
    assert_no_statements();
}

#[test]
fn test_invalid_book_is_rejected() {
    let mut exec = SqliteExecutor::open_in_memory().unwrap();
    let cases = [
        (
            NewBookRequest {
                authors: Some(vec![]),
                ..valid_request()
            },
            "authors",
        ),
        (
            NewBookRequest {
                authors: Some(vec!["Ada".to_string(), "  ".to_string()]),
                ..valid_request()
            },
            "authors",
        ),
        (
            NewBookRequest {
                title: Some("   ".to_string()),
                ..valid_request()
            },
            "title",
        ),
        (
            NewBookRequest {
                published_at: Some("1 Aug 1965".to_string()),
                ..valid_request()
            },
            "published_at",
        ),
        (
            NewBookRequest {
                number_of_pages: Some(-3),
                ..valid_request()
            },
            "number_of_pages",
        ),
    ];

    for (request, field) in cases {
        let err = apply_engine_command(
            EngineCommand::CreateBook(request),
            &mut exec,
            &RandomIds,
            &EngineOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err.code(), "ERR_VALIDATION");
        assert_eq!(err.field(), Some(field));
    }
    assert_no_statements();
}

// Integration tests for catalog listing
// Covers: pagination bounds, determinism, read-strategy agreement,
// search semantics, sort order

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::seeded_catalog;
use libris_core::model::{Book, BookQuery, Direction, SortColumn};
use libris_engine::{query_books, ReadStrategy};
use libris_store::exec::SqliteExecutor;
use proptest::prelude::*;
use std::sync::{Mutex, OnceLock};

const BOOKS: u64 = 50;

fn catalog() -> &'static Mutex<SqliteExecutor> {
    static CATALOG: OnceLock<Mutex<SqliteExecutor>> = OnceLock::new();
    CATALOG.get_or_init(|| Mutex::new(seeded_catalog(BOOKS as usize, 10)))
}

fn list(query: &BookQuery, strategy: ReadStrategy) -> Vec<Book> {
    let mut exec = catalog().lock().unwrap();
    let page = query_books(&mut *exec, query, strategy).unwrap();
    page.books
}

fn matches_search(book: &Book, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    book.title.to_lowercase().contains(&needle)
        || book
            .authors
            .iter()
            .any(|a| a.name.to_lowercase().contains(&needle))
}

fn sort_strategy() -> impl Strategy<Value = SortColumn> {
    prop::sample::select(SortColumn::ALL.to_vec())
}

fn direction_strategy() -> impl Strategy<Value = Direction> {
    prop::sample::select(vec![Direction::Asc, Direction::Desc])
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn page_never_exceeds_limit(
        limit in 1u32..=100,
        offset in 0u64..80,
        sort in sort_strategy(),
        direction in direction_strategy(),
    ) {
        let query = BookQuery::default().sorted_by(sort, direction).paged(limit, offset);
        let mut exec = catalog().lock().unwrap();
        let page = query_books(&mut *exec, &query, ReadStrategy::Aggregate).unwrap();

        prop_assert_eq!(page.total, BOOKS);
        prop_assert!(page.books.len() <= limit as usize);
        let expected = u64::from(limit).min(BOOKS.saturating_sub(offset));
        prop_assert_eq!(page.books.len() as u64, expected);
    }

    #[test]
    fn strategies_return_identical_pages(
        limit in 1u32..=100,
        offset in 0u64..60,
        sort in sort_strategy(),
        direction in direction_strategy(),
    ) {
        let query = BookQuery::default().sorted_by(sort, direction).paged(limit, offset);
        let mut exec = catalog().lock().unwrap();
        let aggregate = query_books(&mut *exec, &query, ReadStrategy::Aggregate).unwrap();
        let two_statement = query_books(&mut *exec, &query, ReadStrategy::TwoStatement).unwrap();

        prop_assert_eq!(aggregate, two_statement);
    }
}

#[test]
fn test_repeated_listing_is_identical() {
    // Given: A listing sorted on a column with repeated values
    let query = BookQuery::default()
        .sorted_by(SortColumn::NumberOfPages, Direction::Asc)
        .paged(20, 5);

    // When: It is read twice
    let first = list(&query, ReadStrategy::Aggregate);
    let second = list(&query, ReadStrategy::Aggregate);

    // Then: Same books in the same order
    assert_eq!(first, second);
}

#[test]
fn test_consecutive_pages_cover_catalog_once() {
    // Given: Pages of 7 over the whole catalog
    let mut seen = Vec::new();
    for offset in (0..BOOKS).step_by(7) {
        let query = BookQuery::default()
            .sorted_by(SortColumn::Title, Direction::Desc)
            .paged(7, offset);
        seen.extend(list(&query, ReadStrategy::TwoStatement));
    }

    // Then: Every book appears exactly once
    let mut ids: Vec<_> = seen.iter().map(|b| b.id).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), BOOKS as usize);
    assert_eq!(seen.len(), BOOKS as usize);
}

#[test]
fn test_pages_descending_are_non_increasing() {
    // When: Listing by page count, descending
    let query = BookQuery::default()
        .sorted_by(SortColumn::NumberOfPages, Direction::Desc)
        .paged(100, 0);
    let books = list(&query, ReadStrategy::Aggregate);

    // Then: Page counts never increase
    assert_eq!(books.len(), BOOKS as usize);
    assert!(books
        .windows(2)
        .all(|w| w[0].number_of_pages >= w[1].number_of_pages));
}

#[test]
fn test_published_at_ascending_is_non_decreasing() {
    let query = BookQuery::default()
        .sorted_by(SortColumn::PublishedAt, Direction::Asc)
        .paged(100, 0);
    let books = list(&query, ReadStrategy::TwoStatement);

    assert!(books
        .windows(2)
        .all(|w| w[0].published_at <= w[1].published_at));
}

#[test]
fn test_empty_search_equals_no_search() {
    // Given: The same listing with and without an empty search
    let plain = BookQuery::default().paged(100, 0);
    let mut empty = plain.clone();
    empty.search = Some(String::new());

    // When/Then: Both return the full catalog
    let mut exec = catalog().lock().unwrap();
    let a = query_books(&mut *exec, &plain, ReadStrategy::Aggregate).unwrap();
    let b = query_books(&mut *exec, &empty, ReadStrategy::Aggregate).unwrap();
    assert_eq!(a, b);
    assert_eq!(b.total, BOOKS);
}

#[test]
fn test_search_ignores_case() {
    // Given: A fragment of an existing title, upper-cased
    let all = list(&BookQuery::default().paged(100, 0), ReadStrategy::Aggregate);
    let fragment: String = all[0].title.chars().take(4).collect();
    let shouted = fragment.to_uppercase();

    // When: Searching for the upper-cased fragment
    let query = BookQuery::default().with_search(&shouted).paged(100, 0);
    let found = list(&query, ReadStrategy::Aggregate);

    // Then: The original book is found, and every hit matches title or author
    assert!(found.iter().any(|b| b.id == all[0].id));
    assert!(found.iter().all(|b| matches_search(b, &fragment)));

    // And: The lower-cased search agrees
    let lower = list(
        &BookQuery::default()
            .with_search(fragment.to_lowercase())
            .paged(100, 0),
        ReadStrategy::TwoStatement,
    );
    assert_eq!(found, lower);
}

#[test]
fn test_search_matches_author_names() {
    // Given: An author's surname
    let all = list(&BookQuery::default().paged(100, 0), ReadStrategy::Aggregate);
    let author = all
        .iter()
        .flat_map(|b| b.authors.iter())
        .next()
        .unwrap()
        .clone();
    let surname = author.name.rsplit(' ').next().unwrap().to_string();

    // When: Searching for it
    let mut exec = catalog().lock().unwrap();
    let page = query_books(
        &mut *exec,
        &BookQuery::default().with_search(&surname).paged(100, 0),
        ReadStrategy::Aggregate,
    )
    .unwrap();

    // Then: Every book by that author is listed, with its full author list
    let by_author: Vec<_> = all
        .iter()
        .filter(|b| b.authors.iter().any(|a| a.id == author.id))
        .collect();
    assert!(!by_author.is_empty());
    for book in by_author {
        let hit = page.books.iter().find(|b| b.id == book.id).unwrap();
        assert_eq!(hit.authors, book.authors);
    }
    assert_eq!(page.total as usize, page.books.len());
}

#[test]
fn test_unmatched_search_is_empty() {
    let query = BookQuery::default().with_search("zzzz-not-a-word");

    for strategy in [ReadStrategy::Aggregate, ReadStrategy::TwoStatement] {
        let mut exec = catalog().lock().unwrap();
        let page = query_books(&mut *exec, &query, strategy).unwrap();
        assert_eq!(page.total, 0);
        assert!(page.books.is_empty());
    }
}

#[test]
fn test_every_seeded_book_has_authors() {
    let books = list(&BookQuery::default().paged(100, 0), ReadStrategy::Aggregate);

    for book in &books {
        assert!(!book.authors.is_empty(), "{} has no authors", book.title);
        assert!(book.authors.windows(2).all(|w| w[0].name <= w[1].name));
    }
}

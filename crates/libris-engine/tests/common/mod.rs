use chrono::NaiveDate;
use libris_core::ids::SequentialIds;
use libris_core::model::NewBook;
use libris_store::exec::SqliteExecutor;
use libris_store::migrations::apply_migrations;
use libris_store::seed::{fill, SeedPlan};
use std::path::Path;

/// A migrated in-memory catalog
#[allow(dead_code)]
pub fn empty_catalog() -> SqliteExecutor {
    let mut exec = SqliteExecutor::open_in_memory().unwrap();
    apply_migrations(&mut exec).unwrap();
    exec
}

/// A migrated catalog on disk, for tests that need several connections
#[allow(dead_code)]
pub fn file_catalog(path: &Path) -> SqliteExecutor {
    let mut exec = SqliteExecutor::open(path, None).unwrap();
    apply_migrations(&mut exec).unwrap();
    exec
}

/// A migrated in-memory catalog filled with generated data
#[allow(dead_code)]
pub fn seeded_catalog(books: usize, authors: usize) -> SqliteExecutor {
    let mut exec = empty_catalog();
    fill(
        &mut exec,
        &SequentialIds::starting_at(1_000_000),
        &SeedPlan {
            books,
            authors,
            seed: 0,
        },
    )
    .unwrap();
    exec
}

#[allow(dead_code)]
pub fn new_book(title: &str, authors: &[&str]) -> NewBook {
    NewBook {
        title: title.to_string(),
        number_of_pages: 250,
        published_at: NaiveDate::from_ymd_opt(1999, 9, 9).unwrap(),
        authors: authors.iter().map(|a| a.to_string()).collect(),
    }
}

#[allow(dead_code)]
pub fn count(exec: &SqliteExecutor, sql: &str) -> i64 {
    exec.connection()
        .query_row(sql, [], |row| row.get(0))
        .unwrap()
}

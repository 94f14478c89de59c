//! Result scanner
//!
//! Decodes backend-neutral rows into catalog entities. JSON aggregation
//! columns become nested, ordered author lists; a NULL or empty aggregate
//! is an empty list. Any malformed value fails the whole result.

use crate::errors::{decoding_error, Result};
use crate::exec::{Row, Value};
use chrono::NaiveDate;
use libris_core::errors::LbError;
use libris_core::model::{Author, Book, BookPage};
use serde::Deserialize;
use uuid::Uuid;

/// A book object inside an aggregate `books` document
#[derive(Debug, Deserialize)]
struct AggregatedBook {
    id: Uuid,
    title: String,
    number_of_pages: i64,
    published_at: NaiveDate,
    authors: Option<Vec<Author>>,
    position: i64,
}

fn column<'r>(op: &str, row: &'r Row, index: usize) -> Result<&'r Value> {
    row.get(index)
        .ok_or_else(|| decoding_error(op, format!("row has no column {}", index)))
}

fn mismatch(op: &str, index: usize, expected: &str, got: &Value) -> LbError {
    decoding_error(
        op,
        format!("column {} expected {}, got {:?}", index, expected, got),
    )
}

fn uuid_at(op: &str, row: &Row, index: usize) -> Result<Uuid> {
    match column(op, row, index)? {
        Value::Uuid(id) => Ok(*id),
        other => Err(mismatch(op, index, "uuid", other)),
    }
}

fn text_at(op: &str, row: &Row, index: usize) -> Result<String> {
    match column(op, row, index)? {
        Value::Text(s) => Ok(s.clone()),
        other => Err(mismatch(op, index, "text", other)),
    }
}

fn integer_at(op: &str, row: &Row, index: usize) -> Result<i64> {
    match column(op, row, index)? {
        Value::Integer(i) => Ok(*i),
        other => Err(mismatch(op, index, "integer", other)),
    }
}

fn date_at(op: &str, row: &Row, index: usize) -> Result<NaiveDate> {
    match column(op, row, index)? {
        Value::Date(d) => Ok(*d),
        other => Err(mismatch(op, index, "date", other)),
    }
}

/// Raw JSON text of an aggregate column; `None` for NULL or empty
fn json_at<'r>(op: &str, row: &'r Row, index: usize) -> Result<Option<&'r str>> {
    match column(op, row, index)? {
        Value::Null => Ok(None),
        Value::Json(text) if text.trim().is_empty() => Ok(None),
        Value::Json(text) => Ok(Some(text.as_str())),
        other => Err(mismatch(op, index, "json", other)),
    }
}

/// Authors in a stable order: by name, then id
fn sorted_authors(mut authors: Vec<Author>) -> Vec<Author> {
    authors.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
    authors
}

fn decode_authors(op: &str, json: Option<&str>) -> Result<Vec<Author>> {
    let Some(text) = json else {
        return Ok(Vec::new());
    };
    let authors: Option<Vec<Author>> = serde_json::from_str(text)
        .map_err(|e| decoding_error(op, format!("malformed authors aggregate: {}", e)))?;
    Ok(sorted_authors(authors.unwrap_or_default()))
}

/// A single `COUNT(*)` row
///
/// # Errors
/// `Decoding` unless there is exactly one non-negative integer.
pub fn scan_count(rows: &[Row]) -> Result<u64> {
    const OP: &str = "scan_count";
    let [row] = rows else {
        return Err(decoding_error(
            OP,
            format!("expected one row, got {}", rows.len()),
        ));
    };
    let count = integer_at(OP, row, 0)?;
    u64::try_from(count).map_err(|_| decoding_error(OP, format!("negative count {}", count)))
}

/// Page rows: `(id, title, number_of_pages, published_at, authors_json)`
///
/// # Errors
/// `Decoding` on any column of the wrong kind or malformed JSON.
pub fn scan_books(rows: &[Row]) -> Result<Vec<Book>> {
    const OP: &str = "scan_books";
    rows.iter()
        .map(|row| {
            Ok(Book {
                id: uuid_at(OP, row, 0)?,
                title: text_at(OP, row, 1)?,
                number_of_pages: integer_at(OP, row, 2)?,
                published_at: date_at(OP, row, 3)?,
                authors: decode_authors(OP, json_at(OP, row, 4)?)?,
            })
        })
        .collect()
}

/// The single `(total, books_json)` row of an aggregate read
///
/// Books are returned in their `position` order. No row at all is treated
/// as an empty result.
///
/// # Errors
/// `Decoding` on a wrong column kind or malformed JSON.
pub fn scan_aggregate(rows: &[Row]) -> Result<BookPage> {
    const OP: &str = "scan_aggregate";
    let row = match rows {
        [] => {
            return Ok(BookPage {
                total: 0,
                books: Vec::new(),
            })
        }
        [row] => row,
        _ => {
            return Err(decoding_error(
                OP,
                format!("expected one row, got {}", rows.len()),
            ))
        }
    };

    let total = integer_at(OP, row, 0)?;
    let total =
        u64::try_from(total).map_err(|_| decoding_error(OP, format!("negative total {}", total)))?;

    let mut books: Vec<AggregatedBook> = match json_at(OP, row, 1)? {
        None => Vec::new(),
        Some(text) => serde_json::from_str::<Option<Vec<AggregatedBook>>>(text)
            .map_err(|e| decoding_error(OP, format!("malformed books aggregate: {}", e)))?
            .unwrap_or_default(),
    };
    books.sort_by_key(|b| b.position);

    Ok(BookPage {
        total,
        books: books
            .into_iter()
            .map(|b| Book {
                id: b.id,
                title: b.title,
                number_of_pages: b.number_of_pages,
                published_at: b.published_at,
                authors: sorted_authors(b.authors.unwrap_or_default()),
            })
            .collect(),
    })
}

/// The id returned by an `INSERT ... RETURNING id`
///
/// # Errors
/// `Decoding` unless exactly one uuid row came back.
pub fn scan_returned_id(rows: &[Row]) -> Result<Uuid> {
    const OP: &str = "scan_returned_id";
    match rows {
        [row] => uuid_at(OP, row, 0),
        _ => Err(decoding_error(
            OP,
            format!("expected one returned id, got {} rows", rows.len()),
        )),
    }
}

/// `(id, name)` author rows
///
/// # Errors
/// `Decoding` on a wrong column kind.
pub fn scan_authors(rows: &[Row]) -> Result<Vec<Author>> {
    const OP: &str = "scan_authors";
    rows.iter()
        .map(|row| {
            Ok(Author {
                id: uuid_at(OP, row, 0)?,
                name: text_at(OP, row, 1)?,
            })
        })
        .collect()
}

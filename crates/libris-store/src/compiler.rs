//! Query template compiler
//!
//! Turns a query shape plus a dialect into final SQL text and the ordered
//! list of parameter slots that text expects. Only allow-listed identifiers
//! (see `SortColumn::column`) are ever interpolated; every caller value goes
//! through a placeholder.

use crate::dialect::{Dialect, JsonValue, PlaceholderStyle};
use crate::errors::{binding_error, Result};
use libris_core::model::{BookQuery, SortColumn};

/// A value the compiled SQL needs bound at a placeholder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamSlot {
    Search,
    Limit,
    Offset,
    BookId,
    Title,
    NumberOfPages,
    PublishedAt,
    AuthorId(usize),
    AuthorName(usize),
}

/// How a result column must be decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Uuid,
    Text,
    Integer,
    Date,
    /// JSON text (SQLite) or a json/jsonb value (PostgreSQL)
    Json,
}

/// Final SQL text plus everything needed to bind and decode it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledQuery {
    /// Statement name used in logs
    pub name: &'static str,
    pub dialect: Dialect,
    pub sql: String,
    /// One entry per argument, in argument order
    pub slots: Vec<ParamSlot>,
    pub columns: Vec<ColumnKind>,
}

/// Accumulates SQL text and assigns placeholders per the dialect
struct SqlWriter {
    dialect: Dialect,
    sql: String,
    slots: Vec<ParamSlot>,
}

impl SqlWriter {
    fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            sql: String::with_capacity(256),
            slots: Vec::new(),
        }
    }

    fn push(&mut self, fragment: &str) -> &mut Self {
        self.sql.push_str(fragment);
        self
    }

    /// Placeholder for `slot`. Must be called in textual order.
    fn param(&mut self, slot: ParamSlot) -> String {
        match self.dialect.placeholder_style() {
            PlaceholderStyle::Numbered { prefix } => {
                let number = match self.slots.iter().position(|s| *s == slot) {
                    Some(index) => index + 1,
                    None => {
                        self.slots.push(slot);
                        self.slots.len()
                    }
                };
                format!("{prefix}{number}")
            }
            PlaceholderStyle::Positional { symbol } => {
                self.slots.push(slot);
                symbol.to_string()
            }
        }
    }

    fn finish(self, name: &'static str, columns: Vec<ColumnKind>) -> CompiledQuery {
        CompiledQuery {
            name,
            dialect: self.dialect,
            sql: self.sql,
            slots: self.slots,
            columns,
        }
    }
}

/// A listing query skeleton with clauses gated on the input
///
/// `WHERE` is written only when the input carries a search term, `LIMIT` /
/// `OFFSET` only when the respective value is positive.
#[derive(Debug, Clone)]
pub struct QueryShape {
    /// `SELECT ... FROM ... [JOIN ...]`
    pub select: String,
    pub filtered: bool,
    pub group_by: Option<&'static str>,
    pub ordered: bool,
    pub paginated: bool,
}

/// Which listing statement to build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadShape {
    /// `total` for the filter, ignoring pagination
    Count,
    /// One row per book on the requested page
    Page,
    /// One row: `(total, books_json)`, via named intermediate result sets
    Aggregate,
}

const BOOK_COLUMNS: &str = "books.id, books.title, books.number_of_pages, books.published_at";
const AUTHOR_JOINS: &str = "LEFT JOIN book_authors ON book_authors.book_id = books.id \
     LEFT JOIN authors ON authors.id = book_authors.author_id";
const BOOK_GROUP_BY: &str = "books.id, books.title, books.number_of_pages, books.published_at";

impl QueryShape {
    fn render(&self, w: &mut SqlWriter, query: &BookQuery) {
        w.push(&self.select);
        if self.filtered {
            write_filter(w, query);
        }
        if let Some(group_by) = self.group_by {
            w.push(" GROUP BY ").push(group_by);
        }
        if self.ordered {
            let order = order_by(w.dialect, query);
            w.push(" ORDER BY ").push(&order);
        }
        if self.paginated {
            write_pagination(w, query);
        }
    }
}

/// Matches books whose title or any author's name contains the search term
fn write_filter(w: &mut SqlWriter, query: &BookQuery) {
    if query.search.as_deref().map_or(true, str::is_empty) {
        return;
    }
    let dialect = w.dialect;
    let title_param = w.param(ParamSlot::Search);
    let title_match = dialect.substring_match("books.title", &title_param);
    let name_param = w.param(ParamSlot::Search);
    let name_match = dialect.substring_match("a.name", &name_param);
    w.push(&format!(
        " WHERE ({title_match} OR EXISTS (SELECT 1 FROM book_authors ba \
         JOIN authors a ON a.id = ba.author_id \
         WHERE ba.book_id = books.id AND {name_match}))"
    ));
}

/// Sort column, then `books.id` so that pages never overlap
fn order_by(dialect: Dialect, query: &BookQuery) -> String {
    let mut order = format!(
        "{} {} {}",
        query.sort.column(),
        query.direction.keyword(),
        dialect.nulls_last()
    );
    if query.sort != SortColumn::Id {
        order.push_str(", books.id ASC");
    }
    order
}

fn write_pagination(w: &mut SqlWriter, query: &BookQuery) {
    if query.limit > 0 {
        let p = w.param(ParamSlot::Limit);
        w.push(" LIMIT ").push(&p);
    }
    if query.offset > 0 {
        if query.limit == 0 {
            if let Some(unbounded) = w.dialect.unbounded_limit() {
                w.push(" LIMIT ").push(unbounded);
            }
        }
        let p = w.param(ParamSlot::Offset);
        w.push(" OFFSET ").push(&p);
    }
}

fn authors_aggregate(dialect: Dialect) -> String {
    dialect.json_array_agg(
        &[
            ("id", JsonValue::Column("authors.id")),
            ("name", JsonValue::Column("authors.name")),
        ],
        Some("authors.id IS NOT NULL"),
    )
}

/// Compile a listing statement
pub fn compile_read(dialect: Dialect, shape: ReadShape, query: &BookQuery) -> CompiledQuery {
    let mut w = SqlWriter::new(dialect);
    match shape {
        ReadShape::Count => {
            QueryShape {
                select: "SELECT COUNT(*) FROM books".to_string(),
                filtered: true,
                group_by: None,
                ordered: false,
                paginated: false,
            }
            .render(&mut w, query);
            w.finish("count_books", vec![ColumnKind::Integer])
        }
        ReadShape::Page => {
            QueryShape {
                select: format!(
                    "SELECT {BOOK_COLUMNS}, {} AS authors FROM books {AUTHOR_JOINS}",
                    authors_aggregate(dialect)
                ),
                filtered: true,
                group_by: Some(BOOK_GROUP_BY),
                ordered: true,
                paginated: true,
            }
            .render(&mut w, query);
            w.finish(
                "page_books",
                vec![
                    ColumnKind::Uuid,
                    ColumnKind::Text,
                    ColumnKind::Integer,
                    ColumnKind::Date,
                    ColumnKind::Json,
                ],
            )
        }
        ReadShape::Aggregate => {
            w.push("WITH filtered_books AS (");
            QueryShape {
                select: format!("SELECT {BOOK_COLUMNS} FROM books"),
                filtered: true,
                group_by: None,
                ordered: false,
                paginated: false,
            }
            .render(&mut w, query);
            w.push("), paginated_books AS (");
            QueryShape {
                select: format!(
                    "SELECT {BOOK_COLUMNS}, {} AS authors, \
                     ROW_NUMBER() OVER (ORDER BY {}) AS row_position \
                     FROM filtered_books AS books {AUTHOR_JOINS}",
                    authors_aggregate(dialect),
                    order_by(dialect, query)
                ),
                filtered: false,
                group_by: Some(BOOK_GROUP_BY),
                ordered: true,
                paginated: true,
            }
            .render(&mut w, query);
            let books = dialect.json_array_agg(
                &[
                    ("id", JsonValue::Column("paginated_books.id")),
                    ("title", JsonValue::Column("paginated_books.title")),
                    (
                        "number_of_pages",
                        JsonValue::Column("paginated_books.number_of_pages"),
                    ),
                    (
                        "published_at",
                        JsonValue::Column("paginated_books.published_at"),
                    ),
                    ("authors", JsonValue::Embedded("paginated_books.authors")),
                    ("position", JsonValue::Column("paginated_books.row_position")),
                ],
                None,
            );
            w.push(&format!(
                ") SELECT (SELECT COUNT(*) FROM filtered_books) AS total, {books} AS books \
                 FROM paginated_books"
            ));
            w.finish("aggregate_books", vec![ColumnKind::Integer, ColumnKind::Json])
        }
    }
}

/// `INSERT INTO books ... RETURNING id`
pub fn compile_insert_book(dialect: Dialect) -> CompiledQuery {
    let mut w = SqlWriter::new(dialect);
    let id = w.param(ParamSlot::BookId);
    let title = w.param(ParamSlot::Title);
    let pages = w.param(ParamSlot::NumberOfPages);
    let published = w.param(ParamSlot::PublishedAt);
    w.push(&format!(
        "INSERT INTO books (id, title, number_of_pages, published_at) \
         VALUES ({id}, {title}, {pages}, {published}) RETURNING id"
    ));
    w.finish("insert_book", vec![ColumnKind::Uuid])
}

fn author_values(w: &mut SqlWriter, count: usize) -> String {
    (0..count)
        .map(|i| {
            let id = w.param(ParamSlot::AuthorId(i));
            let name = w.param(ParamSlot::AuthorName(i));
            format!("({id}, {name})")
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn require_rows(op: &str, count: usize) -> Result<()> {
    if count == 0 {
        return Err(binding_error(op, "statement needs at least one value row"));
    }
    Ok(())
}

/// Bulk author insert that leaves existing names untouched
///
/// # Errors
/// A zero row count is a binding error.
pub fn compile_insert_authors(dialect: Dialect, count: usize) -> Result<CompiledQuery> {
    require_rows("insert_authors", count)?;
    let mut w = SqlWriter::new(dialect);
    w.push("INSERT INTO authors (id, name) VALUES ");
    let values = author_values(&mut w, count);
    w.push(&values).push(" ON CONFLICT (name) DO NOTHING");
    Ok(w.finish("insert_authors", Vec::new()))
}

/// Authoritative `(id, name)` rows for a set of names
///
/// # Errors
/// A zero name count is a binding error.
pub fn compile_select_authors(dialect: Dialect, count: usize) -> Result<CompiledQuery> {
    require_rows("select_authors", count)?;
    let mut w = SqlWriter::new(dialect);
    let names = (0..count)
        .map(|i| w.param(ParamSlot::AuthorName(i)))
        .collect::<Vec<_>>()
        .join(", ");
    w.push(&format!(
        "SELECT authors.id, authors.name FROM authors WHERE authors.name IN ({names})"
    ));
    Ok(w.finish("select_authors", vec![ColumnKind::Uuid, ColumnKind::Text]))
}

/// Insert-or-fetch in one statement; returns `(id, name)` for every name
///
/// # Errors
/// A zero row count is a binding error.
pub fn compile_upsert_authors(dialect: Dialect, count: usize) -> Result<CompiledQuery> {
    require_rows("upsert_authors", count)?;
    let mut w = SqlWriter::new(dialect);
    w.push("INSERT INTO authors (id, name) VALUES ");
    let values = author_values(&mut w, count);
    w.push(&values)
        .push(" ON CONFLICT (name) DO UPDATE SET name = excluded.name RETURNING id, name");
    Ok(w.finish("upsert_authors", vec![ColumnKind::Uuid, ColumnKind::Text]))
}

/// Link one book to `count` authors; existing pairs are skipped
///
/// # Errors
/// A zero row count is a binding error.
pub fn compile_link_authors(dialect: Dialect, count: usize) -> Result<CompiledQuery> {
    require_rows("link_authors", count)?;
    let mut w = SqlWriter::new(dialect);
    w.push("INSERT INTO book_authors (book_id, author_id) VALUES ");
    let values = (0..count)
        .map(|i| {
            let book = w.param(ParamSlot::BookId);
            let author = w.param(ParamSlot::AuthorId(i));
            format!("({book}, {author})")
        })
        .collect::<Vec<_>>()
        .join(", ");
    w.push(&values)
        .push(" ON CONFLICT (book_id, author_id) DO NOTHING");
    Ok(w.finish("link_authors", Vec::new()))
}

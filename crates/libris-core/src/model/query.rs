//! Read-side input and output types

use crate::errors::{LibrisError, Result};
use crate::model::Book;
use serde::{Deserialize, Serialize};

pub const DEFAULT_LIMIT: u32 = 10;
pub const MIN_LIMIT: u32 = 1;
pub const MAX_LIMIT: u32 = 100;

/// Columns a listing may be sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortColumn {
    #[default]
    Id,
    Title,
    NumberOfPages,
    PublishedAt,
}

impl SortColumn {
    pub const ALL: [SortColumn; 4] = [
        SortColumn::Id,
        SortColumn::Title,
        SortColumn::NumberOfPages,
        SortColumn::PublishedAt,
    ];

    /// Resolve a caller-supplied key through the allow-list.
    pub fn parse(value: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.key() == value)
            .ok_or_else(|| LibrisError::InvalidSort {
                value: value.to_string(),
            })
    }

    /// The key callers use in the `sort` parameter
    pub fn key(&self) -> &'static str {
        match self {
            SortColumn::Id => "id",
            SortColumn::Title => "title",
            SortColumn::NumberOfPages => "number_of_pages",
            SortColumn::PublishedAt => "published_at",
        }
    }

    /// The qualified column the key maps to. Safe to interpolate.
    pub fn column(&self) -> &'static str {
        match self {
            SortColumn::Id => "books.id",
            SortColumn::Title => "books.title",
            SortColumn::NumberOfPages => "books.number_of_pages",
            SortColumn::PublishedAt => "books.published_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "asc" => Ok(Direction::Asc),
            "desc" => Ok(Direction::Desc),
            other => Err(LibrisError::InvalidDirection {
                value: other.to_string(),
            }),
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// Listing parameters as they arrive from a caller, before validation
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookQueryParams {
    pub sort: Option<String>,
    pub direction: Option<String>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// A validated listing request
///
/// `search` is never `Some("")`; an empty search is normalised to `None`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BookQuery {
    pub sort: SortColumn,
    pub direction: Direction,
    pub search: Option<String>,
    pub limit: u32,
    pub offset: u64,
}

impl Default for BookQuery {
    fn default() -> Self {
        Self {
            sort: SortColumn::default(),
            direction: Direction::default(),
            search: None,
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl BookQuery {
    pub fn sorted_by(mut self, sort: SortColumn, direction: Direction) -> Self {
        self.sort = sort;
        self.direction = direction;
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        let search = search.into();
        self.search = if search.is_empty() { None } else { Some(search) };
        self
    }

    pub fn paged(mut self, limit: u32, offset: u64) -> Self {
        self.limit = limit;
        self.offset = offset;
        self
    }
}

/// One page of a listing plus the unpaginated match count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookPage {
    pub total: u64,
    pub books: Vec<Book>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_allow_list() {
        for column in SortColumn::ALL {
            assert_eq!(SortColumn::parse(column.key()).unwrap(), column);
            assert!(column.column().starts_with("books."));
        }
        assert!(matches!(
            SortColumn::parse("title; DROP TABLE books"),
            Err(LibrisError::InvalidSort { .. })
        ));
        assert!(SortColumn::parse("TITLE").is_err());
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!(Direction::parse("desc").unwrap(), Direction::Desc);
        assert_eq!(Direction::parse("asc").unwrap().keyword(), "ASC");
        assert!(Direction::parse("down").is_err());
    }

    #[test]
    fn test_empty_search_is_absent() {
        let q = BookQuery::default().with_search("");
        assert_eq!(q.search, None);
        assert_eq!(q, BookQuery::default());
    }
}

use crate::errors::{LibrisError, Result};
use crate::model::query::{DEFAULT_LIMIT, MAX_LIMIT, MIN_LIMIT};
use crate::model::command::MAX_AUTHORS;
use crate::model::{BookQuery, BookQueryParams, Direction, NewBook, NewBookRequest, SortColumn};
use chrono::NaiveDate;

/// Validate listing parameters into a `BookQuery`
///
/// Missing values take their defaults (sort `id`, direction `asc`, limit 10,
/// offset 0). The search term is kept verbatim; an empty one means no filter.
///
/// # Errors
/// Returns the first violation found, checked in parameter order.
pub fn validate_query(params: BookQueryParams) -> Result<BookQuery> {
    let sort = match params.sort.as_deref() {
        None | Some("") => SortColumn::default(),
        Some(value) => SortColumn::parse(value)?,
    };

    let direction = match params.direction.as_deref() {
        None | Some("") => Direction::default(),
        Some(value) => Direction::parse(value)?,
    };

    let limit = match params.limit {
        None => DEFAULT_LIMIT,
        Some(value) if (i64::from(MIN_LIMIT)..=i64::from(MAX_LIMIT)).contains(&value) => {
            value as u32
        }
        Some(value) => {
            return Err(LibrisError::LimitOutOfRange {
                value,
                min: i64::from(MIN_LIMIT),
                max: i64::from(MAX_LIMIT),
            })
        }
    };

    let offset = match params.offset {
        None => 0,
        Some(value) if value >= 0 => value as u64,
        Some(value) => return Err(LibrisError::NegativeOffset { value }),
    };

    Ok(BookQuery {
        sort,
        direction,
        search: params.search.filter(|s| !s.is_empty()),
        limit,
        offset,
    })
}

/// Validate a create-book body into a `NewBook`
///
/// The title and author names are trimmed. Between one and `MAX_AUTHORS`
/// authors are required; exact duplicate names collapse to their first
/// occurrence. A missing page count is stored as 0.
///
/// # Errors
/// Returns the first violation found.
pub fn validate_new_book(request: NewBookRequest) -> Result<NewBook> {
    let title = request
        .title
        .ok_or_else(|| LibrisError::MissingField {
            field: "title".to_string(),
        })?
        .trim()
        .to_string();
    if title.is_empty() {
        return Err(LibrisError::EmptyTitle);
    }

    let number_of_pages = request.number_of_pages.unwrap_or(0);
    if number_of_pages < 0 {
        return Err(LibrisError::NegativePageCount {
            value: number_of_pages,
        });
    }

    let raw_date = request
        .published_at
        .ok_or_else(|| LibrisError::MissingField {
            field: "published_at".to_string(),
        })?;
    let published_at = NaiveDate::parse_from_str(raw_date.trim(), "%Y-%m-%d")
        .map_err(|_| LibrisError::InvalidDate { value: raw_date })?;

    let submitted = request.authors.unwrap_or_default();
    if submitted.is_empty() {
        return Err(LibrisError::EmptyAuthorList);
    }
    if submitted.len() > MAX_AUTHORS {
        return Err(LibrisError::TooManyAuthors {
            count: submitted.len(),
            max: MAX_AUTHORS,
        });
    }

    let mut authors: Vec<String> = Vec::with_capacity(submitted.len());
    for (index, name) in submitted.into_iter().enumerate() {
        let name = name.trim();
        if name.is_empty() {
            return Err(LibrisError::BlankAuthorName { index });
        }
        if !authors.iter().any(|seen| seen == name) {
            authors.push(name.to_string());
        }
    }

    Ok(NewBook {
        title,
        number_of_pages,
        published_at,
        authors,
    })
}

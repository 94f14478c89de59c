//! Write-side input and output types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Most author names one book may list
///
/// Keeps every write statement well under the backends' bound-parameter
/// limits (32766 on SQLite, 65535 on PostgreSQL).
pub const MAX_AUTHORS: usize = 1_000;

/// A create-book body as submitted, before validation
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewBookRequest {
    pub title: Option<String>,
    pub number_of_pages: Option<i64>,
    pub published_at: Option<String>,
    pub authors: Option<Vec<String>>,
}

/// A validated create-book request
///
/// `authors` is non-empty, at most `MAX_AUTHORS` long, free of blank names
/// and free of exact duplicates, in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub number_of_pages: i64,
    pub published_at: NaiveDate,
    pub authors: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedBook {
    pub id: Uuid,
}

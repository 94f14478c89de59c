//! Catalog domain model

pub mod book;
pub mod command;
pub mod query;

pub use book::{Author, Book, BookAuthor};
pub use command::{CreatedBook, NewBook, NewBookRequest, MAX_AUTHORS};
pub use query::{BookPage, BookQuery, BookQueryParams, Direction, SortColumn};

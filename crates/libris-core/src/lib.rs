//! libris core: the catalog's domain model and cross-cutting facilities
//!
//! - Book/author model, listing and create-book inputs
//! - Input validation rules
//! - Identifier generation
//! - Error facility (`LbError`) and logging facility

pub mod errors;
pub mod ids;
pub mod logging_facility;
pub mod model;
pub mod rules;

// Re-export commonly used types
pub use errors::{LbError, LbErrorKind, LibrisError, Result};
pub use ids::{IdGenerator, RandomIds, SequentialIds};
pub use model::{Author, Book, BookPage, BookQuery, CreatedBook, NewBook};

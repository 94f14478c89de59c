//! Input rules enforced before any statement runs

pub mod validation;

pub use validation::{validate_new_book, validate_query};

//! Op boundary logging macros
//!
//! Every engine operation logs exactly one `start` and one `end` or
//! `end_error` event. Callers must depend on `libris-core-types`.

/// Log the start of an operation
///
/// ```
/// # use libris_core::log_op_start;
/// log_op_start!("query_books");
/// log_op_start!("create_book", author_count = 2);
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = libris_core_types::schema::EVENT_START,
        );
    };
    ($op:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = libris_core_types::schema::EVENT_START,
            $($field)*
        );
    };
}

/// Log the successful end of an operation
///
/// ```
/// # use libris_core::log_op_end;
/// log_op_end!("query_books", duration_ms = 3);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = libris_core_types::schema::EVENT_END,
            duration_ms = $duration,
        );
    };
    ($op:expr, duration_ms = $duration:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = libris_core_types::schema::EVENT_END,
            duration_ms = $duration,
            $($field)*
        );
    };
}

/// Log an operation failure
///
/// Accepts anything convertible into `LbError`.
///
/// ```
/// # use libris_core::{log_op_error, errors::LibrisError};
/// log_op_error!("create_book", LibrisError::EmptyTitle, duration_ms = 1);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr) => {{
        let lb_err: $crate::errors::LbError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = libris_core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err.kind = ?lb_err.kind(),
            err.code = lb_err.code(),
            error = %lb_err,
        );
    }};
    ($op:expr, $err:expr, duration_ms = $duration:expr, $($field:tt)*) => {{
        let lb_err: $crate::errors::LbError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = libris_core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err.kind = ?lb_err.kind(),
            err.code = lb_err.code(),
            error = %lb_err,
            $($field)*
        );
    }};
}

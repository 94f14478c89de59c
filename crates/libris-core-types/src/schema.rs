//! Canonical schema constants for structured logging
//!
//! Field keys used by the op-boundary macros and the statement log sink.

// Op boundary fields
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_REQUEST_ID: &str = "request_id";

// Statement sink fields
pub const FIELD_SQL: &str = "sql";
pub const FIELD_ARGS: &str = "args";
pub const FIELD_DIALECT: &str = "dialect";
pub const FIELD_ROWS: &str = "rows";

// Catalog fields
pub const FIELD_BOOK_ID: &str = "book_id";
pub const FIELD_AUTHOR_COUNT: &str = "author_count";
pub const FIELD_TOTAL: &str = "total";
pub const FIELD_STEP: &str = "step";

// Error fields
pub const FIELD_ERR_KIND: &str = "err.kind";
pub const FIELD_ERR_CODE: &str = "err.code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
pub const EVENT_STATEMENT: &str = "statement";
pub const EVENT_STATEMENT_ERROR: &str = "statement_error";

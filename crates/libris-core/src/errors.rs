use libris_core_types::RequestId;
use thiserror::Error;

/// Result type alias for input validation
pub type Result<T> = std::result::Result<T, LibrisError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Every failure surfaced by the catalog maps to exactly one kind. Only
/// `Validation` is the caller's fault; everything else is reported to
/// clients as an opaque internal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LbErrorKind {
    /// Unknown backend tag, bad configuration value
    Configuration,
    /// Caller input rejected before any statement runs
    Validation,
    /// Argument list does not line up with the compiled placeholders
    Binding,
    /// A row or JSON aggregate could not be decoded
    Decoding,
    /// A transaction could not be started, committed, or rolled back
    Transaction,
    /// The backend rejected a statement
    Persistence,
    /// A statement exceeded its deadline
    Timeout,
    /// The caller abandoned the request while it was running
    Cancelled,
    Io,
    Serialization,
    Internal,
}

impl LbErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            LbErrorKind::Configuration => "ERR_CONFIGURATION",
            LbErrorKind::Validation => "ERR_VALIDATION",
            LbErrorKind::Binding => "ERR_BINDING",
            LbErrorKind::Decoding => "ERR_DECODING",
            LbErrorKind::Transaction => "ERR_TRANSACTION",
            LbErrorKind::Persistence => "ERR_PERSISTENCE",
            LbErrorKind::Timeout => "ERR_TIMEOUT",
            LbErrorKind::Cancelled => "ERR_CANCELLED",
            LbErrorKind::Io => "ERR_IO",
            LbErrorKind::Serialization => "ERR_SERIALIZATION",
            LbErrorKind::Internal => "ERR_INTERNAL",
        }
    }

    /// Whether the caller can fix the request and retry.
    pub fn is_client_error(&self) -> bool {
        matches!(self, LbErrorKind::Validation)
    }
}

/// Canonical structured error type
///
/// Built with `with_*` methods; carries the failing operation, the input
/// field (for validation failures), the causing error and, when a rollback
/// also failed, the rollback error joined alongside the original cause.
#[derive(Debug, Clone)]
pub struct LbError {
    kind: LbErrorKind,
    op: Option<String>,
    field: Option<String>,
    request_id: Option<RequestId>,
    message: String,
    source: Option<Box<LbError>>,
    rollback: Option<Box<LbError>>,
}

impl LbError {
    /// Create a new error with the specified kind
    pub fn new(kind: LbErrorKind) -> Self {
        Self {
            kind,
            op: None,
            field: None,
            request_id: None,
            message: String::new(),
            source: None,
            rollback: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Name the offending input field
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: LbError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Attach the error raised while rolling back after `source` failed
    pub fn with_rollback_error(mut self, rollback: LbError) -> Self {
        self.rollback = Some(Box::new(rollback));
        self
    }

    /// Join a failed rollback with the error that triggered it.
    ///
    /// The result is always a `Transaction` error whose source is `cause`.
    pub fn rollback_failed(op: &str, cause: LbError, rollback: LbError) -> Self {
        LbError::new(LbErrorKind::Transaction)
            .with_op(op)
            .with_message("rollback failed after statement error")
            .with_source(cause)
            .with_rollback_error(rollback)
    }

    pub fn kind(&self) -> LbErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source_error(&self) -> Option<&LbError> {
        self.source.as_deref()
    }

    pub fn rollback_error(&self) -> Option<&LbError> {
        self.rollback.as_deref()
    }
}

impl std::fmt::Display for LbError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(field) = &self.field {
            write!(f, " (field: {})", field)?;
        }
        if let Some(source) = &self.source {
            write!(f, "; caused by {}", source)?;
        }
        if let Some(rollback) = &self.rollback {
            write!(f, "; rollback error {}", rollback)?;
        }
        Ok(())
    }
}

impl std::error::Error for LbError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Input violations detected before any statement is compiled or run
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LibrisError {
    #[error("Unsupported sort column: {value} (expected one of id, title, number_of_pages, published_at)")]
    InvalidSort { value: String },

    #[error("Unsupported sort direction: {value} (expected asc or desc)")]
    InvalidDirection { value: String },

    #[error("Limit must be between {min} and {max}, got {value}")]
    LimitOutOfRange { value: i64, min: i64, max: i64 },

    #[error("Offset must not be negative, got {value}")]
    NegativeOffset { value: i64 },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Title must not be empty")]
    EmptyTitle,

    #[error("Number of pages must not be negative, got {value}")]
    NegativePageCount { value: i64 },

    #[error("Invalid publication date: {value} (expected YYYY-MM-DD)")]
    InvalidDate { value: String },

    #[error("At least one author is required")]
    EmptyAuthorList,

    #[error("A book may list at most {max} authors, got {count}")]
    TooManyAuthors { count: usize, max: usize },

    #[error("Author name at position {index} is blank")]
    BlankAuthorName { index: usize },

    #[error("Unsupported database dialect: {tag} (expected postgres or sqlite)")]
    UnsupportedDialect { tag: String },
}

impl LibrisError {
    /// The input field the violation refers to
    pub fn field(&self) -> &str {
        match self {
            LibrisError::InvalidSort { .. } => "sort",
            LibrisError::InvalidDirection { .. } => "direction",
            LibrisError::LimitOutOfRange { .. } => "limit",
            LibrisError::NegativeOffset { .. } => "offset",
            LibrisError::MissingField { field } => field,
            LibrisError::EmptyTitle => "title",
            LibrisError::NegativePageCount { .. } => "number_of_pages",
            LibrisError::InvalidDate { .. } => "published_at",
            LibrisError::EmptyAuthorList
            | LibrisError::TooManyAuthors { .. }
            | LibrisError::BlankAuthorName { .. } => "authors",
            LibrisError::UnsupportedDialect { .. } => "database.dialect",
        }
    }
}

impl From<LibrisError> for LbError {
    fn from(err: LibrisError) -> Self {
        let kind = match err {
            LibrisError::UnsupportedDialect { .. } => LbErrorKind::Configuration,
            _ => LbErrorKind::Validation,
        };
        LbError::new(kind)
            .with_field(err.field())
            .with_message(err.to_string())
    }
}

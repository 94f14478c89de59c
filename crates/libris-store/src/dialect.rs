//! Backend dialects
//!
//! A `Dialect` is chosen once at startup from the configured backend tag.
//! Everything that differs between PostgreSQL and SQLite is expressed here
//! as a SQL fragment or a capability flag; the compiler never branches on
//! the backend itself.

use libris_core::errors::LibrisError;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Supported SQL backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum Dialect {
    Postgres,
    Sqlite,
}

/// How bound parameters are written into SQL text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// `$1`, `$2`, ...; a repeated value reuses its number
    Numbered { prefix: &'static str },
    /// `?`; one argument per occurrence
    Positional { symbol: &'static str },
}

/// What a backend can do natively
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// `INSERT ... ON CONFLICT DO UPDATE ... RETURNING` in one statement
    pub upsert_returning: bool,
    /// `OFFSET` is only valid after a `LIMIT`
    pub offset_requires_limit: bool,
}

/// A value placed into a JSON object built in SQL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonValue<'a> {
    /// A scalar column
    Column(&'a str),
    /// A column that already holds JSON text or a JSON document
    Embedded(&'a str),
}

/// Isolation for a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxMode {
    /// Consistent snapshot across several reads
    Read,
    /// Takes the write lock up front (SQLite) so concurrent writers queue
    Write,
}

impl Dialect {
    /// Resolve a backend tag (`postgres`, `postgresql`, `sqlite`, `sqlite3`),
    /// case-insensitively.
    ///
    /// # Errors
    /// Unknown tags are a configuration error.
    pub fn from_tag(tag: &str) -> Result<Self, LibrisError> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Dialect::Postgres),
            "sqlite" | "sqlite3" => Ok(Dialect::Sqlite),
            _ => Err(LibrisError::UnsupportedDialect {
                tag: tag.to_string(),
            }),
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Dialect::Postgres => "postgres",
            Dialect::Sqlite => "sqlite",
        }
    }

    pub fn placeholder_style(&self) -> PlaceholderStyle {
        match self {
            Dialect::Postgres => PlaceholderStyle::Numbered { prefix: "$" },
            Dialect::Sqlite => PlaceholderStyle::Positional { symbol: "?" },
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        match self {
            Dialect::Postgres => Capabilities {
                upsert_returning: true,
                offset_requires_limit: false,
            },
            Dialect::Sqlite => Capabilities {
                upsert_returning: true,
                offset_requires_limit: true,
            },
        }
    }

    /// Case-insensitive substring test of `haystack` against an already
    /// lower-cased bound `needle`. Wildcard characters in the needle are
    /// matched literally.
    pub fn substring_match(&self, haystack: &str, needle: &str) -> String {
        match self {
            Dialect::Postgres => format!("POSITION({needle} IN LOWER({haystack})) > 0"),
            Dialect::Sqlite => format!("INSTR(LOWER({haystack}), {needle}) > 0"),
        }
    }

    /// A JSON object built from `(key, value)` pairs
    pub fn json_object(&self, fields: &[(&str, JsonValue<'_>)]) -> String {
        let pairs = fields
            .iter()
            .map(|(key, value)| format!("'{}', {}", key, self.json_value(*value)))
            .collect::<Vec<_>>()
            .join(", ");
        match self {
            Dialect::Postgres => format!("jsonb_build_object({pairs})"),
            Dialect::Sqlite => format!("json_object({pairs})"),
        }
    }

    /// Aggregate one JSON object per input row into a JSON array.
    ///
    /// Rows failing `filter` are left out. With no surviving rows PostgreSQL
    /// yields NULL and SQLite `[]`.
    pub fn json_array_agg(&self, fields: &[(&str, JsonValue<'_>)], filter: Option<&str>) -> String {
        let object = self.json_object(fields);
        let agg = match self {
            Dialect::Postgres => format!("jsonb_agg({object})"),
            Dialect::Sqlite => format!("json_group_array({object})"),
        };
        match filter {
            Some(condition) => format!("{agg} FILTER (WHERE {condition})"),
            None => agg,
        }
    }

    fn json_value(&self, value: JsonValue<'_>) -> String {
        match (self, value) {
            (_, JsonValue::Column(column)) => column.to_string(),
            (Dialect::Postgres, JsonValue::Embedded(column)) => column.to_string(),
            (Dialect::Sqlite, JsonValue::Embedded(column)) => format!("json({column})"),
        }
    }

    /// Suffix that puts NULLs after every value regardless of direction
    pub fn nulls_last(&self) -> &'static str {
        "NULLS LAST"
    }

    /// `LIMIT` value meaning "no limit", for backends that need one before
    /// `OFFSET`
    pub fn unbounded_limit(&self) -> Option<&'static str> {
        if self.capabilities().offset_requires_limit {
            Some("-1")
        } else {
            None
        }
    }

    pub fn begin(&self, mode: TxMode) -> &'static str {
        match (self, mode) {
            (Dialect::Postgres, TxMode::Read) => {
                "BEGIN ISOLATION LEVEL REPEATABLE READ READ ONLY"
            }
            (Dialect::Postgres, TxMode::Write) => "BEGIN",
            (Dialect::Sqlite, TxMode::Read) => "BEGIN DEFERRED",
            (Dialect::Sqlite, TxMode::Write) => "BEGIN IMMEDIATE",
        }
    }
}

impl FromStr for Dialect {
    type Err = LibrisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Dialect::from_tag(s)
    }
}

impl TryFrom<String> for Dialect {
    type Error = LibrisError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Dialect::from_tag(&value)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

//! Database settings and connection management

#![allow(clippy::result_large_err)]

use crate::dialect::Dialect;
use crate::errors::Result;
use crate::exec::{Executor, SqliteExecutor};
use crate::pool::{CatalogPool, Pool};
use libris_core::errors::{LbError, LbErrorKind};
use libris_core_types::Sensitive;
use serde::Deserialize;
use std::time::Duration;

/// The `[database]` configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "default_dialect")]
    pub dialect: Dialect,
    /// SQLite path (or `:memory:`) or PostgreSQL connection string
    #[serde(default = "default_url")]
    pub url: Sensitive<String>,
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
    /// 0 disables the per-statement timeout
    #[serde(default = "default_statement_timeout_ms")]
    pub statement_timeout_ms: u64,
    /// Overrides the dialect's upsert-returning capability
    #[serde(default)]
    pub upsert_returning: Option<bool>,
}

fn default_dialect() -> Dialect {
    Dialect::Sqlite
}

fn default_url() -> Sensitive<String> {
    Sensitive::new("libris.db".to_string())
}

const fn default_pool_size() -> usize {
    4
}

const fn default_statement_timeout_ms() -> u64 {
    5_000
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            dialect: default_dialect(),
            url: default_url(),
            pool_size: default_pool_size(),
            statement_timeout_ms: default_statement_timeout_ms(),
            upsert_returning: None,
        }
    }
}

impl DatabaseSettings {
    /// An in-memory SQLite catalog
    pub fn sqlite_memory() -> Self {
        Self {
            url: Sensitive::new(":memory:".to_string()),
            pool_size: 1,
            ..Self::default()
        }
    }

    pub fn statement_timeout(&self) -> Option<Duration> {
        (self.statement_timeout_ms > 0).then(|| Duration::from_millis(self.statement_timeout_ms))
    }

    /// Whether author resolution may use a single upsert-returning statement
    pub fn upsert_returning(&self) -> bool {
        self.upsert_returning
            .unwrap_or(self.dialect.capabilities().upsert_returning)
    }

    /// Connections to open. An in-memory SQLite database is private to its
    /// connection, so it always gets exactly one.
    fn effective_pool_size(&self) -> usize {
        if self.dialect == Dialect::Sqlite && self.url.expose() == ":memory:" {
            1
        } else {
            self.pool_size
        }
    }

    /// # Errors
    /// `Configuration` for a pool size of 0.
    pub fn validate(&self) -> Result<()> {
        if self.pool_size == 0 {
            return Err(LbError::new(LbErrorKind::Configuration)
                .with_op("database_settings")
                .with_field("database.pool_size")
                .with_message("pool size must be at least 1"));
        }
        Ok(())
    }
}

/// Open one connection for the configured backend
///
/// # Errors
/// `Configuration` when the backend is not compiled in, otherwise whatever
/// the driver reports while connecting.
pub fn open_executor(settings: &DatabaseSettings) -> Result<Box<dyn Executor + Send>> {
    let timeout = settings.statement_timeout();
    match settings.dialect {
        Dialect::Sqlite => Ok(Box::new(SqliteExecutor::open(
            settings.url.expose(),
            timeout,
        )?)),
        #[cfg(feature = "postgres")]
        Dialect::Postgres => Ok(Box::new(crate::exec::PgExecutor::connect(
            settings.url.expose(),
            timeout,
        )?)),
        #[cfg(not(feature = "postgres"))]
        Dialect::Postgres => Err(LbError::new(LbErrorKind::Configuration)
            .with_op("open_executor")
            .with_field("database.dialect")
            .with_message("built without PostgreSQL support (enable the `postgres` feature)")),
    }
}

/// Open the connection pool described by `settings`
///
/// # Errors
/// `Configuration` for invalid settings; connection failures as reported.
pub fn connect(settings: &DatabaseSettings) -> Result<CatalogPool> {
    settings.validate()?;
    let connections = (0..settings.effective_pool_size())
        .map(|_| open_executor(settings))
        .collect::<Result<Vec<_>>>()?;

    tracing::info!(
        component = module_path!(),
        op = "connect",
        dialect = settings.dialect.tag(),
        pool_size = connections.len(),
        "database pool ready"
    );
    Pool::new(connections)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_pool_has_one_connection() {
        let settings = DatabaseSettings {
            pool_size: 8,
            ..DatabaseSettings::sqlite_memory()
        };
        let pool = connect(&settings).unwrap();
        assert_eq!(pool.size(), 1);
    }

    #[test]
    fn test_zero_pool_size_rejected() {
        let settings = DatabaseSettings {
            pool_size: 0,
            ..DatabaseSettings::default()
        };
        let err = connect(&settings).err().unwrap();
        assert_eq!(err.kind(), LbErrorKind::Configuration);
        assert_eq!(err.field(), Some("database.pool_size"));
    }

    #[test]
    fn test_upsert_override() {
        let mut settings = DatabaseSettings::sqlite_memory();
        assert!(settings.upsert_returning());
        settings.upsert_returning = Some(false);
        assert!(!settings.upsert_returning());
    }

    #[test]
    fn test_url_is_redacted_in_debug() {
        let settings = DatabaseSettings {
            url: Sensitive::new("postgres://app:hunter2@db/libris".to_string()),
            ..DatabaseSettings::default()
        };
        assert!(!format!("{:?}", settings).contains("hunter2"));
    }

    #[cfg(not(feature = "postgres"))]
    #[test]
    fn test_postgres_needs_feature() {
        let settings = DatabaseSettings {
            dialect: Dialect::Postgres,
            ..DatabaseSettings::default()
        };
        let err = open_executor(&settings).err().unwrap();
        assert_eq!(err.kind(), LbErrorKind::Configuration);
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let settings: DatabaseSettings =
            serde_json::from_str(r#"{"dialect":"SQLite","url":":memory:"}"#).unwrap();
        assert_eq!(settings.dialect, Dialect::Sqlite);
        assert_eq!(settings.pool_size, 4);
        assert_eq!(settings.statement_timeout_ms, 5_000);
    }
}

//! PostgreSQL executor (sqlx)
//!
//! The catalog runs statements synchronously; each connection owns a
//! current-thread runtime and blocks on it. A cancelled request stops
//! before its next statement; a statement already sent is bounded by the
//! server-side `statement_timeout`.

use super::{Cancellation, Executor, Row, Value};
use crate::binder::Arg;
use crate::compiler::ColumnKind;
use crate::dialect::Dialect;
use crate::errors::{decoding_error, from_sqlx, io_error, Result};
use libris_core::errors::{LbError, LbErrorKind};
use std::future::Future;
use chrono::NaiveDate;
use sqlx::postgres::{PgConnection, PgRow};
use sqlx::{Connection, Executor as _, Row as _};
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};
use uuid::Uuid;

/// Current-thread runtime owned by one connection
///
/// Pooled connections are often released from inside the server's own
/// runtime, where dropping a runtime normally panics; this one shuts down
/// in the background instead.
struct LocalRuntime(Option<Runtime>);

impl LocalRuntime {
    fn new() -> Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| io_error("postgres_runtime", e))?;
        Ok(Self(Some(runtime)))
    }

    fn block_on<F: Future>(&self, future: F) -> Result<F::Output> {
        match &self.0 {
            Some(runtime) => Ok(runtime.block_on(future)),
            None => Err(LbError::new(LbErrorKind::Internal)
                .with_op("postgres_runtime")
                .with_message("runtime already shut down")),
        }
    }
}

impl Drop for LocalRuntime {
    fn drop(&mut self) {
        if let Some(runtime) = self.0.take() {
            runtime.shutdown_background();
        }
    }
}

pub struct PgExecutor {
    // dropped before the runtime it was created on
    conn: PgConnection,
    runtime: LocalRuntime,
    cancel: Option<Cancellation>,
}

impl PgExecutor {
    /// Connect to `url`; a statement running longer than
    /// `statement_timeout` is cancelled by the server.
    pub fn connect(url: &str, statement_timeout: Option<Duration>) -> Result<Self> {
        let runtime = LocalRuntime::new()?;
        let mut conn = runtime
            .block_on(PgConnection::connect(url))?
            .map_err(from_sqlx)?;

        if let Some(timeout) = statement_timeout {
            let set = format!("SET statement_timeout = {}", timeout.as_millis());
            runtime
                .block_on(conn.execute(set.as_str()))?
                .map_err(from_sqlx)?;
        }

        Ok(Self {
            conn,
            runtime,
            cancel: None,
        })
    }
}

impl Executor for PgExecutor {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn fetch(&mut self, sql: &str, args: &[Arg], columns: &[ColumnKind]) -> Result<Vec<Row>> {
        let query = bind_all(sqlx::query(sql), args);
        let rows = self
            .runtime
            .block_on(query.fetch_all(&mut self.conn))?
            .map_err(from_sqlx)?;
        rows.iter().map(|row| decode_row(row, columns)).collect()
    }

    fn run(&mut self, sql: &str, args: &[Arg]) -> Result<u64> {
        let query = bind_all(sqlx::query(sql), args);
        let done = self
            .runtime
            .block_on(query.execute(&mut self.conn))?
            .map_err(from_sqlx)?;
        Ok(done.rows_affected())
    }

    /// Unparameterised text goes over the simple protocol, so several
    /// statements may be sent at once.
    fn batch(&mut self, sql: &str) -> Result<()> {
        self.runtime
            .block_on(self.conn.execute(sql))?
            .map_err(from_sqlx)?;
        Ok(())
    }

    fn set_cancellation(&mut self, token: Option<Cancellation>) {
        self.cancel = token;
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(Cancellation::is_cancelled)
    }
}

type PgQuery<'q> = sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>;

fn bind_all<'q>(mut query: PgQuery<'q>, args: &[Arg]) -> PgQuery<'q> {
    for arg in args {
        query = match arg {
            Arg::Text(s) => query.bind(s.clone()),
            Arg::Integer(i) => query.bind(*i),
            Arg::Uuid(u) => query.bind(*u),
            Arg::Date(d) => query.bind(*d),
        };
    }
    query
}

fn decode_row(row: &PgRow, columns: &[ColumnKind]) -> Result<Row> {
    if row.len() != columns.len() {
        return Err(decoding_error(
            "postgres_decode",
            format!(
                "statement returns {} columns, {} expected",
                row.len(),
                columns.len()
            ),
        ));
    }
    columns
        .iter()
        .enumerate()
        .map(|(i, kind)| decode(row, i, *kind))
        .collect()
}

fn decode(row: &PgRow, index: usize, kind: ColumnKind) -> Result<Value> {
    let value = match kind {
        ColumnKind::Uuid => row
            .try_get::<Option<Uuid>, _>(index)
            .map(|v| v.map(Value::Uuid)),
        ColumnKind::Text => row
            .try_get::<Option<String>, _>(index)
            .map(|v| v.map(Value::Text)),
        ColumnKind::Integer => row
            .try_get::<Option<i64>, _>(index)
            .map(|v| v.map(Value::Integer)),
        ColumnKind::Date => row
            .try_get::<Option<NaiveDate>, _>(index)
            .map(|v| v.map(Value::Date)),
        ColumnKind::Json => row
            .try_get::<Option<serde_json::Value>, _>(index)
            .map(|v| v.map(|json| Value::Json(json.to_string()))),
    };
    value
        .map(|v| v.unwrap_or(Value::Null))
        .map_err(|e| decoding_error("postgres_decode", format!("column {}: {}", index, e)))
}

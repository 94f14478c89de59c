//! SQLite executor (rusqlite)

use super::{Cancellation, Executor, Row, Value};
use crate::binder::Arg;
use crate::compiler::ColumnKind;
use crate::dialect::Dialect;
use crate::errors::{cancelled_error, decoding_error, from_rusqlite, Result};
use chrono::NaiveDate;
use libris_core::errors::LbErrorKind;
use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{params_from_iter, Connection, ToSql};
use std::path::Path;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// SQLite VM instructions between deadline checks
const PROGRESS_INTERVAL: i32 = 1_000;

/// Dates and ids are stored as text
impl ToSql for Arg {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Arg::Text(s) => ToSqlOutput::from(s.as_str()),
            Arg::Integer(i) => ToSqlOutput::from(*i),
            Arg::Uuid(u) => ToSqlOutput::from(u.to_string()),
            Arg::Date(d) => ToSqlOutput::from(d.format("%Y-%m-%d").to_string()),
        })
    }
}

/// A single SQLite connection
///
/// Every statement runs under `statement_timeout` when one is set; an
/// overrunning statement is interrupted and reported as a timeout. A
/// statement running when the attached `Cancellation` fires is interrupted
/// the same way and reported as cancelled.
pub struct SqliteExecutor {
    conn: Connection,
    statement_timeout: Option<Duration>,
    cancel: Option<Cancellation>,
}

/// Clears the progress handler when a statement finishes
struct Deadline<'c>(&'c Connection);

impl Drop for Deadline<'_> {
    fn drop(&mut self) {
        self.0.progress_handler(0, None::<fn() -> bool>);
    }
}

impl SqliteExecutor {
    /// Open `path`, or a private in-memory database for `:memory:`
    pub fn open<P: AsRef<Path>>(path: P, statement_timeout: Option<Duration>) -> Result<Self> {
        let path = path.as_ref();
        let conn = if path.as_os_str() == ":memory:" {
            Connection::open_in_memory()
        } else {
            Connection::open(path)
        }
        .map_err(from_rusqlite)?;
        Self::from_connection(conn, statement_timeout)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::open(":memory:", None)
    }

    /// Wrap and configure an existing connection
    pub fn from_connection(conn: Connection, statement_timeout: Option<Duration>) -> Result<Self> {
        configure(&conn, statement_timeout)?;
        Ok(Self {
            conn,
            statement_timeout,
            cancel: None,
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Interrupt the next statement once it overruns, or, with
    /// `watch_cancel`, once the caller cancels.
    fn arm_deadline(&self, watch_cancel: bool) -> Option<Deadline<'_>> {
        let deadline = self.statement_timeout.map(|t| Instant::now() + t);
        let cancel = self.cancel.clone().filter(|_| watch_cancel);
        if deadline.is_none() && cancel.is_none() {
            return None;
        }
        self.conn.progress_handler(
            PROGRESS_INTERVAL,
            Some(move || {
                deadline.is_some_and(|d| Instant::now() >= d)
                    || cancel.as_ref().is_some_and(Cancellation::is_cancelled)
            }),
        );
        Some(Deadline(&self.conn))
    }

    /// An interrupt caused by cancellation is not a timeout
    fn settle<T>(&self, result: Result<T>) -> Result<T> {
        match result {
            Err(err) if err.kind() == LbErrorKind::Timeout && self.is_cancelled() => {
                Err(cancelled_error("sqlite").with_source(err))
            }
            other => other,
        }
    }

    fn fetch_rows(&self, sql: &str, args: &[Arg], columns: &[ColumnKind]) -> Result<Vec<Row>> {
        let _deadline = self.arm_deadline(true);
        let mut stmt = self.conn.prepare(sql).map_err(from_rusqlite)?;
        if stmt.column_count() != columns.len() {
            return Err(decoding_error(
                "sqlite_fetch",
                format!(
                    "statement returns {} columns, {} expected",
                    stmt.column_count(),
                    columns.len()
                ),
            ));
        }

        let mut rows = stmt.query(params_from_iter(args)).map_err(from_rusqlite)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(from_rusqlite)? {
            let decoded = columns
                .iter()
                .enumerate()
                .map(|(i, kind)| decode(row.get_ref(i).map_err(from_rusqlite)?, *kind, i))
                .collect::<Result<Row>>()?;
            out.push(decoded);
        }
        Ok(out)
    }

    fn run_statement(&self, sql: &str, args: &[Arg]) -> Result<u64> {
        let _deadline = self.arm_deadline(true);
        let mut stmt = self.conn.prepare(sql).map_err(from_rusqlite)?;
        let affected = stmt.execute(params_from_iter(args)).map_err(from_rusqlite)?;
        Ok(affected as u64)
    }
}

/// Pragmas every connection needs: enforced foreign keys, WAL, and a busy
/// timeout so concurrent writers wait for the lock instead of failing.
pub fn configure(conn: &Connection, busy_timeout: Option<Duration>) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(from_rusqlite)?;
    conn.execute_batch("PRAGMA journal_mode = WAL;")
        .map_err(from_rusqlite)?;
    conn.busy_timeout(busy_timeout.unwrap_or(Duration::from_secs(5)))
        .map_err(from_rusqlite)?;
    Ok(())
}

impl Executor for SqliteExecutor {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn fetch(&mut self, sql: &str, args: &[Arg], columns: &[ColumnKind]) -> Result<Vec<Row>> {
        let result = self.fetch_rows(sql, args, columns);
        self.settle(result)
    }

    fn run(&mut self, sql: &str, args: &[Arg]) -> Result<u64> {
        let result = self.run_statement(sql, args);
        self.settle(result)
    }

    /// Migrations and transaction control; never interrupted by
    /// cancellation so a rollback always gets to run.
    fn batch(&mut self, sql: &str) -> Result<()> {
        let _deadline = self.arm_deadline(false);
        self.conn.execute_batch(sql).map_err(from_rusqlite)
    }

    fn set_cancellation(&mut self, token: Option<Cancellation>) {
        self.cancel = token;
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(Cancellation::is_cancelled)
    }

    /// SQLite rolls a transaction back by itself when some statements are
    /// interrupted or fail
    fn in_open_transaction(&self) -> bool {
        !self.conn.is_autocommit()
    }
}

fn text(raw: &[u8], index: usize) -> Result<&str> {
    std::str::from_utf8(raw)
        .map_err(|e| decoding_error("sqlite_decode", format!("column {}: {}", index, e)))
}

fn decode(value: ValueRef<'_>, kind: ColumnKind, index: usize) -> Result<Value> {
    const OP: &str = "sqlite_decode";
    match (kind, value) {
        (_, ValueRef::Null) => Ok(Value::Null),
        (ColumnKind::Integer, ValueRef::Integer(i)) => Ok(Value::Integer(i)),
        (ColumnKind::Text, ValueRef::Text(raw)) => Ok(Value::Text(text(raw, index)?.to_string())),
        (ColumnKind::Json, ValueRef::Text(raw)) => Ok(Value::Json(text(raw, index)?.to_string())),
        (ColumnKind::Uuid, ValueRef::Text(raw)) => Uuid::parse_str(text(raw, index)?)
            .map(Value::Uuid)
            .map_err(|e| decoding_error(OP, format!("column {}: {}", index, e))),
        (ColumnKind::Uuid, ValueRef::Blob(raw)) => Uuid::from_slice(raw)
            .map(Value::Uuid)
            .map_err(|e| decoding_error(OP, format!("column {}: {}", index, e))),
        (ColumnKind::Date, ValueRef::Text(raw)) => {
            NaiveDate::parse_from_str(text(raw, index)?, "%Y-%m-%d")
                .map(Value::Date)
                .map_err(|e| decoding_error(OP, format!("column {}: {}", index, e)))
        }
        (kind, other) => Err(decoding_error(
            OP,
            format!(
                "column {}: cannot decode {:?} as {:?}",
                index,
                other.data_type(),
                kind
            ),
        )),
    }
}

//! Statement execution
//!
//! `Executor` is the seam between compiled statements and a live backend
//! connection. Backends implement the raw calls; statement logging and
//! transaction control are shared.

#![allow(clippy::result_large_err)]

mod sqlite;

#[cfg(feature = "postgres")]
mod postgres;

pub use sqlite::SqliteExecutor;

#[cfg(feature = "postgres")]
pub use postgres::PgExecutor;

use crate::binder::Arg;
use crate::compiler::{ColumnKind, CompiledQuery};
use crate::dialect::{Dialect, TxMode};
use crate::errors::{cancelled_error, transaction_error, Result};
use chrono::NaiveDate;
use libris_core::errors::LbError;
use libris_core_types::schema::{EVENT_STATEMENT, EVENT_STATEMENT_ERROR};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Flag shared between a request and the connection serving it
///
/// Once cancelled, no further statement starts on the executor, a running
/// SQLite statement is interrupted, and an open transaction is rolled back
/// instead of committed.
#[derive(Debug, Clone, Default)]
pub struct Cancellation(Arc<AtomicBool>);

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A decoded column value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Null,
    Integer(i64),
    Text(String),
    Uuid(Uuid),
    Date(NaiveDate),
    /// JSON document as text
    Json(String),
}

/// One result row, columns in statement order
pub type Row = Vec<Value>;

/// A connection able to run compiled statements
pub trait Executor {
    fn dialect(&self) -> Dialect;

    /// Run a row-returning statement, decoding each column as `columns` says.
    fn fetch(&mut self, sql: &str, args: &[Arg], columns: &[ColumnKind]) -> Result<Vec<Row>>;

    /// Run a statement for its effect; returns affected rows.
    fn run(&mut self, sql: &str, args: &[Arg]) -> Result<u64>;

    /// Run one or more unparameterised statements.
    fn batch(&mut self, sql: &str) -> Result<()>;

    /// Watch `token` while serving one request; `None` detaches it.
    fn set_cancellation(&mut self, _token: Option<Cancellation>) {}

    fn is_cancelled(&self) -> bool {
        false
    }

    /// Whether a transaction is still open on this connection
    fn in_open_transaction(&self) -> bool {
        true
    }

    /// Run a compiled row-returning statement, with statement logging
    fn query(&mut self, stmt: &CompiledQuery, args: &[Arg]) -> Result<Vec<Row>> {
        let start = Instant::now();
        let result = if self.is_cancelled() {
            Err(cancelled_error(stmt.name))
        } else {
            self.fetch(&stmt.sql, args, &stmt.columns)
        };
        let rows = result.as_ref().map(|r| r.len() as u64);
        log_statement(self.dialect(), stmt.name, &stmt.sql, args, start, rows);
        result
    }

    /// Run a compiled statement for its effect, with statement logging
    fn execute(&mut self, stmt: &CompiledQuery, args: &[Arg]) -> Result<u64> {
        let start = Instant::now();
        let result = if self.is_cancelled() {
            Err(cancelled_error(stmt.name))
        } else {
            self.run(&stmt.sql, args)
        };
        let rows = result.as_ref().map(|n| *n);
        log_statement(self.dialect(), stmt.name, &stmt.sql, args, start, rows);
        result
    }

    fn begin(&mut self, mode: TxMode) -> Result<()> {
        let sql = self.dialect().begin(mode);
        control(self, "begin", sql)
    }

    fn commit(&mut self) -> Result<()> {
        control(self, "commit", "COMMIT")
    }

    fn rollback(&mut self) -> Result<()> {
        control(self, "rollback", "ROLLBACK")
    }
}

impl<E: Executor + ?Sized> Executor for Box<E> {
    fn dialect(&self) -> Dialect {
        (**self).dialect()
    }

    fn fetch(&mut self, sql: &str, args: &[Arg], columns: &[ColumnKind]) -> Result<Vec<Row>> {
        (**self).fetch(sql, args, columns)
    }

    fn run(&mut self, sql: &str, args: &[Arg]) -> Result<u64> {
        (**self).run(sql, args)
    }

    fn batch(&mut self, sql: &str) -> Result<()> {
        (**self).batch(sql)
    }

    fn set_cancellation(&mut self, token: Option<Cancellation>) {
        (**self).set_cancellation(token)
    }

    fn is_cancelled(&self) -> bool {
        (**self).is_cancelled()
    }

    fn in_open_transaction(&self) -> bool {
        (**self).in_open_transaction()
    }
}

fn control<E: Executor + ?Sized>(exec: &mut E, name: &'static str, sql: &str) -> Result<()> {
    let start = Instant::now();
    let result = exec
        .batch(sql)
        .map_err(|e| transaction_error(name, e));
    let rows = result.as_ref().map(|_| 0);
    log_statement(exec.dialect(), name, sql, &[], start, rows);
    result
}

/// Collapse runs of whitespace so multi-line SQL logs on one line
fn single_line(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn log_statement(
    dialect: Dialect,
    name: &str,
    sql: &str,
    args: &[Arg],
    start: Instant,
    outcome: std::result::Result<u64, &LbError>,
) {
    let duration_ms = start.elapsed().as_millis() as u64;
    match outcome {
        Ok(rows) => tracing::debug!(
            component = module_path!(),
            op = name,
            event = EVENT_STATEMENT,
            dialect = dialect.tag(),
            sql = %single_line(sql),
            args = ?args,
            duration_ms,
            rows,
        ),
        Err(err) => tracing::error!(
            component = module_path!(),
            op = name,
            event = EVENT_STATEMENT_ERROR,
            dialect = dialect.tag(),
            sql = %single_line(sql),
            args = ?args,
            duration_ms,
            err.code = err.code(),
            error = %err,
        ),
    }
}

/// Run `f` inside a transaction
///
/// Commits when `f` succeeds and the caller has not cancelled. Otherwise
/// the transaction is rolled back and the original error returned; if the
/// rollback fails too, both errors are reported together. A transaction
/// the backend already aborted is not rolled back a second time.
///
/// # Errors
/// `Transaction` when the transaction cannot be started or finished,
/// `Cancelled` when the caller gave up before commit, otherwise whatever
/// `f` returns.
pub fn in_transaction<E, T, F>(exec: &mut E, mode: TxMode, op: &str, f: F) -> Result<T>
where
    E: Executor + ?Sized,
    F: FnOnce(&mut E) -> Result<T>,
{
    exec.begin(mode)?;

    let value = match f(exec) {
        Ok(value) => value,
        Err(err) => return abort(exec, op, err),
    };
    if exec.is_cancelled() {
        return abort(exec, op, cancelled_error(op));
    }
    match exec.commit() {
        Ok(()) => Ok(value),
        Err(commit_err) => abort(exec, op, commit_err.with_op(op.to_string())),
    }
}

fn abort<E, T>(exec: &mut E, op: &str, err: LbError) -> Result<T>
where
    E: Executor + ?Sized,
{
    if !exec.in_open_transaction() {
        return Err(err);
    }
    match exec.rollback() {
        Ok(()) => Err(err),
        Err(rb) => Err(LbError::rollback_failed(op, err, rb)),
    }
}

//! Migration runner
//!
//! Applies migrations with checksums and idempotency

#![allow(clippy::result_large_err)]

use crate::binder::Arg;
use crate::compiler::{ColumnKind, CompiledQuery};
use crate::dialect::{Dialect, TxMode};
use crate::errors::{checksum_mismatch, migration_error, Result};
use crate::exec::{in_transaction, Executor, Value};
use crate::migrations::checksums::compute_checksum;
use crate::migrations::embedded::get_migrations;

const CREATE_SCHEMA_VERSION: &str = "CREATE TABLE IF NOT EXISTS schema_version (
    migration_id TEXT PRIMARY KEY,
    applied_at BIGINT NOT NULL,
    checksum TEXT NOT NULL
)";

fn statement(
    name: &'static str,
    dialect: Dialect,
    sql: String,
    columns: Vec<ColumnKind>,
) -> CompiledQuery {
    CompiledQuery {
        name,
        dialect,
        sql,
        slots: Vec::new(),
        columns,
    }
}

fn placeholder(dialect: Dialect, n: usize) -> String {
    match dialect {
        Dialect::Postgres => format!("${}", n),
        Dialect::Sqlite => "?".to_string(),
    }
}

/// Apply all pending migrations; returns how many were applied
///
/// # Errors
/// A failing migration, or a recorded checksum that differs from the
/// embedded SQL.
pub fn apply_migrations<E: Executor + ?Sized>(exec: &mut E) -> Result<usize> {
    exec.batch(CREATE_SCHEMA_VERSION)?;

    let mut applied = 0;
    for migration in get_migrations(exec.dialect()) {
        if apply_migration(exec, migration.id, migration.sql)? {
            applied += 1;
        }
    }

    tracing::info!(
        component = module_path!(),
        op = "apply_migrations",
        dialect = exec.dialect().tag(),
        applied,
        "schema up to date"
    );
    Ok(applied)
}

/// Ids of migrations already recorded, in id order
pub fn applied_migrations<E: Executor + ?Sized>(exec: &mut E) -> Result<Vec<String>> {
    let select = statement(
        "applied_migrations",
        exec.dialect(),
        "SELECT migration_id FROM schema_version ORDER BY migration_id".to_string(),
        vec![ColumnKind::Text],
    );
    exec.query(&select, &[])?
        .into_iter()
        .map(|row| match row.into_iter().next() {
            Some(Value::Text(id)) => Ok(id),
            other => Err(migration_error(
                "schema_version",
                &format!("unexpected row {:?}", other),
            )),
        })
        .collect()
}

fn recorded_checksum<E: Executor + ?Sized>(
    exec: &mut E,
    migration_id: &str,
) -> Result<Option<String>> {
    let dialect = exec.dialect();
    let id = placeholder(dialect, 1);
    let select = statement(
        "recorded_checksum",
        dialect,
        format!("SELECT checksum FROM schema_version WHERE migration_id = {id}"),
        vec![ColumnKind::Text],
    );
    let rows = exec.query(&select, &[Arg::Text(migration_id.to_string())])?;
    Ok(rows.into_iter().next().and_then(|row| match row.into_iter().next() {
        Some(Value::Text(checksum)) => Some(checksum),
        _ => None,
    }))
}

/// Apply a single migration unless already applied; `true` if it ran
fn apply_migration<E: Executor + ?Sized>(
    exec: &mut E,
    migration_id: &str,
    sql: &str,
) -> Result<bool> {
    let checksum = compute_checksum(sql);

    if let Some(recorded) = recorded_checksum(exec, migration_id)? {
        if recorded != checksum {
            return Err(checksum_mismatch(migration_id, &recorded, &checksum));
        }
        return Ok(false);
    }

    let dialect = exec.dialect();
    let record = statement(
        "record_migration",
        dialect,
        format!(
            "INSERT INTO schema_version (migration_id, applied_at, checksum) VALUES ({})",
            (1..=3)
                .map(|n| placeholder(dialect, n))
                .collect::<Vec<_>>()
                .join(", ")
        ),
        Vec::new(),
    );

    in_transaction(exec, TxMode::Write, "apply_migration", |exec| {
        exec.batch(sql)
            .map_err(|e| migration_error(migration_id, e.message()))?;
        exec.execute(
            &record,
            &[
                Arg::Text(migration_id.to_string()),
                Arg::Integer(chrono::Utc::now().timestamp()),
                Arg::Text(checksum.clone()),
            ],
        )?;
        Ok(())
    })?;

    Ok(true)
}

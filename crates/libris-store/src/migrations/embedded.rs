//! Embedded SQL migrations
//!
//! Migrations are embedded at compile time using include_str!, one set per
//! dialect with matching ids.

use crate::dialect::Dialect;

/// Migration metadata
pub struct Migration {
    pub id: &'static str,
    pub sql: &'static str,
}

const SQLITE: &[Migration] = &[Migration {
    id: "001_catalog_schema",
    sql: include_str!("../../migrations/sqlite/001_catalog_schema.sql"),
}];

const POSTGRES: &[Migration] = &[Migration {
    id: "001_catalog_schema",
    sql: include_str!("../../migrations/postgres/001_catalog_schema.sql"),
}];

/// All migrations for `dialect`, in order
pub fn get_migrations(dialect: Dialect) -> &'static [Migration] {
    match dialect {
        Dialect::Sqlite => SQLITE,
        Dialect::Postgres => POSTGRES,
    }
}

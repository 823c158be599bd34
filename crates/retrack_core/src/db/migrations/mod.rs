//! SQLite migration registry and executor.
//!
//! Schema steps for the key-value table.
//!
//! # Invariants
//! - `MIGRATIONS` is sorted by strictly increasing `version`.
//! - The last applied step is recorded in `PRAGMA user_version`.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: include_str!("0001_kv_entries.sql"),
}];

/// Returns the latest migration version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Brings the schema up to `latest_version()` inside one transaction.
///
/// A database written by a newer binary is left untouched and rejected.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let from = current_user_version(conn)?;
    let to = latest_version();
    match from.cmp(&to) {
        Ordering::Greater => {
            return Err(DbError::UnsupportedSchemaVersion {
                db_version: from,
                latest_supported: to,
            })
        }
        Ordering::Equal => return Ok(()),
        Ordering::Less => {}
    }

    let tx = conn.transaction()?;
    for migration in MIGRATIONS.iter().skip_while(|m| m.version <= from) {
        tx.execute_batch(migration.sql)?;
        tx.pragma_update(None, "user_version", migration.version)?;
    }
    tx.commit()?;

    info!("event=db_migrate module=db status=ok from={from} to={to}");
    Ok(())
}

fn current_user_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}

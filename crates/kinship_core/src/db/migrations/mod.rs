//! Schema migration registry and executor.
//!
//! # Invariants
//! - Migration versions are strictly increasing and the applied version
//!   is mirrored to `PRAGMA user_version`.
//! - Each pending migration runs inside the same transaction; a failed
//!   step leaves the file at its previous version.

use crate::db::{DbError, DbResult};
use log::debug;
use rusqlite::Connection;

struct Migration {
    version: u32,
    sql: &'static str,
}

// The schema is currently a single version; the registry stays so a
// future revision can slot in behind it.
const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: include_str!("0001_init.sql"),
}];

/// Latest schema version this build knows how to produce.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Brings the connection's schema up to [`latest_version`].
///
/// Rejects files whose recorded version is newer than this build
/// rather than guessing at a forward-compatible read.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let applied = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    let latest = latest_version();

    if applied > latest {
        return Err(DbError::SchemaTooNew {
            found: applied,
            supported: latest,
        });
    }
    if applied == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in MIGRATIONS.iter().filter(|m| m.version > applied) {
        tx.execute_batch(migration.sql)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
        debug!(
            "event=db_migrate module=db status=ok version={}",
            migration.version
        );
    }
    tx.commit()?;

    Ok(())
}

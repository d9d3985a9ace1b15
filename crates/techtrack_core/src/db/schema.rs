//! Ordered schema steps for the slot database.
//!
//! # Invariants
//! - `SCHEMA_STEPS[n]` moves a file from version `n` to `n + 1`.
//! - Each step and its `user_version` bump commit together, so a crash never
//!   leaves a half-applied version behind.

use super::{OpenError, OpenResult};
use log::{debug, info};
use rusqlite::Connection;

const SCHEMA_STEPS: &[&str] = &[include_str!("sql/0001_storage_slots.sql")];

/// Highest schema version this build can produce and read.
pub fn latest_schema_version() -> u32 {
    SCHEMA_STEPS.len() as u32
}

/// Version recorded in the file's `PRAGMA user_version`.
pub fn schema_version(conn: &Connection) -> rusqlite::Result<u32> {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
}

/// Runs every step the file has not seen yet and returns the final version.
pub(crate) fn upgrade_schema(conn: &mut Connection) -> OpenResult<u32> {
    let found = schema_version(conn)?;
    let supported = latest_schema_version();
    let Some(pending) = SCHEMA_STEPS.get(found as usize..) else {
        return Err(OpenError::SchemaTooNew { found, supported });
    };
    if pending.is_empty() {
        return Ok(found);
    }

    let tx = conn.transaction()?;
    for (target, sql) in (found + 1..).zip(pending) {
        tx.execute_batch(sql)?;
        tx.pragma_update(None, "user_version", target)?;
        debug!("event=schema_step module=db status=ok version={}", target);
    }
    tx.commit()?;

    info!(
        "event=schema_upgrade module=db status=ok from_version={} to_version={}",
        found, supported
    );
    Ok(supported)
}

//! Slot repository contracts with SQLite and in-memory implementations.
//!
//! # Responsibility
//! - Read, overwrite and clear named durable slots.
//! - Report storage failures as typed errors, never panics.
//!
//! # Invariants
//! - Keys are non-empty.
//! - `write_slot` is an upsert: a later `read_slot` returns the new value.

use rusqlite::{params, Connection, OptionalExtension};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Slot storage error.
#[derive(Debug)]
pub enum RepoError {
    Sqlite(rusqlite::Error),
    InvalidKey(String),
    /// Storage refused the write (quota, read-only medium, ...).
    Unavailable(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "slot query failed: {err}"),
            Self::InvalidKey(key) => write!(f, "invalid slot key: `{key}`"),
            Self::Unavailable(reason) => write!(f, "slot storage unavailable: {reason}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::InvalidKey(_) | Self::Unavailable(_) => None,
        }
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Named durable key/value slots.
pub trait SlotRepository {
    /// Returns the slot value, or `None` when the slot was never written.
    fn read_slot(&self, key: &str) -> RepoResult<Option<String>>;
    /// Overwrites the slot with `value`.
    fn write_slot(&self, key: &str, value: &str) -> RepoResult<()>;
    /// Removes the slot. Clearing a missing slot is not an error.
    fn clear_slot(&self, key: &str) -> RepoResult<()>;
}

impl<T: SlotRepository + ?Sized> SlotRepository for &T {
    fn read_slot(&self, key: &str) -> RepoResult<Option<String>> {
        (**self).read_slot(key)
    }

    fn write_slot(&self, key: &str, value: &str) -> RepoResult<()> {
        (**self).write_slot(key, value)
    }

    fn clear_slot(&self, key: &str) -> RepoResult<()> {
        (**self).clear_slot(key)
    }
}

/// SQLite-backed slot repository over a migrated connection.
pub struct SqliteSlotRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSlotRepository<'conn> {
    /// Constructs a repository from a connection returned by `open_db*`.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl SlotRepository for SqliteSlotRepository<'_> {
    fn read_slot(&self, key: &str) -> RepoResult<Option<String>> {
        ensure_valid_key(key)?;
        let value = self
            .conn
            .query_row(
                "SELECT value FROM storage_slots WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn write_slot(&self, key: &str, value: &str) -> RepoResult<()> {
        ensure_valid_key(key)?;
        self.conn.execute(
            "INSERT INTO storage_slots (key, value, updated_at)
             VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value],
        )?;
        Ok(())
    }

    fn clear_slot(&self, key: &str) -> RepoResult<()> {
        ensure_valid_key(key)?;
        self.conn
            .execute("DELETE FROM storage_slots WHERE key = ?1;", [key])?;
        Ok(())
    }
}

/// Process-local slot repository.
///
/// Holds nothing across process restarts. `set_read_only(true)` makes every
/// write fail, which mirrors a storage quota being exhausted.
#[derive(Debug, Default)]
pub struct InMemorySlotRepository {
    slots: RefCell<BTreeMap<String, String>>,
    read_only: Cell<bool>,
}

impl InMemorySlotRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.set(read_only);
    }

    fn ensure_writable(&self) -> RepoResult<()> {
        if self.read_only.get() {
            return Err(RepoError::Unavailable("storage is read-only".to_string()));
        }
        Ok(())
    }
}

impl SlotRepository for InMemorySlotRepository {
    fn read_slot(&self, key: &str) -> RepoResult<Option<String>> {
        ensure_valid_key(key)?;
        Ok(self.slots.borrow().get(key).cloned())
    }

    fn write_slot(&self, key: &str, value: &str) -> RepoResult<()> {
        ensure_valid_key(key)?;
        self.ensure_writable()?;
        self.slots
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear_slot(&self, key: &str) -> RepoResult<()> {
        ensure_valid_key(key)?;
        self.ensure_writable()?;
        self.slots.borrow_mut().remove(key);
        Ok(())
    }
}

fn ensure_valid_key(key: &str) -> RepoResult<()> {
    if key.trim().is_empty() {
        return Err(RepoError::InvalidKey(key.to_string()));
    }
    Ok(())
}

//! SQLite connection layer under the slot repositories.
//!
//! # Responsibility
//! - Hand out connections whose schema is ready for `storage_slots`.
//! - Report failures that happen before any slot can be touched.
//!
//! # Invariants
//! - A connection returned by `open_db*` is at `latest_schema_version()`.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod open;
pub mod schema;

pub use open::{open_db, open_db_in_memory};
pub use schema::{latest_schema_version, schema_version};

pub type OpenResult<T> = Result<T, OpenError>;

/// Failure while connecting to or upgrading the slot database.
#[derive(Debug)]
pub enum OpenError {
    /// SQLite refused the connection, a pragma, or a schema step.
    Sqlite(rusqlite::Error),
    /// The file was written by a newer build. Its schema is left as found.
    SchemaTooNew { found: u32, supported: u32 },
}

impl OpenError {
    /// Stable code used in `db_open` log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Sqlite(_) => "db_sqlite_failed",
            Self::SchemaTooNew { .. } => "db_schema_too_new",
        }
    }
}

impl Display for OpenError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite: {err}"),
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "database schema v{found} needs a newer techtrack (this build reads up to v{supported})"
            ),
        }
    }
}

impl Error for OpenError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::SchemaTooNew { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for OpenError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

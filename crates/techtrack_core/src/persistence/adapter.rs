//! Load/save adapter between the store and one durable slot.
//!
//! # Responsibility
//! - Read the technologies slot and turn it into a valid collection.
//! - Overwrite the slot with the full collection on save.
//! - Emit metadata-only `snapshot_load` / `snapshot_save` events.
//!
//! # Invariants
//! - `load` always returns a usable collection.
//! - After a successful `save`, `load` returns the same collection.

use crate::model::technology::Technology;
use crate::persistence::seed::seed_technologies;
use crate::persistence::snapshot::{decode_snapshot, encode_snapshot};
use crate::repo::slot_repo::{RepoError, SlotRepository};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Durable slot key holding the technology snapshot.
pub const TECHNOLOGIES_SLOT_KEY: &str = "technologies";

/// Non-fatal failure to persist a snapshot.
///
/// In-memory state stays authoritative when this is reported.
#[derive(Debug)]
pub enum PersistenceWarning {
    Encode(serde_json::Error),
    Storage(RepoError),
}

impl Display for PersistenceWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Encode(err) => write!(f, "failed to encode snapshot: {err}"),
            Self::Storage(err) => write!(f, "failed to write snapshot: {err}"),
        }
    }
}

impl Error for PersistenceWarning {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Encode(err) => Some(err),
            Self::Storage(err) => Some(err),
        }
    }
}

impl From<RepoError> for PersistenceWarning {
    fn from(value: RepoError) -> Self {
        Self::Storage(value)
    }
}

/// Where a loaded collection came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadSource {
    /// Decoded from the slot.
    Stored,
    /// Slot was empty; seed collection used.
    Seeded,
    /// Slot content could not be decoded; seed collection used.
    RecoveredFromCorruption { reason: String },
    /// Slot could not be read; seed collection used.
    StorageUnavailable { reason: String },
}

/// Result of loading the collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOutcome {
    pub technologies: Vec<Technology>,
    pub source: LoadSource,
    /// Stored records migrated or discarded while decoding.
    pub repaired_records: usize,
}

impl LoadOutcome {
    fn seeded(source: LoadSource) -> Self {
        Self {
            technologies: seed_technologies(),
            source,
            repaired_records: 0,
        }
    }
}

/// Persistence contract consumed by the technology store.
pub trait TechnologyPersistence {
    /// Loads the collection; never fails.
    fn load(&self) -> LoadOutcome;
    /// Persists the full collection.
    fn save(&self, technologies: &[Technology]) -> Result<(), PersistenceWarning>;
}

/// Snapshot persistence over a named slot.
pub struct SnapshotPersistence<S: SlotRepository> {
    slots: S,
    key: String,
}

impl<S: SlotRepository> SnapshotPersistence<S> {
    /// Uses the default `technologies` slot.
    pub fn new(slots: S) -> Self {
        Self::with_key(slots, TECHNOLOGIES_SLOT_KEY)
    }

    pub fn with_key(slots: S, key: impl Into<String>) -> Self {
        Self {
            slots,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        self.key.as_str()
    }

    /// Underlying slot repository, e.g. for reading sibling slots.
    pub fn slots(&self) -> &S {
        &self.slots
    }
}

impl<S: SlotRepository> TechnologyPersistence for SnapshotPersistence<S> {
    fn load(&self) -> LoadOutcome {
        let started_at = Instant::now();
        let raw = match self.slots.read_slot(self.key.as_str()) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(
                    "event=snapshot_load module=persistence status=error error_code=slot_read_failed fallback=seed error={}",
                    err
                );
                return LoadOutcome::seeded(LoadSource::StorageUnavailable {
                    reason: err.to_string(),
                });
            }
        };

        let Some(raw) = raw else {
            info!(
                "event=snapshot_load module=persistence status=ok source=seed duration_ms={}",
                started_at.elapsed().as_millis()
            );
            return LoadOutcome::seeded(LoadSource::Seeded);
        };

        match decode_snapshot(raw.as_str()) {
            Ok(decoded) => {
                info!(
                    "event=snapshot_load module=persistence status=ok source=slot count={} repaired={} duration_ms={}",
                    decoded.technologies.len(),
                    decoded.repaired_records,
                    started_at.elapsed().as_millis()
                );
                LoadOutcome {
                    technologies: decoded.technologies,
                    source: LoadSource::Stored,
                    repaired_records: decoded.repaired_records,
                }
            }
            Err(err) => {
                warn!(
                    "event=snapshot_load module=persistence status=error error_code=snapshot_corrupt fallback=seed bytes={} error={}",
                    raw.len(),
                    err
                );
                LoadOutcome::seeded(LoadSource::RecoveredFromCorruption {
                    reason: err.to_string(),
                })
            }
        }
    }

    fn save(&self, technologies: &[Technology]) -> Result<(), PersistenceWarning> {
        let started_at = Instant::now();
        let encoded = encode_snapshot(technologies).map_err(PersistenceWarning::Encode)?;
        match self.slots.write_slot(self.key.as_str(), encoded.as_str()) {
            Ok(()) => {
                info!(
                    "event=snapshot_save module=persistence status=ok count={} bytes={} duration_ms={}",
                    technologies.len(),
                    encoded.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                warn!(
                    "event=snapshot_save module=persistence status=error error_code=slot_write_failed count={} error={}",
                    technologies.len(),
                    err
                );
                Err(err.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{LoadSource, SnapshotPersistence, TechnologyPersistence, TECHNOLOGIES_SLOT_KEY};
    use crate::model::technology::Technology;
    use crate::persistence::seed::seed_technologies;
    use crate::repo::slot_repo::{InMemorySlotRepository, SlotRepository};

    #[test]
    fn empty_slot_loads_seed() {
        let persistence = SnapshotPersistence::new(InMemorySlotRepository::new());
        let outcome = persistence.load();
        assert_eq!(outcome.source, LoadSource::Seeded);
        assert_eq!(outcome.technologies, seed_technologies());
    }

    #[test]
    fn corrupt_slot_falls_back_to_seed() {
        let slots = InMemorySlotRepository::new();
        slots.write_slot(TECHNOLOGIES_SLOT_KEY, "[{oops").unwrap();
        let persistence = SnapshotPersistence::new(&slots);

        let outcome = persistence.load();
        assert!(matches!(
            outcome.source,
            LoadSource::RecoveredFromCorruption { .. }
        ));
        assert_eq!(outcome.technologies, seed_technologies());
    }

    #[test]
    fn save_then_load_returns_saved_collection() {
        let persistence = SnapshotPersistence::new(InMemorySlotRepository::new());
        let saved = vec![Technology::new("Kotlin")];
        persistence.save(&saved).unwrap();

        let outcome = persistence.load();
        assert_eq!(outcome.source, LoadSource::Stored);
        assert_eq!(outcome.technologies, saved);
    }

    #[test]
    fn save_to_read_only_storage_reports_warning() {
        let slots = InMemorySlotRepository::new();
        slots.set_read_only(true);
        let persistence = SnapshotPersistence::new(&slots);

        assert!(persistence.save(&seed_technologies()).is_err());
    }
}

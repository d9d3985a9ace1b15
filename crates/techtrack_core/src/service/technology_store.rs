//! Technology store: the canonical in-memory collection.
//!
//! # Responsibility
//! - Own the tracked technology collection for the process lifetime.
//! - Validate and apply every single-record and bulk mutation.
//! - Persist the full snapshot after each applied mutation.
//! - Notify subscribers synchronously after persistence.
//!
//! # Invariants
//! - Ids are unique; statuses are enum members; deadlines are valid.
//! - A rejected mutation leaves the collection and `version` untouched.
//! - A bulk update is applied fully in memory before its single save, so no
//!   observer ever sees a partial batch.
//! - Persistence failures never roll back memory; the store is marked dirty
//!   and `flush` retries.

use crate::access::guard::{assert_access, AccessDenied, AccessGuard, AllowAll, GatedOperation};
use crate::export::{export_snapshot, ExportDocument};
use crate::model::technology::{
    Resource, Technology, TechnologyId, TechnologyStatus, TechnologyValidationError,
};
use crate::persistence::adapter::{LoadSource, PersistenceWarning, TechnologyPersistence};
use crate::service::progress::ProgressSummary;
use crate::validation::{parse_deadline, parse_status, DeadlineError, StatusError};
use chrono::NaiveDate;
use log::{debug, info, warn};
use rand::Rng;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store operation errors. None of them leave partial state behind.
#[derive(Debug)]
pub enum StoreError {
    NotFound(TechnologyId),
    InvalidStatus(StatusError),
    /// Deadline input rejected; `retained` is the committed value callers
    /// should restore into their input buffer.
    InvalidDeadline {
        id: TechnologyId,
        error: DeadlineError,
        retained: Option<NaiveDate>,
    },
    InvalidTechnology(TechnologyValidationError),
    Unauthorized(AccessDenied),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "technology not found: {id}"),
            Self::InvalidStatus(err) => write!(f, "{err}"),
            Self::InvalidDeadline { error, .. } => write!(f, "{error}"),
            Self::InvalidTechnology(err) => write!(f, "{err}"),
            Self::Unauthorized(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotFound(_) => None,
            Self::InvalidStatus(err) => Some(err),
            Self::InvalidDeadline { error, .. } => Some(error),
            Self::InvalidTechnology(err) => Some(err),
            Self::Unauthorized(err) => Some(err),
        }
    }
}

impl From<StatusError> for StoreError {
    fn from(value: StatusError) -> Self {
        Self::InvalidStatus(value)
    }
}

impl From<TechnologyValidationError> for StoreError {
    fn from(value: TechnologyValidationError) -> Self {
        Self::InvalidTechnology(value)
    }
}

impl From<AccessDenied> for StoreError {
    fn from(value: AccessDenied) -> Self {
        Self::Unauthorized(value)
    }
}

/// Result of an accepted single-record mutation.
#[derive(Debug)]
pub struct Mutation {
    /// Collection version after the call.
    pub version: u64,
    /// `false` when the new value equalled the stored one; nothing was saved.
    pub changed: bool,
    /// Set when the snapshot could not be persisted.
    pub warning: Option<PersistenceWarning>,
}

/// Result of a bulk status update.
#[derive(Debug)]
pub struct BulkOutcome {
    /// Records found and set to the target status.
    pub updated: usize,
    /// Records whose status actually differed before the update.
    pub changed: usize,
    /// Requested ids that are not in the collection.
    pub skipped: Vec<TechnologyId>,
    pub version: u64,
    pub warning: Option<PersistenceWarning>,
}

/// What a store event describes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeKind {
    Added(TechnologyId),
    Removed(TechnologyId),
    StatusUpdated {
        id: TechnologyId,
        status: TechnologyStatus,
    },
    NotesUpdated(TechnologyId),
    DeadlineUpdated {
        id: TechnologyId,
        deadline: Option<NaiveDate>,
    },
    BulkStatusUpdated {
        ids: Vec<TechnologyId>,
        status: TechnologyStatus,
    },
}

/// Notification delivered to subscribers after each applied mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEvent {
    pub version: u64,
    pub change: ChangeKind,
    /// Whether the snapshot write for this version succeeded.
    pub persisted: bool,
}

/// Handle returned by `subscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Observer = Box<dyn FnMut(&StoreEvent, &[Technology])>;

/// Input for creating a technology.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTechnology {
    pub title: String,
    pub description: Option<String>,
    /// Deadline text, validated like `update_deadline`. Empty means none.
    pub deadline: String,
    pub resources: Vec<Resource>,
}

impl NewTechnology {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn deadline(mut self, deadline: impl Into<String>) -> Self {
        self.deadline = deadline.into();
        self
    }

    pub fn resource(mut self, title: impl Into<String>, url: impl Into<String>) -> Self {
        self.resources.push(Resource::new(title, url));
        self
    }
}

/// Single-writer store over the technology collection.
pub struct TechnologyStore<P: TechnologyPersistence, G: AccessGuard = AllowAll> {
    technologies: Vec<Technology>,
    persistence: P,
    guard: G,
    load_source: LoadSource,
    version: u64,
    dirty: bool,
    observers: Vec<(SubscriptionId, Observer)>,
    next_subscription: u64,
}

impl<P: TechnologyPersistence> TechnologyStore<P, AllowAll> {
    /// Loads the collection with an allow-all access guard.
    pub fn open(persistence: P) -> Self {
        Self::with_guard(persistence, AllowAll)
    }
}

impl<P: TechnologyPersistence, G: AccessGuard> TechnologyStore<P, G> {
    /// Loads the collection and injects the guard for gated operations.
    pub fn with_guard(persistence: P, guard: G) -> Self {
        let outcome = persistence.load();
        info!(
            "event=store_open module=store status=ok count={} repaired={} source={}",
            outcome.technologies.len(),
            outcome.repaired_records,
            load_source_label(&outcome.source)
        );
        Self {
            technologies: outcome.technologies,
            persistence,
            guard,
            load_source: outcome.source,
            version: 0,
            dirty: false,
            observers: Vec::new(),
            next_subscription: 0,
        }
    }

    /// How the initial collection was obtained.
    pub fn load_source(&self) -> &LoadSource {
        &self.load_source
    }

    /// Monotonic collection version; bumps once per applied mutation.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Whether the latest state failed to persist.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Current collection in insertion order.
    pub fn list(&self) -> &[Technology] {
        &self.technologies
    }

    pub fn len(&self) -> usize {
        self.technologies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.technologies.is_empty()
    }

    pub fn ids(&self) -> Vec<TechnologyId> {
        self.technologies.iter().map(|tech| tech.id).collect()
    }

    /// Point lookup; `None` is the not-found signal.
    pub fn get_by_id(&self, id: TechnologyId) -> Option<&Technology> {
        self.technologies.iter().find(|tech| tech.id == id)
    }

    /// Point lookup in error form.
    pub fn get(&self, id: TechnologyId) -> Result<&Technology, StoreError> {
        self.get_by_id(id).ok_or(StoreError::NotFound(id))
    }

    /// Derived overdue flag for one record.
    pub fn is_overdue(&self, id: TechnologyId, today: NaiveDate) -> Result<bool, StoreError> {
        Ok(self.get(id)?.is_overdue(today))
    }

    /// Records that are overdue on `today`, in collection order.
    pub fn overdue(&self, today: NaiveDate) -> Vec<&Technology> {
        self.technologies
            .iter()
            .filter(|tech| tech.is_overdue(today))
            .collect()
    }

    pub fn progress(&self, today: NaiveDate) -> ProgressSummary {
        ProgressSummary::from_technologies(&self.technologies, today)
    }

    /// Sets status from a wire name.
    ///
    /// Unknown status text or an unknown id is rejected without mutation.
    pub fn update_status(&mut self, id: TechnologyId, status: &str) -> Result<Mutation, StoreError> {
        let parsed = match parse_status(status) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(
                    "event=status_update module=store status=rejected error_code=unknown_status id={}",
                    id
                );
                return Err(err.into());
            }
        };
        self.set_status(id, parsed)
    }

    /// Sets status. Notes and deadline are untouched.
    pub fn set_status(
        &mut self,
        id: TechnologyId,
        status: TechnologyStatus,
    ) -> Result<Mutation, StoreError> {
        let index = self.index_of(id)?;
        if self.technologies[index].status == status {
            return Ok(self.unchanged());
        }
        self.technologies[index].status = status;
        debug!(
            "event=status_update module=store status=ok id={} value={}",
            id, status
        );
        Ok(self.commit(ChangeKind::StatusUpdated { id, status }))
    }

    /// Replaces notes verbatim; empty text clears them.
    pub fn update_notes(
        &mut self,
        id: TechnologyId,
        notes: impl Into<String>,
    ) -> Result<Mutation, StoreError> {
        let index = self.index_of(id)?;
        let notes = notes.into();
        if self.technologies[index].notes == notes {
            return Ok(self.unchanged());
        }
        self.technologies[index].notes = notes;
        debug!("event=notes_update module=store status=ok id={}", id);
        Ok(self.commit(ChangeKind::NotesUpdated(id)))
    }

    /// Validates and commits deadline text; empty text clears the deadline.
    ///
    /// # Errors
    /// - `InvalidDeadline` with the retained committed value on bad input.
    pub fn update_deadline(&mut self, id: TechnologyId, text: &str) -> Result<Mutation, StoreError> {
        let index = self.index_of(id)?;
        let deadline = match parse_deadline(text) {
            Ok(deadline) => deadline,
            Err(error) => {
                warn!(
                    "event=deadline_update module=store status=rejected id={} input_len={}",
                    id,
                    text.len()
                );
                return Err(StoreError::InvalidDeadline {
                    id,
                    error,
                    retained: self.technologies[index].deadline,
                });
            }
        };

        if self.technologies[index].deadline == deadline {
            return Ok(self.unchanged());
        }
        self.technologies[index].deadline = deadline;
        debug!("event=deadline_update module=store status=ok id={}", id);
        Ok(self.commit(ChangeKind::DeadlineUpdated { id, deadline }))
    }

    /// Asks the access guard about `operation` without running anything.
    ///
    /// Front ends use this for quick actions the store leaves open, such as
    /// export and random pick.
    pub fn check_access(&self, operation: GatedOperation) -> Result<(), AccessDenied> {
        assert_access(&self.guard, operation).inspect_err(|denied| {
            warn!(
                "event=access_check module=store status=denied operation={}",
                denied.operation.as_str()
            );
        })
    }

    /// Bulk status update from a wire name over `ids`.
    ///
    /// Gated by the access guard. An unknown status aborts the whole batch;
    /// unknown ids are skipped.
    pub fn update_statuses(
        &mut self,
        ids: &[TechnologyId],
        status: &str,
    ) -> Result<BulkOutcome, StoreError> {
        assert_access(&self.guard, GatedOperation::BulkStatusUpdate)?;
        let parsed = parse_status(status)?;
        Ok(self.apply_bulk(ids, parsed))
    }

    /// Typed form of `update_statuses`.
    pub fn set_statuses(
        &mut self,
        ids: &[TechnologyId],
        status: TechnologyStatus,
    ) -> Result<BulkOutcome, StoreError> {
        assert_access(&self.guard, GatedOperation::BulkStatusUpdate)?;
        Ok(self.apply_bulk(ids, status))
    }

    /// Marks every record completed.
    pub fn mark_all_complete(&mut self) -> Result<BulkOutcome, StoreError> {
        assert_access(&self.guard, GatedOperation::MarkAllComplete)?;
        let ids = self.ids();
        Ok(self.apply_bulk(&ids, TechnologyStatus::Completed))
    }

    /// Resets every record to not started.
    pub fn reset_all(&mut self) -> Result<BulkOutcome, StoreError> {
        assert_access(&self.guard, GatedOperation::ResetAll)?;
        let ids = self.ids();
        Ok(self.apply_bulk(&ids, TechnologyStatus::NotStarted))
    }

    /// Portable document of the current collection. Never mutates.
    pub fn export_snapshot(&self) -> ExportDocument {
        export_snapshot(&self.technologies)
    }

    /// Uniformly random record; `None` when the collection is empty.
    pub fn pick_random(&self) -> Option<&Technology> {
        self.pick_random_with(&mut rand::rng())
    }

    /// `pick_random` with a caller-supplied generator.
    pub fn pick_random_with<R: Rng>(&self, rng: &mut R) -> Option<&Technology> {
        if self.technologies.is_empty() {
            return None;
        }
        let index = rng.random_range(0..self.technologies.len());
        self.technologies.get(index)
    }

    /// Validates and appends a new record with a fresh id.
    pub fn add(&mut self, input: NewTechnology) -> Result<(TechnologyId, Mutation), StoreError> {
        let deadline = parse_deadline(input.deadline.as_str()).map_err(|error| {
            StoreError::InvalidDeadline {
                id: TechnologyId::nil(),
                error,
                retained: None,
            }
        })?;

        let mut technology = Technology::new(input.title.trim());
        technology.description = input
            .description
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());
        technology.deadline = deadline;
        technology.resources = input.resources;
        technology.validate()?;

        let id = technology.id;
        self.technologies.push(technology);
        info!("event=technology_add module=store status=ok id={}", id);
        Ok((id, self.commit(ChangeKind::Added(id))))
    }

    /// Removes one record.
    pub fn remove(&mut self, id: TechnologyId) -> Result<(Technology, Mutation), StoreError> {
        let index = self.index_of(id)?;
        let removed = self.technologies.remove(index);
        info!("event=technology_remove module=store status=ok id={}", id);
        Ok((removed, self.commit(ChangeKind::Removed(id))))
    }

    /// Registers an observer called after every applied mutation.
    pub fn subscribe(
        &mut self,
        observer: impl FnMut(&StoreEvent, &[Technology]) + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Removes an observer. Returns `false` for unknown handles.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(current, _)| *current != id);
        before != self.observers.len()
    }

    /// Re-persists the collection if the last save failed.
    pub fn flush(&mut self) -> Result<(), PersistenceWarning> {
        if !self.dirty {
            return Ok(());
        }
        self.persistence.save(&self.technologies)?;
        self.dirty = false;
        info!(
            "event=store_flush module=store status=ok version={}",
            self.version
        );
        Ok(())
    }

    /// Flushes pending persistence and releases the store.
    pub fn close(mut self) -> Result<(), PersistenceWarning> {
        let result = self.flush();
        info!(
            "event=store_close module=store status={} version={}",
            if result.is_ok() { "ok" } else { "error" },
            self.version
        );
        result
    }

    fn index_of(&self, id: TechnologyId) -> Result<usize, StoreError> {
        self.technologies
            .iter()
            .position(|tech| tech.id == id)
            .ok_or(StoreError::NotFound(id))
    }

    fn apply_bulk(&mut self, ids: &[TechnologyId], status: TechnologyStatus) -> BulkOutcome {
        let mut requested = HashSet::new();
        let mut updated_ids = Vec::new();
        let mut skipped = Vec::new();
        let mut changed = 0;

        for &id in ids {
            if !requested.insert(id) {
                continue;
            }
            match self.technologies.iter_mut().find(|tech| tech.id == id) {
                Some(technology) => {
                    if technology.status != status {
                        technology.status = status;
                        changed += 1;
                    }
                    updated_ids.push(id);
                }
                None => skipped.push(id),
            }
        }

        info!(
            "event=bulk_status_update module=store status=ok target={} requested={} updated={} changed={} skipped={}",
            status,
            requested.len(),
            updated_ids.len(),
            changed,
            skipped.len()
        );

        let updated = updated_ids.len();
        if changed == 0 {
            return BulkOutcome {
                updated,
                changed,
                skipped,
                version: self.version,
                warning: None,
            };
        }

        let mutation = self.commit(ChangeKind::BulkStatusUpdated {
            ids: updated_ids,
            status,
        });
        BulkOutcome {
            updated,
            changed,
            skipped,
            version: mutation.version,
            warning: mutation.warning,
        }
    }

    fn unchanged(&self) -> Mutation {
        Mutation {
            version: self.version,
            changed: false,
            warning: None,
        }
    }

    /// Bumps the version, saves the snapshot, then notifies observers.
    fn commit(&mut self, change: ChangeKind) -> Mutation {
        self.version += 1;
        let warning = match self.persistence.save(&self.technologies) {
            Ok(()) => {
                self.dirty = false;
                None
            }
            Err(warning) => {
                self.dirty = true;
                Some(warning)
            }
        };

        let event = StoreEvent {
            version: self.version,
            change,
            persisted: warning.is_none(),
        };
        for (_, observer) in self.observers.iter_mut() {
            observer(&event, &self.technologies);
        }

        Mutation {
            version: self.version,
            changed: true,
            warning,
        }
    }
}

fn load_source_label(source: &LoadSource) -> &'static str {
    match source {
        LoadSource::Stored => "slot",
        LoadSource::Seeded => "seed",
        LoadSource::RecoveredFromCorruption { .. } => "seed_after_corruption",
        LoadSource::StorageUnavailable { .. } => "seed_after_read_error",
    }
}

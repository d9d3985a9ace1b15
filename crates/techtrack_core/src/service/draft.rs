//! Detail-view draft editing with validate-on-commit deadline input.
//!
//! # Responsibility
//! - Hold editable notes and a raw deadline input buffer for one record.
//! - Commit deadline input only when valid, rolling the buffer back otherwise.
//! - Save notes then deadline to the store, in that order.
//! - Delete notes or deadline straight through to the store.
//!
//! # Invariants
//! - `committed_deadline` is always empty or a valid deadline text.
//! - A rejected deadline input restores the buffer to `committed_deadline`.

use crate::access::guard::AccessGuard;
use crate::model::technology::{Technology, TechnologyId};
use crate::persistence::adapter::TechnologyPersistence;
use crate::service::technology_store::{Mutation, StoreError, TechnologyStore};
use crate::validation::{parse_deadline, DeadlineError};
use chrono::NaiveDate;

/// Unsaved edits for one technology.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailDraft {
    id: TechnologyId,
    notes: String,
    deadline_input: String,
    committed_deadline: String,
}

/// Mutations applied by `DetailDraft::save`.
#[derive(Debug, Default)]
pub struct DraftSave {
    pub notes: Option<Mutation>,
    pub deadline: Option<Mutation>,
}

impl DraftSave {
    /// Whether anything was written.
    pub fn is_empty(&self) -> bool {
        self.notes.is_none() && self.deadline.is_none()
    }
}

impl DetailDraft {
    /// Starts a draft mirroring the stored record.
    pub fn from_technology(technology: &Technology) -> Self {
        let deadline = technology.deadline_text();
        Self {
            id: technology.id,
            notes: technology.notes.clone(),
            deadline_input: deadline.clone(),
            committed_deadline: deadline,
        }
    }

    /// Starts a draft for `id` from the store.
    pub fn load<P, G>(store: &TechnologyStore<P, G>, id: TechnologyId) -> Result<Self, StoreError>
    where
        P: TechnologyPersistence,
        G: AccessGuard,
    {
        Ok(Self::from_technology(store.get(id)?))
    }

    pub fn id(&self) -> TechnologyId {
        self.id
    }

    pub fn notes(&self) -> &str {
        self.notes.as_str()
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.notes = notes.into();
    }

    /// Clears the stored notes immediately, without waiting for `save`.
    ///
    /// The buffer is emptied only once the store accepted the write; a
    /// pending deadline edit is left untouched.
    pub fn delete_notes<P, G>(
        &mut self,
        store: &mut TechnologyStore<P, G>,
    ) -> Result<Mutation, StoreError>
    where
        P: TechnologyPersistence,
        G: AccessGuard,
    {
        let mutation = store.update_notes(self.id, String::new())?;
        self.notes.clear();
        Ok(mutation)
    }

    /// Raw text currently in the deadline input.
    pub fn deadline_input(&self) -> &str {
        self.deadline_input.as_str()
    }

    /// Last valid deadline text accepted by the draft.
    pub fn committed_deadline(&self) -> &str {
        self.committed_deadline.as_str()
    }

    /// Replaces the input buffer while the user is typing. No validation.
    pub fn set_deadline_input(&mut self, text: impl Into<String>) {
        self.deadline_input = text.into();
    }

    /// Validates the input buffer (the "blur" step).
    ///
    /// Valid input becomes the committed value; invalid input is discarded
    /// and the buffer is restored to the committed value.
    pub fn commit_deadline_input(&mut self) -> Result<Option<NaiveDate>, DeadlineError> {
        match parse_deadline(self.deadline_input.as_str()) {
            Ok(deadline) => {
                self.committed_deadline = self.deadline_input.clone();
                Ok(deadline)
            }
            Err(err) => {
                self.deadline_input = self.committed_deadline.clone();
                Err(err)
            }
        }
    }

    /// Clears the stored deadline immediately, without waiting for `save`.
    pub fn delete_deadline<P, G>(
        &mut self,
        store: &mut TechnologyStore<P, G>,
    ) -> Result<Mutation, StoreError>
    where
        P: TechnologyPersistence,
        G: AccessGuard,
    {
        let mutation = store.update_deadline(self.id, "")?;
        self.deadline_input.clear();
        self.committed_deadline.clear();
        Ok(mutation)
    }

    pub fn has_notes_changes(&self, stored: &Technology) -> bool {
        self.notes != stored.notes
    }

    pub fn has_deadline_changes(&self, stored: &Technology) -> bool {
        self.committed_deadline != stored.deadline_text()
    }

    pub fn has_changes(&self, stored: &Technology) -> bool {
        self.has_notes_changes(stored) || self.has_deadline_changes(stored)
    }

    /// Overdue flag as shown while editing: committed draft deadline
    /// against the stored status.
    pub fn is_overdue(&self, stored: &Technology, today: NaiveDate) -> bool {
        let mut preview = stored.clone();
        preview.deadline = parse_deadline(self.committed_deadline.as_str())
            .ok()
            .flatten();
        preview.is_overdue(today)
    }

    /// Writes changed notes, then the changed committed deadline.
    ///
    /// Each write completes (save + notify) before the next starts.
    pub fn save<P, G>(&mut self, store: &mut TechnologyStore<P, G>) -> Result<DraftSave, StoreError>
    where
        P: TechnologyPersistence,
        G: AccessGuard,
    {
        let stored = store.get(self.id)?.clone();
        let mut saved = DraftSave::default();

        if self.has_notes_changes(&stored) {
            saved.notes = Some(store.update_notes(self.id, self.notes.clone())?);
        }
        if self.has_deadline_changes(&stored) {
            match store.update_deadline(self.id, self.committed_deadline.as_str()) {
                Ok(mutation) => saved.deadline = Some(mutation),
                Err(err) => {
                    if let StoreError::InvalidDeadline { retained, .. } = &err {
                        let text = retained
                            .map(|date| date.format("%Y-%m-%d").to_string())
                            .unwrap_or_default();
                        self.deadline_input = text.clone();
                        self.committed_deadline = text;
                    }
                    return Err(err);
                }
            }
        }
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::DetailDraft;
    use crate::persistence::adapter::SnapshotPersistence;
    use crate::repo::slot_repo::InMemorySlotRepository;
    use crate::service::technology_store::TechnologyStore;
    use crate::validation::DeadlineError;
    use chrono::NaiveDate;

    #[test]
    fn invalid_input_rolls_back_to_committed_value() {
        let mut store =
            TechnologyStore::open(SnapshotPersistence::new(InMemorySlotRepository::new()));
        let id = store.list()[0].id;
        store.update_deadline(id, "2025-05-01").unwrap();

        let mut draft = DetailDraft::load(&store, id).unwrap();
        draft.set_deadline_input("2025-02-3");
        assert_eq!(draft.deadline_input(), "2025-02-3");

        let err = draft.commit_deadline_input().unwrap_err();
        assert!(matches!(err, DeadlineError::Malformed(_)));
        assert_eq!(draft.deadline_input(), "2025-05-01");
        assert_eq!(draft.committed_deadline(), "2025-05-01");
    }

    #[test]
    fn save_applies_notes_then_deadline() {
        let mut store =
            TechnologyStore::open(SnapshotPersistence::new(InMemorySlotRepository::new()));
        let id = store.list()[1].id;
        let mut draft = DetailDraft::load(&store, id).unwrap();
        assert!(!draft.has_changes(store.get(id).unwrap()));

        draft.set_notes("read chapter 4");
        draft.set_deadline_input("2024-02-29");
        draft.commit_deadline_input().unwrap();
        assert!(draft.has_changes(store.get(id).unwrap()));

        let saved = draft.save(&mut store).unwrap();
        let notes_version = saved.notes.as_ref().unwrap().version;
        let deadline_version = saved.deadline.as_ref().unwrap().version;
        assert!(notes_version < deadline_version);

        let stored = store.get(id).unwrap();
        assert_eq!(stored.notes, "read chapter 4");
        assert_eq!(stored.deadline, NaiveDate::from_ymd_opt(2024, 2, 29));
        assert!(!draft.has_changes(stored));
    }

    #[test]
    fn uncommitted_input_is_not_saved() {
        let mut store =
            TechnologyStore::open(SnapshotPersistence::new(InMemorySlotRepository::new()));
        let id = store.list()[0].id;
        let mut draft = DetailDraft::load(&store, id).unwrap();
        draft.set_deadline_input("2030-01-01");

        let saved = draft.save(&mut store).unwrap();
        assert!(saved.is_empty());
        assert_eq!(store.get(id).unwrap().deadline, None);
    }

    #[test]
    fn deleting_notes_and_deadline_writes_through() {
        let slots = InMemorySlotRepository::new();
        let mut store = TechnologyStore::open(SnapshotPersistence::new(&slots));
        let id = store.list()[0].id;
        store.update_notes(id, "temp").unwrap();
        store.update_deadline(id, "2020-01-01").unwrap();

        let mut draft = DetailDraft::load(&store, id).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(draft.is_overdue(store.get(id).unwrap(), today));

        let mutation = draft.delete_notes(&mut store).unwrap();
        assert!(mutation.changed);
        assert!(store.get(id).unwrap().notes.is_empty());
        assert_eq!(draft.notes(), "");

        draft.delete_deadline(&mut store).unwrap();
        assert_eq!(store.get(id).unwrap().deadline, None);
        assert_eq!(draft.committed_deadline(), "");
        assert!(!draft.is_overdue(store.get(id).unwrap(), today));
        assert!(!draft.has_changes(store.get(id).unwrap()));

        drop(store);

        let reopened = TechnologyStore::open(SnapshotPersistence::new(&slots));
        let stored = reopened.get(id).unwrap();
        assert!(stored.notes.is_empty());
        assert_eq!(stored.deadline, None);
    }

    #[test]
    fn deleting_notes_keeps_pending_deadline_edit() {
        let mut store =
            TechnologyStore::open(SnapshotPersistence::new(InMemorySlotRepository::new()));
        let id = store.list()[0].id;
        store.update_notes(id, "temp").unwrap();

        let mut draft = DetailDraft::load(&store, id).unwrap();
        draft.set_deadline_input("2031-03-03");
        draft.commit_deadline_input().unwrap();
        draft.delete_notes(&mut store).unwrap();

        assert_eq!(store.get(id).unwrap().deadline, None);
        assert!(draft.has_deadline_changes(store.get(id).unwrap()));
        assert_eq!(draft.committed_deadline(), "2031-03-03");
    }
}

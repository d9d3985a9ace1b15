//! Bulk-edit selection state and batch application.
//!
//! # Responsibility
//! - Track which technologies are chosen for a batch edit.
//! - Apply a pending target status through the store's bulk contract.
//!
//! # Invariants
//! - Selection order is the order ids were chosen; ids appear at most once.
//! - Selection state is never persisted.
//! - A failed apply leaves selection and pending status untouched.

use crate::access::guard::AccessGuard;
use crate::model::technology::{Technology, TechnologyId, TechnologyStatus};
use crate::persistence::adapter::TechnologyPersistence;
use crate::service::technology_store::{BulkOutcome, StoreError, TechnologyStore};
use crate::validation::{parse_status, StatusError};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Ordered set of selected technology ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkSelection {
    selected: Vec<TechnologyId>,
}

impl BulkSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips selection for `id`; returns whether it is selected afterwards.
    pub fn toggle(&mut self, id: TechnologyId) -> bool {
        if self.deselect(id) {
            false
        } else {
            self.selected.push(id);
            true
        }
    }

    /// Returns `false` when `id` was already selected.
    pub fn select(&mut self, id: TechnologyId) -> bool {
        if self.contains(id) {
            return false;
        }
        self.selected.push(id);
        true
    }

    /// Returns `false` when `id` was not selected.
    pub fn deselect(&mut self, id: TechnologyId) -> bool {
        let before = self.selected.len();
        self.selected.retain(|current| *current != id);
        before != self.selected.len()
    }

    /// Selects every technology in collection order, keeping prior picks.
    pub fn select_all(&mut self, technologies: &[Technology]) {
        for technology in technologies {
            self.select(technology.id);
        }
    }

    /// Drops ids that are no longer part of `technologies`.
    pub fn retain_existing(&mut self, technologies: &[Technology]) {
        self.selected
            .retain(|id| technologies.iter().any(|tech| tech.id == *id));
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn contains(&self, id: TechnologyId) -> bool {
        self.selected.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn ids(&self) -> &[TechnologyId] {
        &self.selected
    }
}

/// Reasons a bulk edit could not be applied.
#[derive(Debug)]
pub enum BulkEditError {
    EmptySelection,
    MissingStatus,
    Store(StoreError),
}

impl Display for BulkEditError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptySelection => write!(f, "no technologies selected"),
            Self::MissingStatus => write!(f, "no target status chosen"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for BulkEditError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::EmptySelection | Self::MissingStatus => None,
        }
    }
}

impl From<StoreError> for BulkEditError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Selection plus pending target status for one batch edit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkEdit {
    selection: BulkSelection,
    pending_status: Option<TechnologyStatus>,
}

impl BulkEdit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> &BulkSelection {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut BulkSelection {
        &mut self.selection
    }

    pub fn pending_status(&self) -> Option<TechnologyStatus> {
        self.pending_status
    }

    pub fn set_pending_status(&mut self, status: TechnologyStatus) {
        self.pending_status = Some(status);
    }

    /// Chooses the target status by wire name. Unknown names leave the
    /// previous choice in place.
    pub fn choose_status(&mut self, value: &str) -> Result<TechnologyStatus, StatusError> {
        let status = parse_status(value)?;
        self.pending_status = Some(status);
        Ok(status)
    }

    /// Whether `apply` has everything it needs.
    pub fn can_apply(&self) -> bool {
        !self.selection.is_empty() && self.pending_status.is_some()
    }

    /// Clears selection and pending status.
    pub fn reset(&mut self) {
        self.selection.clear();
        self.pending_status = None;
    }

    /// Applies the pending status to the selection, then resets on success.
    pub fn apply<P, G>(
        &mut self,
        store: &mut TechnologyStore<P, G>,
    ) -> Result<BulkOutcome, BulkEditError>
    where
        P: TechnologyPersistence,
        G: AccessGuard,
    {
        if self.selection.is_empty() {
            return Err(BulkEditError::EmptySelection);
        }
        let status = self.pending_status.ok_or(BulkEditError::MissingStatus)?;
        let outcome = store.set_statuses(self.selection.ids(), status)?;
        self.reset();
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::{BulkEdit, BulkEditError, BulkSelection};
    use crate::access::guard::DenyAll;
    use crate::model::technology::{Technology, TechnologyStatus};
    use crate::persistence::adapter::SnapshotPersistence;
    use crate::repo::slot_repo::InMemorySlotRepository;
    use crate::service::technology_store::{StoreError, TechnologyStore};

    #[test]
    fn toggle_keeps_order_and_uniqueness() {
        let a = Technology::new("a");
        let b = Technology::new("b");
        let mut selection = BulkSelection::new();

        assert!(selection.toggle(b.id));
        assert!(selection.toggle(a.id));
        assert!(!selection.select(a.id));
        assert_eq!(selection.ids(), &[b.id, a.id]);

        assert!(!selection.toggle(b.id));
        assert_eq!(selection.ids(), &[a.id]);
    }

    #[test]
    fn select_all_and_retain_existing() {
        let a = Technology::new("a");
        let b = Technology::new("b");
        let gone = Technology::new("gone");
        let mut selection = BulkSelection::new();
        selection.select(gone.id);
        selection.select_all(&[a.clone(), b.clone()]);
        assert_eq!(selection.len(), 3);

        selection.retain_existing(&[a.clone(), b.clone()]);
        assert_eq!(selection.ids(), &[a.id, b.id]);
    }

    #[test]
    fn apply_requires_selection_and_status() {
        let mut store =
            TechnologyStore::open(SnapshotPersistence::new(InMemorySlotRepository::new()));
        let mut edit = BulkEdit::new();

        assert!(matches!(
            edit.apply(&mut store),
            Err(BulkEditError::EmptySelection)
        ));
        edit.selection_mut().select(store.list()[0].id);
        assert!(matches!(
            edit.apply(&mut store),
            Err(BulkEditError::MissingStatus)
        ));
        assert!(edit.choose_status("BOGUS").is_err());
        assert_eq!(edit.pending_status(), None);
        assert_eq!(store.version(), 0);
    }

    #[test]
    fn successful_apply_resets_state() {
        let mut store =
            TechnologyStore::open(SnapshotPersistence::new(InMemorySlotRepository::new()));
        let mut edit = BulkEdit::new();
        edit.selection_mut().select_all(store.list());
        edit.choose_status("IN_PROGRESS").unwrap();
        assert!(edit.can_apply());

        let outcome = edit.apply(&mut store).unwrap();
        assert_eq!(outcome.updated, store.len());
        assert!(edit.selection().is_empty());
        assert_eq!(edit.pending_status(), None);
        assert!(store
            .list()
            .iter()
            .all(|tech| tech.status == TechnologyStatus::InProgress));
    }

    #[test]
    fn unauthorized_apply_keeps_selection() {
        let mut store = TechnologyStore::with_guard(
            SnapshotPersistence::new(InMemorySlotRepository::new()),
            DenyAll,
        );
        let mut edit = BulkEdit::new();
        edit.selection_mut().select(store.list()[0].id);
        edit.set_pending_status(TechnologyStatus::Completed);

        let err = edit.apply(&mut store).unwrap_err();
        assert!(matches!(
            err,
            BulkEditError::Store(StoreError::Unauthorized(_))
        ));
        assert_eq!(edit.selection().len(), 1);
        assert!(edit.can_apply());
    }
}

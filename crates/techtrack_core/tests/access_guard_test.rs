use std::cell::Cell;
use techtrack_core::access::session::SESSION_SLOT_KEY;
use techtrack_core::{
    open_db, open_db_in_memory, BulkEdit, BulkEditError, GatedOperation, SessionGuard,
    SlotRepository, SnapshotPersistence, SqliteSlotRepository, StoreError, TechnologyStatus,
    TechnologyStore,
};

#[test]
fn bulk_operations_follow_session_state() {
    let conn = open_db_in_memory().unwrap();
    let session = SessionGuard::new(SqliteSlotRepository::new(&conn));
    let mut store = TechnologyStore::with_guard(
        SnapshotPersistence::new(SqliteSlotRepository::new(&conn)),
        SessionGuard::new(SqliteSlotRepository::new(&conn)),
    );
    let ids = store.ids();

    match store.mark_all_complete().unwrap_err() {
        StoreError::Unauthorized(denied) => {
            assert_eq!(denied.operation, GatedOperation::MarkAllComplete)
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(matches!(
        store.update_statuses(&ids, "COMPLETED"),
        Err(StoreError::Unauthorized(_))
    ));
    assert!(matches!(store.reset_all(), Err(StoreError::Unauthorized(_))));
    assert_eq!(store.version(), 0);

    session.sign_in("learner").unwrap();
    let outcome = store.update_statuses(&ids[..2], "IN_PROGRESS").unwrap();
    assert_eq!(outcome.updated, 2);

    session.sign_out().unwrap();
    assert!(matches!(store.reset_all(), Err(StoreError::Unauthorized(_))));
    assert_eq!(store.get(ids[0]).unwrap().status, TechnologyStatus::InProgress);
}

#[test]
fn single_record_operations_are_not_gated() {
    let conn = open_db_in_memory().unwrap();
    let mut store = TechnologyStore::with_guard(
        SnapshotPersistence::new(SqliteSlotRepository::new(&conn)),
        SessionGuard::new(SqliteSlotRepository::new(&conn)),
    );
    let id = store.list()[0].id;

    store.update_status(id, "COMPLETED").unwrap();
    store.update_notes(id, "done").unwrap();
    assert!(store.pick_random().is_some());
    assert_eq!(store.export_snapshot().technology_count, store.len());
}

#[test]
fn quick_actions_are_checked_against_the_session() {
    let conn = open_db_in_memory().unwrap();
    let session = SessionGuard::new(SqliteSlotRepository::new(&conn));
    let store = TechnologyStore::with_guard(
        SnapshotPersistence::new(SqliteSlotRepository::new(&conn)),
        SessionGuard::new(SqliteSlotRepository::new(&conn)),
    );

    let denied = store.check_access(GatedOperation::Export).unwrap_err();
    assert_eq!(denied.operation, GatedOperation::Export);
    assert!(store.check_access(GatedOperation::RandomPick).is_err());

    session.sign_in("learner").unwrap();
    assert!(store.check_access(GatedOperation::Export).is_ok());
    assert!(store.check_access(GatedOperation::RandomPick).is_ok());
    assert_eq!(store.version(), 0);
}

#[test]
fn guard_is_consulted_on_every_call() {
    let conn = open_db_in_memory().unwrap();
    let calls = Cell::new(0);
    let guard = || {
        calls.set(calls.get() + 1);
        calls.get() > 1
    };
    let mut store = TechnologyStore::with_guard(
        SnapshotPersistence::new(SqliteSlotRepository::new(&conn)),
        guard,
    );

    assert!(store.mark_all_complete().is_err());
    assert!(store.mark_all_complete().is_ok());
    assert_eq!(calls.get(), 2);
}

#[test]
fn denied_bulk_edit_keeps_pending_state() {
    let conn = open_db_in_memory().unwrap();
    let mut store = TechnologyStore::with_guard(
        SnapshotPersistence::new(SqliteSlotRepository::new(&conn)),
        SessionGuard::new(SqliteSlotRepository::new(&conn)),
    );
    let mut edit = BulkEdit::new();
    edit.selection_mut().select_all(store.list());
    edit.choose_status("COMPLETED").unwrap();

    assert!(matches!(
        edit.apply(&mut store),
        Err(BulkEditError::Store(StoreError::Unauthorized(_)))
    ));
    assert!(edit.can_apply());
    assert!(store
        .list()
        .iter()
        .all(|tech| tech.status == TechnologyStatus::NotStarted));
}

#[test]
fn session_survives_reopen_and_corruption_means_signed_out() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.sqlite3");

    {
        let conn = open_db(&path).unwrap();
        SessionGuard::new(SqliteSlotRepository::new(&conn))
            .sign_in("learner")
            .unwrap();
    }

    let conn = open_db(&path).unwrap();
    let slots = SqliteSlotRepository::new(&conn);
    let session = SessionGuard::new(&slots);
    let state = session.current().unwrap();
    assert_eq!(state.username, "learner");
    assert!(state.is_authenticated);

    let raw = slots.read_slot(SESSION_SLOT_KEY).unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["isAuthenticated"], true);

    slots.write_slot(SESSION_SLOT_KEY, "[1,2").unwrap();
    assert!(session.current().is_none());
}

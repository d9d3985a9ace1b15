use rusqlite::Connection;
use techtrack_core::db::{
    latest_schema_version, open_db, open_db_in_memory, schema_version, OpenError,
};

#[test]
fn in_memory_database_is_at_latest_schema() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn).unwrap(), latest_schema_version());
    assert_table_exists(&conn, "storage_slots");
}

#[test]
fn reopening_file_database_keeps_schema_and_slots() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("techtrack.sqlite3");

    let first = open_db(&path).unwrap();
    first
        .execute(
            "INSERT INTO storage_slots (key, value) VALUES ('technologies', '[]');",
            [],
        )
        .unwrap();
    drop(first);

    let second = open_db(&path).unwrap();
    assert_eq!(schema_version(&second).unwrap(), latest_schema_version());
    let value: String = second
        .query_row(
            "SELECT value FROM storage_slots WHERE key = 'technologies';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(value, "[]");
}

#[test]
fn file_database_uses_wal_journal() {
    let dir = tempfile::tempdir().unwrap();
    let conn = open_db(dir.path().join("wal.sqlite3")).unwrap();

    let mode: String = conn
        .query_row("PRAGMA journal_mode;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(mode.to_ascii_lowercase(), "wal");
}

#[test]
fn empty_slot_key_is_rejected_by_schema() {
    let conn = open_db_in_memory().unwrap();
    let result = conn.execute(
        "INSERT INTO storage_slots (key, value) VALUES ('', 'x');",
        [],
    );
    assert!(result.is_err());
}

#[test]
fn newer_schema_is_refused_and_left_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 42;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        OpenError::SchemaTooNew { found, supported } => {
            assert_eq!(found, 42);
            assert_eq!(supported, latest_schema_version());
        }
        other => panic!("unexpected error: {other}"),
    }

    let untouched = Connection::open(&path).unwrap();
    assert_eq!(schema_version(&untouched).unwrap(), 42);
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1);",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "missing table {table_name}");
}

use registry_core::{
    ConnectionFactory, DbError, DbResult, RegistryRecord, RegistryRepositoryPort, RepoError,
    SqliteConnector, SqliteRegistryStore, StoreConfig, NAME_MAX_CHARS,
};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn temp_store() -> (TempDir, PathBuf, SqliteRegistryStore) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("voters.db");
    let store = SqliteRegistryStore::open(path.to_string_lossy()).unwrap();
    (dir, path, store)
}

fn ready_store() -> (TempDir, PathBuf, SqliteRegistryStore) {
    let (dir, path, store) = temp_store();
    store.init_schema().unwrap();
    (dir, path, store)
}

fn voters_table_sql(path: &Path) -> String {
    let conn = Connection::open(path).unwrap();
    conn.query_row(
        "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = 'voters';",
        [],
        |row| row.get(0),
    )
    .unwrap()
}

#[test]
fn init_schema_is_idempotent() {
    let (_dir, path, store) = temp_store();

    store.init_schema().unwrap();
    let first = voters_table_sql(&path);
    store.init_schema().unwrap();
    let second = voters_table_sql(&path);

    assert_eq!(first, second);
    assert!(first.contains("id INTEGER PRIMARY KEY"));
    assert!(first.contains("is_alive BOOLEAN NOT NULL"));
}

#[test]
fn unsaved_ids_are_absent() {
    let (_dir, _path, store) = ready_store();

    for id in [0, 1, 7, -3, i32::MAX] {
        assert!(!store.exists_by_id(id).unwrap());
        assert!(store.find_by_id(id).unwrap().is_none());
    }
}

#[test]
fn save_then_lookup_returns_equal_record() {
    let (_dir, _path, store) = ready_store();

    store.save(7, "Ana", 30, true).unwrap();

    assert!(store.exists_by_id(7).unwrap());
    assert_eq!(
        store.find_by_id(7).unwrap(),
        Some(RegistryRecord::new(7, "Ana", 30, true))
    );
    assert!(!store.exists_by_id(8).unwrap());
}

#[test]
fn save_record_preserves_false_flag_and_unicode_name() {
    let (_dir, _path, store) = ready_store();
    let record = RegistryRecord::new(21, "José Núñez", 88, false);

    store.save_record(&record).unwrap();

    assert_eq!(store.find_by_id(21).unwrap(), Some(record));
}

#[test]
fn duplicate_save_fails_and_keeps_first_row() {
    let (_dir, _path, store) = ready_store();
    store.save(7, "Ana", 30, true).unwrap();

    let err = store.save(7, "Impostor", 99, false).unwrap_err();

    assert!(err.is_constraint_violation(), "unexpected error: {err}");
    assert_eq!(
        store.find_by_id(7).unwrap(),
        Some(RegistryRecord::new(7, "Ana", 30, true))
    );
}

#[test]
fn delete_all_clears_rows_and_frees_ids() {
    let (_dir, _path, store) = ready_store();
    store.save(7, "Ana", 30, true).unwrap();
    store.save(8, "Luis", 45, false).unwrap();

    store.delete_all().unwrap();

    for id in [7, 8] {
        assert!(!store.exists_by_id(id).unwrap());
        assert!(store.find_by_id(id).unwrap().is_none());
    }

    store.save(7, "Ana", 31, true).unwrap();
    assert_eq!(
        store.find_by_id(7).unwrap(),
        Some(RegistryRecord::new(7, "Ana", 31, true))
    );
}

#[test]
fn delete_all_on_empty_table_succeeds() {
    let (_dir, _path, store) = ready_store();
    store.delete_all().unwrap();
    store.delete_all().unwrap();
}

/// Fails every insert of `fail_id` after the row has reached the store.
struct FailAfterInsert {
    inner: SqliteConnector,
    fail_id: i32,
}

impl ConnectionFactory for FailAfterInsert {
    fn connect(&self) -> DbResult<Connection> {
        let conn = self.inner.connect()?;
        conn.execute_batch(&format!(
            "CREATE TEMP TRIGGER fail_after_insert
             AFTER INSERT ON voters
             WHEN NEW.id = {}
             BEGIN
                 SELECT RAISE(FAIL, 'connection lost after insert');
             END;",
            self.fail_id
        ))?;
        Ok(conn)
    }
}

#[test]
fn failed_save_mid_transaction_leaves_no_row() {
    let (_dir, path, store) = ready_store();
    let failing = SqliteRegistryStore::with_connector(FailAfterInsert {
        inner: SqliteConnector::new(StoreConfig::anonymous(path.to_string_lossy())).unwrap(),
        fail_id: 13,
    });

    let err = failing.save(13, "Ana", 30, true).unwrap_err();
    assert!(err.sqlite_error().is_some());
    assert!(err.to_string().contains("connection lost after insert"));

    assert!(store.find_by_id(13).unwrap().is_none());
    assert!(!failing.exists_by_id(13).unwrap());

    failing.save(14, "Luis", 45, false).unwrap();
    store.save(13, "Ana", 30, true).unwrap();
    assert!(store.exists_by_id(13).unwrap());
    assert!(store.exists_by_id(14).unwrap());
}

#[test]
fn operations_before_init_schema_fail() {
    let (_dir, _path, store) = temp_store();

    let err = store.find_by_id(1).unwrap_err();
    assert!(err.to_string().contains("no such table"), "{err}");
    assert!(store.exists_by_id(1).is_err());
    assert!(store.save(1, "Ana", 30, true).is_err());
    assert!(store.delete_all().is_err());
}

#[test]
fn unreachable_store_surfaces_storage_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("no-such-dir").join("voters.db");
    let store = SqliteRegistryStore::open(path.to_string_lossy()).unwrap();

    let err = store.init_schema().unwrap_err();
    assert!(matches!(err, RepoError::Db(DbError::Sqlite(_))));
}

#[test]
fn per_connection_temporary_addresses_are_rejected() {
    for address in ["file:", "file:?mode=rwc", ":memory:"] {
        let err = SqliteRegistryStore::open(address).unwrap_err();
        assert!(matches!(err, DbError::InvalidConfig(_)), "{address}");
    }
}

#[test]
fn name_longer_than_limit_is_rejected_by_storage() {
    let (_dir, _path, store) = ready_store();

    let err = store
        .save(3, &"x".repeat(NAME_MAX_CHARS + 1), 30, true)
        .unwrap_err();
    assert!(err.is_constraint_violation());
    assert!(!store.exists_by_id(3).unwrap());

    store.save(3, &"x".repeat(NAME_MAX_CHARS), 30, true).unwrap();
    assert!(store.exists_by_id(3).unwrap());
}

#[test]
fn values_are_bound_not_interpolated() {
    let (_dir, _path, store) = ready_store();
    let hostile = "Robert'); DROP TABLE voters;--";

    store.save(5, hostile, 20, true).unwrap();

    let loaded = store.find_by_id(5).unwrap().unwrap();
    assert_eq!(loaded.name(), hostile);
    assert!(store.exists_by_id(5).unwrap());
}

#[test]
fn invalid_persisted_flag_is_reported() {
    let (_dir, path, store) = ready_store();
    store.save(9, "Ana", 30, true).unwrap();

    let conn = Connection::open(&path).unwrap();
    conn.execute("UPDATE voters SET is_alive = 2 WHERE id = 9;", [])
        .unwrap();
    drop(conn);

    let err = store.find_by_id(9).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}

#[test]
fn credentials_shape_reads_and_writes_same_store() {
    let (_dir, path, store) = ready_store();
    let with_auth = SqliteRegistryStore::new(StoreConfig::with_credentials(
        format!("sqlite://{}", path.display()),
        "registrar",
        "secret",
    ))
    .unwrap();
    assert!(with_auth.connector().config().has_credentials());

    with_auth.save(11, "Eva", 52, true).unwrap();
    assert!(store.exists_by_id(11).unwrap());
}

#[test]
fn concurrent_saves_of_distinct_ids_all_land() {
    let (_dir, _path, store) = ready_store();

    std::thread::scope(|scope| {
        for id in 0..8 {
            let store = &store;
            scope.spawn(move || {
                store
                    .save(id, &format!("voter-{id}"), 18 + id, id % 2 == 0)
                    .unwrap();
            });
        }
    });

    for id in 0..8 {
        let record = store.find_by_id(id).unwrap().unwrap();
        assert_eq!(record.age(), 18 + id);
        assert_eq!(record.is_alive(), id % 2 == 0);
    }
}

#[test]
fn store_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<SqliteRegistryStore>();
}

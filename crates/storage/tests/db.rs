//! Integration tests for RocksDB wrapper

use mintcore_storage::db::{cf, DatabaseConfig, WriteBatch};
use mintcore_storage::{Database, StorageError};
use tempfile::TempDir;

fn config_for(temp_dir: &TempDir) -> DatabaseConfig {
    DatabaseConfig {
        path: temp_dir.path().to_string_lossy().to_string(),
        ..Default::default()
    }
}

fn create_test_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db = Database::open(config_for(&temp_dir)).unwrap();
    (db, temp_dir)
}

fn put_all(db: &Database, cf_name: &str, entries: &[(&[u8], &[u8])]) {
    let mut batch = WriteBatch::new();
    let handle = db.cf_handle(cf_name).unwrap();
    for (key, value) in entries {
        batch.put_cf(&handle, key, value);
    }
    drop(handle);
    db.write_batch(batch).unwrap();
}

#[test]
fn test_open_database() {
    let (db, _temp_dir) = create_test_db();
    for name in cf::ALL {
        assert!(db.cf_handle(name).is_ok());
    }
}

#[test]
fn test_unknown_column_family() {
    let (db, _temp_dir) = create_test_db();
    assert!(matches!(
        db.get("blocks", b"key"),
        Err(StorageError::ColumnFamilyNotFound(_))
    ));
}

#[test]
fn test_column_families_are_isolated() {
    let (db, _temp_dir) = create_test_db();

    put_all(&db, cf::AT_DATA, &[(b"key", b"data")]);
    put_all(&db, cf::AT_STATES, &[(b"key", b"state")]);

    assert_eq!(db.get(cf::AT_DATA, b"key").unwrap(), Some(b"data".to_vec()));
    assert_eq!(db.get(cf::AT_STATES, b"key").unwrap(), Some(b"state".to_vec()));
}

#[test]
fn test_write_batch() {
    let (db, _temp_dir) = create_test_db();
    put_all(&db, cf::AT_STATES, &[(b"old", b"gone")]);

    let mut batch = WriteBatch::new();
    assert!(batch.is_empty());
    let data = db.cf_handle(cf::AT_DATA).unwrap();
    let states = db.cf_handle(cf::AT_STATES).unwrap();
    batch.put_cf(&data, b"key1", b"value1");
    batch.put_cf(&states, b"key2", b"value2");
    batch.delete_cf(&states, b"old");
    assert_eq!(batch.len(), 3);
    drop(data);
    drop(states);

    db.write_batch(batch).unwrap();

    assert_eq!(db.get(cf::AT_DATA, b"key1").unwrap(), Some(b"value1".to_vec()));
    assert_eq!(db.get(cf::AT_STATES, b"key2").unwrap(), Some(b"value2".to_vec()));
    assert_eq!(db.get(cf::AT_STATES, b"old").unwrap(), None);
}

#[test]
fn test_batch_put_then_delete_same_key() {
    let (db, _temp_dir) = create_test_db();

    let mut batch = WriteBatch::new();
    let states = db.cf_handle(cf::AT_STATES).unwrap();
    batch.put_cf(&states, b"k", b"v");
    batch.delete_cf(&states, b"k");
    drop(states);
    db.write_batch(batch).unwrap();

    assert_eq!(db.get(cf::AT_STATES, b"k").unwrap(), None);
}

#[test]
fn test_iterator_visits_every_key_in_order() {
    let (db, _temp_dir) = create_test_db();
    put_all(&db, cf::AT_DATA, &[(b"b", b"2"), (b"a", b"1"), (b"c", b"3")]);

    let keys: Vec<Vec<u8>> = db
        .iterator(cf::AT_DATA)
        .unwrap()
        .map(|entry| entry.unwrap().0.to_vec())
        .collect();
    assert_eq!(keys, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
}

#[test]
fn test_prefix_iterator_stops_at_prefix_end() {
    let (db, _temp_dir) = create_test_db();
    put_all(
        &db,
        cf::AT_STATES,
        &[(b"aa1", b"1"), (b"aa2", b"2"), (b"ab1", b"3")],
    );

    let keys: Vec<Vec<u8>> = db
        .prefix_iterator(cf::AT_STATES, b"aa")
        .unwrap()
        .map(|entry| entry.unwrap().0.to_vec())
        .collect();
    assert_eq!(keys, vec![b"aa1".to_vec(), b"aa2".to_vec()]);
}

#[test]
fn test_seek_last() {
    let (db, _temp_dir) = create_test_db();
    put_all(
        &db,
        cf::AT_STATES,
        &[(b"aa1", b"1"), (b"aa5", b"5"), (b"ab0", b"x")],
    );

    let (key, value) = db.seek_last(cf::AT_STATES, b"aa", b"aa\xff").unwrap().unwrap();
    assert_eq!(&*key, b"aa5");
    assert_eq!(&*value, b"5");

    let (key, _) = db.seek_last(cf::AT_STATES, b"aa", b"aa4").unwrap().unwrap();
    assert_eq!(&*key, b"aa1");

    assert!(db.seek_last(cf::AT_STATES, b"aa", b"aa0").unwrap().is_none());
    assert!(db.seek_last(cf::AT_STATES, b"ac", b"ac\xff").unwrap().is_none());
}

#[test]
fn test_reopen_keeps_data() {
    let temp_dir = TempDir::new().unwrap();
    {
        let db = Database::open(config_for(&temp_dir)).unwrap();
        put_all(&db, cf::AT_DATA, &[(b"persist", b"yes")]);
    }
    let db = Database::open(config_for(&temp_dir)).unwrap();
    assert_eq!(db.get(cf::AT_DATA, b"persist").unwrap(), Some(b"yes".to_vec()));
}

/// Single-key and bulk operation tests
///
/// Run with: cargo test --test store_ops
use std::sync::Arc;

use relstore::{
    DataType, EntityDef, FactoryRegistry, Metamodel, Record, RelStore, StoreConfig, StoreEntry,
    StoreError, Value,
};

fn test_metamodel() -> Metamodel {
    Metamodel::new()
        .entity_def(
            EntityDef::new("User")
                .id_attribute("username", DataType::Text)
                .attribute("first_name", DataType::Text)
                .attribute("last_name", DataType::Text)
                .attribute("age", DataType::Integer),
        )
        .entity_def(
            EntityDef::new("Vehicle")
                .id_attribute("vin", DataType::Text)
                .attribute("color", DataType::Text),
        )
}

fn started_store() -> RelStore {
    let registry = Arc::new(FactoryRegistry::new());
    registry.register_unit("test-unit", test_metamodel()).unwrap();

    let mut store =
        RelStore::new(StoreConfig::new("test-unit", "User"), registry).unwrap();
    store.start().unwrap();
    store
}

fn user_entry(username: &str, age: i64) -> StoreEntry {
    let record = Record::new("User")
        .set("username", username)
        .set("first_name", "Jane")
        .set("age", age);
    StoreEntry::new(Value::from(username), record)
}

#[test]
fn test_round_trip() {
    let store = started_store();
    let entry = user_entry("asmith", 30);

    store.write(&entry).unwrap();

    let loaded = store.load(&Value::from("asmith")).unwrap().unwrap();
    assert_eq!(loaded.key, Value::from("asmith"));
    assert_eq!(loaded.value, entry.value);
    assert_eq!(loaded.metadata, None);
}

#[test]
fn test_write_is_upsert() {
    let store = started_store();
    store.write(&user_entry("alice", 30)).unwrap();
    store.write(&user_entry("alice", 31)).unwrap();

    assert_eq!(store.size().unwrap(), 1);
    let loaded = store.load(&Value::from("alice")).unwrap().unwrap();
    assert_eq!(
        loaded.value.unwrap().get("age"),
        Some(&Value::Integer(31))
    );
}

#[test]
fn test_load_missing_key() {
    let store = started_store();
    assert!(store.load(&Value::from("ghost")).unwrap().is_none());
    assert!(!store.contains(&Value::from("ghost")).unwrap());
}

#[test]
fn test_key_type_guard() {
    let store = started_store();
    store.write(&user_entry("alice", 30)).unwrap();

    // Identifier type is TEXT; an INTEGER key is not an error, just absent.
    assert!(store.load(&Value::Integer(42)).unwrap().is_none());
    assert!(!store.contains(&Value::Integer(42)).unwrap());
    assert!(!store.delete(&Value::Integer(42)).unwrap());
    assert!(store.load(&Value::Null).unwrap().is_none());

    // Storage was never touched.
    assert_eq!(store.size().unwrap(), 1);
}

#[test]
fn test_write_rejects_foreign_entity_type() {
    let store = started_store();
    let vehicle = Record::new("Vehicle").set("vin", "V1").set("color", "red");
    let entry = StoreEntry::new(Value::from("V1"), vehicle);

    assert!(matches!(
        store.write(&entry),
        Err(StoreError::TypeMismatch(_))
    ));
    assert_eq!(store.size().unwrap(), 0);
}

#[test]
fn test_write_rejects_identity_mismatch() {
    let store = started_store();
    let record = Record::new("User").set("username", "alice");
    let entry = StoreEntry::new(Value::from("bob"), record);

    assert!(matches!(
        store.write(&entry),
        Err(StoreError::IdentityMismatch { .. })
    ));
    assert_eq!(store.size().unwrap(), 0);
}

#[test]
fn test_write_rejects_missing_value() {
    let store = started_store();
    let entry = StoreEntry::key_only(Value::from("alice"));

    assert!(matches!(
        store.write(&entry),
        Err(StoreError::TypeMismatch(_))
    ));
}

#[test]
fn test_delete_idempotence() {
    let store = started_store();

    assert!(!store.delete(&Value::from("alice")).unwrap());

    store.write(&user_entry("alice", 30)).unwrap();
    assert!(store.delete(&Value::from("alice")).unwrap());
    assert!(!store.delete(&Value::from("alice")).unwrap());
    assert!(store.load(&Value::from("alice")).unwrap().is_none());
}

#[test]
fn test_delete_sees_removal_by_sibling_store() {
    let registry = Arc::new(FactoryRegistry::new());
    registry.register_unit("shared-unit", test_metamodel()).unwrap();

    let mut store_a =
        RelStore::new(StoreConfig::new("shared-unit", "User"), Arc::clone(&registry)).unwrap();
    let mut store_b =
        RelStore::new(StoreConfig::new("shared-unit", "User"), registry).unwrap();
    store_a.start().unwrap();
    store_b.start().unwrap();

    store_a.write(&user_entry("alice", 30)).unwrap();

    // The row vanishes between store A's operations; A's own delete must
    // find it gone and report false, not a second deletion.
    assert!(store_b.delete(&Value::from("alice")).unwrap());
    assert!(!store_a.delete(&Value::from("alice")).unwrap());
    assert!(store_a.load(&Value::from("alice")).unwrap().is_none());

    store_a.stop().unwrap();
    store_b.stop().unwrap();
}

#[test]
fn test_clear_totality() {
    let store = started_store();
    for i in 0..10 {
        store.write(&user_entry(&format!("user{}", i), i)).unwrap();
    }
    assert_eq!(store.size().unwrap(), 10);

    store.clear().unwrap();

    assert_eq!(store.size().unwrap(), 0);
    for i in 0..10 {
        let key = Value::from(format!("user{}", i));
        assert!(store.load(&key).unwrap().is_none());
    }
}

#[test]
fn test_size_counts_rows() {
    let store = started_store();
    assert_eq!(store.size().unwrap(), 0);

    store.write(&user_entry("a", 1)).unwrap();
    store.write(&user_entry("b", 2)).unwrap();
    assert_eq!(store.size().unwrap(), 2);

    store.delete(&Value::from("a")).unwrap();
    assert_eq!(store.size().unwrap(), 1);
}

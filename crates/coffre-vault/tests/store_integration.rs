#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

//! Integration tests for the SQLite store — persistence across reopen,
//! migrations, and the `ItemStore` contract.

use coffre_crypto_core::symmetric;
use coffre_vault::error::VaultError;
use coffre_vault::items::{ItemType, VaultItem};
use coffre_vault::store::{ItemStore, SqliteStore};

fn sealed_stub(byte: u8) -> coffre_crypto_core::SealedData {
    // Contents are opaque to the store — any valid sealed record will do.
    symmetric::encrypt(&[byte; 8], &[0x33; 32], &[]).expect("encrypt")
}

fn stub_item(id: &str, item_type: ItemType) -> VaultItem {
    VaultItem {
        id: id.to_owned(),
        item_type,
        sealed: sealed_stub(1),
        favorite: false,
        created_at: "2026-01-01T00:00:00Z".into(),
        updated_at: "2026-01-01T00:00:00Z".into(),
    }
}

#[test]
fn migrations_set_schema_version() {
    let store = SqliteStore::open_in_memory().expect("store");
    assert_eq!(store.schema_version().expect("version"), 1);
}

#[test]
fn items_persist_across_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("vault.db");
    let item = stub_item("item-1", ItemType::Note);

    {
        let store = SqliteStore::open(&path).expect("open");
        store.save_item(&item).expect("save");
    }

    let store = SqliteStore::open(&path).expect("reopen");
    let loaded = store.load_item("item-1").expect("load");
    assert_eq!(loaded.item_type, ItemType::Note);
    assert_eq!(loaded.sealed, item.sealed, "sealed bytes survive reopen");
}

#[test]
fn load_unknown_item_fails_with_not_found() {
    let store = SqliteStore::open_in_memory().expect("store");
    assert!(matches!(
        store.load_item("ghost"),
        Err(VaultError::ItemNotFound(_))
    ));
}

#[test]
fn save_item_replaces_existing_row() {
    let store = SqliteStore::open_in_memory().expect("store");
    let mut item = stub_item("item-1", ItemType::Card);
    store.save_item(&item).expect("save");

    item.favorite = true;
    item.updated_at = "2026-02-01T00:00:00Z".into();
    store.save_item(&item).expect("replace");

    let loaded = store.load_item("item-1").expect("load");
    assert!(loaded.favorite);
    assert_eq!(loaded.updated_at, "2026-02-01T00:00:00Z");
}

#[test]
fn delete_items_ignores_unknown_ids() {
    let store = SqliteStore::open_in_memory().expect("store");
    store
        .save_item(&stub_item("item-1", ItemType::Note))
        .expect("save");

    let removed = store
        .delete_items(&["item-1".into(), "ghost".into()])
        .expect("delete");
    assert_eq!(removed, 1);
    assert!(store.load_item("item-1").is_err());
}

#[test]
fn list_items_by_type_filters() {
    let store = SqliteStore::open_in_memory().expect("store");
    store
        .save_item(&stub_item("note-1", ItemType::Note))
        .expect("save");
    store
        .save_item(&stub_item("note-2", ItemType::Note))
        .expect("save");
    store
        .save_item(&stub_item("card-1", ItemType::Card))
        .expect("save");

    let notes = store.list_items_by_type(ItemType::Note).expect("list");
    assert_eq!(notes.len(), 2);
    assert!(notes.iter().all(|i| i.item_type == ItemType::Note));
    assert_eq!(store.count_items_by_type(ItemType::Card).expect("count"), 1);
    assert_eq!(
        store.count_items_by_type(ItemType::Password).expect("count"),
        0
    );
}

#[test]
fn item_store_trait_object_works() {
    // Sync adapters receive the store behind the trait, not the concrete type.
    let store = SqliteStore::open_in_memory().expect("store");
    let dyn_store: &dyn ItemStore = &store;

    dyn_store
        .save_item(&stub_item("item-1", ItemType::Passkey))
        .expect("save");
    let loaded = dyn_store.load_item("item-1").expect("load");
    assert_eq!(loaded.item_type, ItemType::Passkey);
    assert_eq!(
        dyn_store
            .list_items_by_type(ItemType::Passkey)
            .expect("list")
            .len(),
        1
    );
    assert_eq!(
        dyn_store.delete_items(&["item-1".into()]).expect("delete"),
        1
    );
}

//! MemoryEntityStore behaviour. No database required.

use std::sync::Arc;

use chrono::DateTime;
use scholarship_common::{Address, Amount, Company, EntityKind, Scholar};
use scholarship_store::{EntityStore, EntityStoreExt, MemoryEntityStore};

fn company(n: u8) -> Company {
    Company::new(
        Address::from_low_u8(n),
        DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
    )
}

#[tokio::test]
async fn load_missing_entity_is_none() {
    let store = MemoryEntityStore::new();
    let loaded: Option<Company> = store.load("0xdead").await.unwrap();
    assert!(loaded.is_none());
}

#[tokio::test]
async fn save_then_load_returns_same_entity() {
    let store = MemoryEntityStore::new();
    let mut c = company(1);
    c.add_scholarship(Amount::new(1000));
    store.save(&c).await.unwrap();

    let loaded: Company = store.load(&c.id.to_string()).await.unwrap().unwrap();
    assert_eq!(loaded, c);
}

#[tokio::test]
async fn upsert_overwrites_by_key() {
    let store = MemoryEntityStore::new();
    let mut c = company(1);
    store.save(&c).await.unwrap();
    c.approve_scholar();
    store.save(&c).await.unwrap();

    assert_eq!(store.count(EntityKind::Company), 1);
    let loaded: Company = store.load(&c.id.to_string()).await.unwrap().unwrap();
    assert_eq!(loaded.total_active_scholars, 1);
}

#[tokio::test]
async fn identical_upsert_leaves_state_unchanged() {
    let store = MemoryEntityStore::new();
    let c = company(1);
    store.save(&c).await.unwrap();
    let before = store.snapshot();

    store.save(&c).await.unwrap();

    assert_eq!(store.snapshot(), before);
    assert_eq!(store.writes(), 2);
}

#[tokio::test]
async fn kinds_are_separate_namespaces() {
    let store = MemoryEntityStore::new();
    let at = DateTime::from_timestamp(0, 0).unwrap();
    let c = company(7);
    let s = Scholar::new(Address::from_low_u8(7), at);
    store.save(&c).await.unwrap();
    store.save(&s).await.unwrap();

    let companies: Vec<Company> = store.list().await.unwrap();
    let scholars: Vec<Scholar> = store.list().await.unwrap();
    assert_eq!(companies.len(), 1);
    assert_eq!(scholars.len(), 1);
}

#[tokio::test]
async fn arc_store_shares_state() {
    let store = Arc::new(MemoryEntityStore::new());
    let shared: Arc<dyn EntityStore> = store.clone();
    shared.save(&company(3)).await.unwrap();

    assert_eq!(store.count(EntityKind::Company), 1);
}

#[tokio::test]
async fn corrupt_record_is_an_error() {
    let store = MemoryEntityStore::new();
    store
        .save_raw(EntityKind::Company, "0x01", serde_json::json!({"id": 5}))
        .await
        .unwrap();

    let result: anyhow::Result<Option<Company>> = store.load("0x01").await;
    assert!(result.is_err());
}

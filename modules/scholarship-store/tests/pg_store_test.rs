//! Integration tests for PgEntityStore.
//! Requires a Postgres instance. Set DATABASE_TEST_URL or these tests are skipped.

use chrono::DateTime;
use scholarship_common::{Address, Amount, Company, EntityKind};
use scholarship_store::{EntityStore, EntityStoreExt, PgEntityStore};
use sqlx::PgPool;

async fn test_store() -> Option<PgEntityStore> {
    let url = std::env::var("DATABASE_TEST_URL").ok()?;
    let pool = PgPool::connect(&url).await.ok()?;
    let store = PgEntityStore::new(pool);
    store.migrate().await.ok()?;

    sqlx::query("TRUNCATE entities")
        .execute(store.pool())
        .await
        .ok()?;

    Some(store)
}

fn company() -> Company {
    Company::new(
        Address::from_low_u8(1),
        DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
    )
}

#[tokio::test]
async fn save_and_load_roundtrip() {
    let Some(store) = test_store().await else {
        return;
    };
    let mut c = company();
    c.add_scholarship(Amount::MAX);
    store.save(&c).await.unwrap();

    let loaded: Company = store.load(&c.id.to_string()).await.unwrap().unwrap();
    assert_eq!(loaded, c);
}

#[tokio::test]
async fn upsert_keeps_one_row_per_key() {
    let Some(store) = test_store().await else {
        return;
    };
    let mut c = company();
    store.save(&c).await.unwrap();
    c.approve_scholar();
    store.save(&c).await.unwrap();
    store.save(&c).await.unwrap();

    let rows = store.list_raw(EntityKind::Company).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].1["total_active_scholars"], 1);
}

#[tokio::test]
async fn missing_key_is_none() {
    let Some(store) = test_store().await else {
        return;
    };
    let loaded: Option<Company> = store.load("0xmissing").await.unwrap();
    assert!(loaded.is_none());
}

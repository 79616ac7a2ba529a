//! Core traits for the entity store.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use scholarship_common::{Entity, EntityKind};

/// Raw key-value persistence by `(kind, id)`.
///
/// Implemented by `PgEntityStore` (postgres) and `MemoryEntityStore` (tests,
/// replays). Also implemented for `Arc<S>` so a store can be shared with
/// assertions.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn load_raw(&self, kind: EntityKind, id: &str) -> Result<Option<serde_json::Value>>;

    /// Insert or overwrite the document stored under `(kind, id)`.
    async fn save_raw(&self, kind: EntityKind, id: &str, payload: serde_json::Value)
        -> Result<()>;

    /// Every document of one kind, ordered by id.
    async fn list_raw(&self, kind: EntityKind) -> Result<Vec<(String, serde_json::Value)>>;
}

/// Typed access on top of [`EntityStore`].
#[async_trait]
pub trait EntityStoreExt: EntityStore {
    async fn load<E: Entity>(&self, id: &str) -> Result<Option<E>> {
        match self.load_raw(E::KIND, id).await? {
            Some(payload) => {
                let entity = serde_json::from_value(payload)
                    .with_context(|| format!("Corrupt {} record: {id}", E::KIND))?;
                Ok(Some(entity))
            }
            None => Ok(None),
        }
    }

    /// Load an entity, or build a fresh zero-valued one if it is absent.
    /// Nothing is written until the caller saves.
    async fn load_or_else<E, F>(&self, id: &str, default: F) -> Result<E>
    where
        E: Entity,
        F: FnOnce() -> E + Send,
    {
        Ok(match self.load::<E>(id).await? {
            Some(entity) => entity,
            None => default(),
        })
    }

    async fn save<E: Entity>(&self, entity: &E) -> Result<()> {
        let payload = serde_json::to_value(entity)
            .with_context(|| format!("Failed to serialize {} record", E::KIND))?;
        self.save_raw(E::KIND, &entity.key(), payload).await
    }

    async fn list<E: Entity>(&self) -> Result<Vec<E>> {
        self.list_raw(E::KIND)
            .await?
            .into_iter()
            .map(|(id, payload)| {
                serde_json::from_value(payload)
                    .with_context(|| format!("Corrupt {} record: {id}", E::KIND))
            })
            .collect()
    }
}

impl<S: EntityStore + ?Sized> EntityStoreExt for S {}

// ---------------------------------------------------------------------------
// Arc<S> blanket, so tests can share the store for assertions
// ---------------------------------------------------------------------------

#[async_trait]
impl<S: EntityStore + ?Sized> EntityStore for Arc<S> {
    async fn load_raw(&self, kind: EntityKind, id: &str) -> Result<Option<serde_json::Value>> {
        (**self).load_raw(kind, id).await
    }

    async fn save_raw(
        &self,
        kind: EntityKind,
        id: &str,
        payload: serde_json::Value,
    ) -> Result<()> {
        (**self).save_raw(kind, id, payload).await
    }

    async fn list_raw(&self, kind: EntityKind) -> Result<Vec<(String, serde_json::Value)>> {
        (**self).list_raw(kind).await
    }
}

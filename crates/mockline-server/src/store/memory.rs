//! In-memory `EntityStore`.

use super::{Entity, EntityStore, InvalidationFlag, StoreError};
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Entities keyed by upper-cased id, listed in key order.
pub struct InMemoryStore<T: Entity> {
    entries: RwLock<BTreeMap<String, T>>,
    invalidation: InvalidationFlag,
}

impl<T: Entity> InMemoryStore<T> {
    pub fn new(invalidation: InvalidationFlag) -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            invalidation,
        }
    }

    fn key(id: &str) -> String {
        id.trim().to_uppercase()
    }
}

impl<T: Entity> EntityStore<T> for InMemoryStore<T> {
    fn get(&self, id: &str) -> Result<T, StoreError> {
        if id.trim().is_empty() {
            return Err(StoreError::BlankId(T::KIND));
        }
        self.entries
            .read()
            .get(&Self::key(id))
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                kind: T::KIND,
                id: id.to_string(),
            })
    }

    fn list(&self) -> Result<Vec<T>, StoreError> {
        Ok(self.entries.read().values().cloned().collect())
    }

    fn save(&self, mut entity: T) -> Result<String, StoreError> {
        if entity.id().trim().is_empty() {
            let id = format!("{}_{}", entity.owner_id(), entity.id_suffix());
            entity.set_id(id);
        }
        let id = entity.id().to_string();
        self.entries.write().insert(Self::key(&id), entity);
        self.invalidation.raise();
        Ok(id)
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        if id.trim().is_empty() {
            return Err(StoreError::BlankId(T::KIND));
        }
        self.entries.write().remove(&Self::key(id));
        self.invalidation.raise();
        Ok(())
    }
}

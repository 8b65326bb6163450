//! Persistence boundary.
//!
//! Entities are kept in key/value stores behind the `EntityStore` trait.
//! Keys are case-insensitive. Every write raises the shared
//! `InvalidationFlag` so the endpoint cache reloads on its next lookup.
//!
//! ## Module Structure
//!
//! - `memory`: `InMemoryStore`, the bundled `EntityStore` implementation
//! - `catalog`: `Catalog`, which edits endpoints and assembles resolved ones
//! - `definition`: YAML/JSON endpoint definitions imported into the catalog
//! - `trace_log`: persisted per-call trace logs

mod catalog;
mod definition;
mod memory;
mod trace_log;

use crate::endpoint::{Condition, ConditionGroupRecord, EndpointRecord, ResponseParam};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub use catalog::{Catalog, CatalogError};
#[allow(unused_imports)]
pub use definition::{
    AssignmentDefinition, ConditionDefinition, EndpointDefinition, GroupDefinition,
    VariantDefinition,
};
pub use memory::InMemoryStore;
pub use trace_log::{InMemoryTraceLogStore, TraceLogStore};

/// Errors raised by stores.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("{0} blank id not allowed")]
    BlankId(&'static str),
}

/// A storable entity.
pub trait Entity: Clone + Send + Sync + 'static {
    /// Entity name used in errors and logs.
    const KIND: &'static str;

    fn id(&self) -> &str;

    fn set_id(&mut self, id: String);

    /// Prefix of generated ids.
    fn owner_id(&self) -> &str;

    /// Suffix of a generated id. Random unless the entity has a natural key.
    fn id_suffix(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Key/value store for one entity type.
pub trait EntityStore<T: Entity>: Send + Sync {
    fn get(&self, id: &str) -> Result<T, StoreError>;

    fn list(&self) -> Result<Vec<T>, StoreError>;

    /// Save, assigning `<owner>_<suffix>` when the id is blank. Returns the id.
    fn save(&self, entity: T) -> Result<String, StoreError>;

    fn delete(&self, id: &str) -> Result<(), StoreError>;

    fn list_by_owner(&self, owner_id: &str) -> Result<Vec<T>, StoreError> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|e| e.owner_id().eq_ignore_ascii_case(owner_id))
            .collect())
    }
}

/// Shared "stored data changed" flag.
#[derive(Debug, Clone, Default)]
pub struct InvalidationFlag(Arc<AtomicBool>);

impl InvalidationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn clear(&self) {
        self.0.store(false, Ordering::Release);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

impl Entity for EndpointRecord {
    const KIND: &'static str = "endpoint";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn owner_id(&self) -> &str {
        &self.collection
    }
}

impl Entity for ResponseParam {
    const KIND: &'static str = "response param";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn owner_id(&self) -> &str {
        &self.owner_id
    }

    fn id_suffix(&self) -> String {
        self.key.clone()
    }
}

impl Entity for Condition {
    const KIND: &'static str = "condition";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn owner_id(&self) -> &str {
        &self.owner_id
    }
}

impl Entity for ConditionGroupRecord {
    const KIND: &'static str = "condition group";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn owner_id(&self) -> &str {
        &self.owner_id
    }
}

//! Endpoint lookup cache.
//!
//! Maps `(collection, name, method)` to a resolved `Endpoint`. The whole map
//! is rebuilt from the source on first use and whenever the shared
//! invalidation flag has been raised by a write. Rebuilds are serialized by
//! one mutex; lookups only take the read side of the map lock.

use super::types::{Endpoint, EndpointError, DEFAULT_COLLECTION};
use crate::metrics;
use crate::store::{InvalidationFlag, StoreError};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Where the cache loads endpoints from.
pub trait EndpointSource: Send + Sync {
    /// Load resolved endpoints, stopping after `limit` entries when set.
    fn load_endpoints(&self, limit: Option<usize>) -> Result<Vec<Endpoint>, StoreError>;
}

pub struct EndpointCache {
    source: Arc<dyn EndpointSource>,
    entries: RwLock<HashMap<String, Arc<Endpoint>>>,
    invalidation: InvalidationFlag,
    built: AtomicBool,
    rebuild_lock: Mutex<()>,
    max_endpoints: Option<usize>,
}

impl EndpointCache {
    pub fn new(
        source: Arc<dyn EndpointSource>,
        invalidation: InvalidationFlag,
        max_endpoints: Option<usize>,
    ) -> Self {
        Self {
            source,
            entries: RwLock::new(HashMap::new()),
            invalidation,
            built: AtomicBool::new(false),
            rebuild_lock: Mutex::new(()),
            max_endpoints,
        }
    }

    /// Lower-cased lookup key. A blank collection means the default one.
    pub fn cache_key(collection: &str, name: &str, method: &str) -> String {
        let collection = collection.trim();
        let collection = if collection.is_empty() {
            DEFAULT_COLLECTION
        } else {
            collection
        };
        format!(
            "{}_{}_{}",
            collection.to_lowercase(),
            name.trim().trim_matches('/').to_lowercase(),
            method.trim().to_lowercase()
        )
    }

    /// Resolve an endpoint, rebuilding first if the cache is cold or stale.
    pub fn resolve(
        &self,
        collection: &str,
        name: &str,
        method: &str,
    ) -> Result<Arc<Endpoint>, EndpointError> {
        if self.needs_rebuild() {
            self.rebuild()?;
        }

        let key = Self::cache_key(collection, name, method);
        self.entries
            .read()
            .get(&key)
            .cloned()
            .ok_or_else(|| EndpointError::NotFound {
                collection: collection.to_string(),
                name: name.to_string(),
                method: method.to_string(),
            })
    }

    fn needs_rebuild(&self) -> bool {
        !self.built.load(Ordering::Acquire) || self.invalidation.is_raised()
    }

    /// Reload every endpoint from the source.
    pub fn rebuild(&self) -> Result<(), EndpointError> {
        let _guard = self.rebuild_lock.lock();
        // Another caller may have finished a rebuild while we waited.
        if !self.needs_rebuild() {
            return Ok(());
        }

        // Clear before loading so writes that land mid-rebuild trigger another one.
        self.invalidation.clear();
        let endpoints = self.source.load_endpoints(self.max_endpoints)?;

        let mut map = HashMap::with_capacity(endpoints.len());
        for endpoint in endpoints {
            let key = Self::cache_key(&endpoint.collection, &endpoint.name, &endpoint.method);
            debug!("Caching endpoint {}", key);
            map.insert(key, Arc::new(endpoint));
        }

        info!("Endpoint cache rebuilt with {} entries", map.len());
        metrics::CACHE_REBUILDS_TOTAL.inc();
        *self.entries.write() = map;
        self.built.store(true, Ordering::Release);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

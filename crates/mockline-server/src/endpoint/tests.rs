//! Tests for the endpoint cache.

use super::*;
use crate::fixtures::endpoint_from_yaml;
use crate::store::{InvalidationFlag, StoreError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct CountingSource {
    endpoints: Vec<Endpoint>,
    loads: AtomicUsize,
}

impl CountingSource {
    fn new(endpoints: Vec<Endpoint>) -> Arc<Self> {
        Arc::new(Self {
            endpoints,
            loads: AtomicUsize::new(0),
        })
    }

    fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl EndpointSource for CountingSource {
    fn load_endpoints(&self, limit: Option<usize>) -> Result<Vec<Endpoint>, StoreError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let take = limit.unwrap_or(self.endpoints.len());
        Ok(self.endpoints.iter().take(take).cloned().collect())
    }
}

fn endpoint(collection: &str, name: &str, method: &str) -> Endpoint {
    let mut e = endpoint_from_yaml(&format!(
        "name: {name}\nmethod: {method}\nresponses:\n  - name: DEFAULT\n    status: 200\n    body: '{{}}'\n"
    ));
    if !collection.is_empty() {
        e.collection = collection.to_string();
    }
    e
}

#[test]
fn test_cache_key_normalisation() {
    assert_eq!(EndpointCache::cache_key("", "/Users/", "get"), "v1_users_get");
    assert_eq!(EndpointCache::cache_key(" V2 ", "orders", "POST"), "v2_orders_post");
}

#[test]
fn test_resolve_builds_once() {
    let source = CountingSource::new(vec![endpoint("", "users", "GET")]);
    let cache = EndpointCache::new(source.clone(), InvalidationFlag::new(), None);

    assert!(cache.resolve("v1", "users", "GET").is_ok());
    assert!(cache.resolve("V1", "USERS", "get").is_ok());
    assert_eq!(source.loads(), 1);
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_blank_collection_resolves_default() {
    let source = CountingSource::new(vec![endpoint("", "users", "GET")]);
    let cache = EndpointCache::new(source, InvalidationFlag::new(), None);
    let found = cache.resolve("", "users", "GET").unwrap();
    assert_eq!(found.name, "users");
}

#[test]
fn test_invalidation_triggers_rebuild() {
    let flag = InvalidationFlag::new();
    let source = CountingSource::new(vec![endpoint("", "users", "GET")]);
    let cache = EndpointCache::new(source.clone(), flag.clone(), None);

    cache.resolve("v1", "users", "GET").unwrap();
    flag.raise();
    cache.resolve("v1", "users", "GET").unwrap();

    assert_eq!(source.loads(), 2);
    assert!(!flag.is_raised());
}

#[test]
fn test_limit_caps_entries() {
    let source = CountingSource::new(vec![
        endpoint("", "a", "GET"),
        endpoint("", "b", "GET"),
        endpoint("", "c", "GET"),
    ]);
    let cache = EndpointCache::new(source, InvalidationFlag::new(), Some(2));
    cache.rebuild().unwrap();
    assert_eq!(cache.len(), 2);
    assert!(cache.resolve("v1", "c", "GET").is_err());
}

#[test]
fn test_not_found_message() {
    let source = CountingSource::new(vec![endpoint("", "users", "GET")]);
    let cache = EndpointCache::new(source, InvalidationFlag::new(), None);
    let err = cache.resolve("v1", "users", "DELETE").unwrap_err();
    assert!(matches!(err, EndpointError::NotFound { .. }));
    assert_eq!(err.to_string(), "not found: v1 users DELETE");
}

#[test]
fn test_catalog_writes_invalidate_the_cache() {
    use crate::store::{Catalog, EndpointDefinition};

    let catalog = Arc::new(Catalog::in_memory());
    let cache = EndpointCache::new(catalog.clone(), catalog.invalidation(), None);
    assert!(cache.resolve("v1", "late", "GET").is_err());

    let definition: EndpointDefinition = serde_yaml::from_str(
        "name: late\nmethod: GET\nresponses:\n  - name: DEFAULT\n    status: 200\n    body: '{}'\n",
    )
    .unwrap();
    catalog.import(&definition).unwrap();

    assert!(cache.resolve("v1", "late", "GET").is_ok());
}

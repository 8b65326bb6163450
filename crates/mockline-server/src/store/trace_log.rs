//! Persisted per-call trace logs.
//!
//! Lines are stored one entry each, keyed `<correlation id>_<index>` and
//! numbered `00001. <line>`.

use super::StoreError;
use parking_lot::RwLock;
use std::collections::BTreeMap;

pub trait TraceLogStore: Send + Sync {
    fn append(&self, correlation_id: &str, lines: &[String]) -> Result<(), StoreError>;

    /// Stored lines for one call, in order. Unknown ids yield an empty list.
    fn get(&self, correlation_id: &str) -> Result<Vec<String>, StoreError>;
}

#[derive(Default)]
pub struct InMemoryTraceLogStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl InMemoryTraceLogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TraceLogStore for InMemoryTraceLogStore {
    fn append(&self, correlation_id: &str, lines: &[String]) -> Result<(), StoreError> {
        if correlation_id.trim().is_empty() {
            return Err(StoreError::BlankId("trace log"));
        }
        let mut entries = self.entries.write();
        for (i, line) in lines.iter().enumerate() {
            entries.insert(
                format!("{correlation_id}_{i}"),
                format!("{:05}. {}", i + 1, line),
            );
        }
        Ok(())
    }

    fn get(&self, correlation_id: &str) -> Result<Vec<String>, StoreError> {
        let prefix = format!("{correlation_id}_");
        let entries = self.entries.read();
        let mut found: Vec<(usize, String)> = entries
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .filter_map(|(k, v)| {
                k[prefix.len()..]
                    .parse::<usize>()
                    .ok()
                    .map(|i| (i, v.clone()))
            })
            .collect();
        found.sort_by_key(|(i, _)| *i);
        Ok(found.into_iter().map(|(_, v)| v).collect())
    }
}

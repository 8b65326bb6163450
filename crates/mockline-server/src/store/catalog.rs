//! The catalog of mock endpoints.
//!
//! Owns the four entity stores and keeps them consistent: saving an endpoint
//! regenerates every variant's placeholder parameters, deleting one removes
//! what it owns. `load_endpoints` assembles the resolved shapes served by the
//! endpoint cache.

use super::definition::{is_valid_status, EndpointDefinition};
use super::{EntityStore, InMemoryStore, InvalidationFlag, StoreError};
use crate::call::CallHistory;
use crate::endpoint::{
    param_id, parse_actual_url, path_segments, AssignmentRecord, CallLogEntry, Condition,
    ConditionGroup, ConditionGroupRecord, Endpoint, EndpointError, EndpointRecord,
    EndpointSource, ParameterAssignment, ResponseParam, ResponseVariant, VariantRecord,
    DEFAULT_COLLECTION, DEFAULT_VARIANT_NAME,
};
use crate::flatten::{extract_placeholders, ContentType, DataType, FlattenError, ScalarValue};
use crate::substitution::{DELAY_KEY, HEADER_PREFIX};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Endpoint(#[from] EndpointError),

    #[error("Response '{variant}' has an invalid {part} template: {source}")]
    Template {
        variant: String,
        part: &'static str,
        #[source]
        source: FlattenError,
    },

    #[error("Invalid endpoint definition: {0}")]
    Invalid(String),
}

pub struct Catalog {
    endpoints: Arc<dyn EntityStore<EndpointRecord>>,
    params: Arc<dyn EntityStore<ResponseParam>>,
    conditions: Arc<dyn EntityStore<Condition>>,
    groups: Arc<dyn EntityStore<ConditionGroupRecord>>,
    invalidation: InvalidationFlag,
    /// Per-endpoint call history. Kept apart from the entity stores so that
    /// recording a call never invalidates the endpoint cache.
    call_logs: RwLock<HashMap<String, VecDeque<CallLogEntry>>>,
}

/// Most recent calls kept per endpoint; older entries are dropped first.
pub const MAX_CALL_LOG_ENTRIES: usize = 1000;

impl Catalog {
    /// A catalog backed by in-memory stores sharing one invalidation flag.
    pub fn in_memory() -> Self {
        let invalidation = InvalidationFlag::new();
        Self {
            endpoints: Arc::new(InMemoryStore::new(invalidation.clone())),
            params: Arc::new(InMemoryStore::new(invalidation.clone())),
            conditions: Arc::new(InMemoryStore::new(invalidation.clone())),
            groups: Arc::new(InMemoryStore::new(invalidation.clone())),
            invalidation,
            call_logs: RwLock::new(HashMap::new()),
        }
    }

    /// Flag raised by every write to the catalog.
    pub fn invalidation(&self) -> InvalidationFlag {
        self.invalidation.clone()
    }

    pub fn endpoint(&self, id: &str) -> Result<EndpointRecord, StoreError> {
        self.endpoints.get(id)
    }

    /// Recorded calls of an endpoint, oldest first.
    pub fn call_log(&self, endpoint_id: &str) -> Vec<CallLogEntry> {
        self.call_logs
            .read()
            .get(endpoint_id)
            .map(|log| log.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn params_for(&self, variant_id: &str) -> Result<Vec<ResponseParam>, StoreError> {
        self.params.list_by_owner(variant_id)
    }

    /// Normalise and save an endpoint, regenerating its placeholder params.
    pub fn save_endpoint(&self, mut record: EndpointRecord) -> Result<String, CatalogError> {
        record.method = record.method.trim().to_uppercase();
        record.name = record.name.trim().trim_matches('/').to_string();
        record.collection = record.collection.trim().to_string();
        if record.collection.is_empty() {
            record.collection = DEFAULT_COLLECTION.to_string();
        }
        if record.name.is_empty() {
            return Err(CatalogError::Invalid("endpoint name cannot be blank".into()));
        }
        check_variants(&record)?;

        record.parsed_url = parse_actual_url(&record.actual_url)?;
        record.path_params = path_segments(&record.parsed_url.path);

        if record.id.trim().is_empty() {
            record.id = format!("{}_{}", record.collection, uuid::Uuid::new_v4());
        }
        for variant in &mut record.variants {
            if variant.id.trim().is_empty() {
                variant.id = format!("{}_{}", record.id, uuid::Uuid::new_v4());
            }
        }

        // Drop params of variants that no longer exist.
        if let Ok(previous) = self.endpoints.get(&record.id) {
            let kept: HashSet<String> = record
                .variants
                .iter()
                .map(|v| v.id.to_uppercase())
                .collect();
            for old in previous
                .variants
                .iter()
                .filter(|v| !kept.contains(&v.id.to_uppercase()))
            {
                for param in self.params.list_by_owner(&old.id)? {
                    self.params.delete(&param.id)?;
                }
            }
        }

        for variant in &mut record.variants {
            self.rebuild_params(variant)?;
        }

        let id = self.endpoints.save(record)?;
        info!("Saved endpoint {}", id);
        Ok(id)
    }

    /// Regenerate a variant's params from its templates.
    ///
    /// Overrides already stored for keys that still exist are kept. Params
    /// for keys that disappeared are deleted.
    fn rebuild_params(&self, variant: &mut VariantRecord) -> Result<(), CatalogError> {
        let template_error = |part, source| CatalogError::Template {
            variant: variant.name.clone(),
            part,
            source,
        };
        let body = extract_placeholders(&variant.body, variant.body_type)
            .map_err(|e| template_error("body", e))?;
        let header = extract_placeholders(&variant.header, variant.header_type)
            .map_err(|e| template_error("header", e))?;

        let mut fresh: Vec<ResponseParam> = body
            .values
            .into_iter()
            .map(|(key, leaf)| ResponseParam::new(&variant.id, &key, leaf.value, leaf.datatype))
            .collect();
        for (key, leaf) in header.values {
            let name = header_name(&key, variant.header_type);
            fresh.push(ResponseParam::new(
                &variant.id,
                &format!("{HEADER_PREFIX}{name}"),
                ScalarValue::Str(leaf.value.to_string()),
                DataType::String,
            ));
        }
        fresh.push(ResponseParam::new(
            &variant.id,
            DELAY_KEY,
            ScalarValue::Str("0".to_string()),
            DataType::String,
        ));

        let existing = self.params.list_by_owner(&variant.id)?;
        let fresh_keys: HashSet<String> = fresh.iter().map(|p| p.key.to_uppercase()).collect();

        for mut param in fresh {
            if let Some(old) = existing
                .iter()
                .find(|old| old.key.eq_ignore_ascii_case(&param.key))
            {
                param.override_value = old.override_value.clone();
            }
            self.params.save(param)?;
        }
        for stale in existing
            .iter()
            .filter(|p| !fresh_keys.contains(&p.key.to_uppercase()))
        {
            debug!("Removing stale param {}", stale.id);
            self.params.delete(&stale.id)?;
        }

        variant.placeholder = body.template;
        Ok(())
    }

    /// Set the override expression of one variant param.
    pub fn set_override(
        &self,
        variant_id: &str,
        key: &str,
        expression: &str,
    ) -> Result<(), CatalogError> {
        let mut param = self.params.get(&param_id(variant_id, key))?;
        param.override_value = expression.to_string();
        self.params.save(param)?;
        Ok(())
    }

    pub fn save_condition(&self, condition: Condition) -> Result<String, CatalogError> {
        Ok(self.conditions.save(condition)?)
    }

    pub fn save_group(&self, group: ConditionGroupRecord) -> Result<String, CatalogError> {
        Ok(self.groups.save(group)?)
    }

    /// Delete an endpoint with its params, conditions and groups.
    pub fn delete_endpoint(&self, id: &str) -> Result<(), CatalogError> {
        let record = self.endpoints.get(id)?;
        for variant in &record.variants {
            for param in self.params.list_by_owner(&variant.id)? {
                self.params.delete(&param.id)?;
            }
        }
        for condition in self.conditions.list_by_owner(&record.id)? {
            self.conditions.delete(&condition.id)?;
        }
        for group in self.groups.list_by_owner(&record.id)? {
            self.groups.delete(&group.id)?;
        }
        self.endpoints.delete(&record.id)?;
        self.call_logs.write().remove(&record.id);
        Ok(())
    }

    /// Turn a declarative definition into stored entities.
    pub fn import(&self, definition: &EndpointDefinition) -> Result<String, CatalogError> {
        definition.validate().map_err(CatalogError::Invalid)?;

        let record = EndpointRecord {
            id: String::new(),
            collection: definition.collection.clone(),
            name: definition.name.clone(),
            method: definition.method.clone(),
            on_hold: definition.on_hold,
            enable_logging: definition.enable_logging,
            actual_url: definition.actual_url.clone(),
            parsed_url: Default::default(),
            path_params: Vec::new(),
            request_type: definition.request_type,
            variants: definition
                .responses
                .iter()
                .map(|r| VariantRecord {
                    id: String::new(),
                    name: r.name.clone(),
                    status: r.status,
                    body: r.body.clone(),
                    body_type: r.body_type,
                    header: r.headers.clone(),
                    header_type: r.header_type,
                    placeholder: String::new(),
                })
                .collect(),
        };
        let endpoint_id = self.save_endpoint(record)?;
        let saved = self.endpoints.get(&endpoint_id)?;

        let variant_id = |name: &str| {
            saved
                .variants
                .iter()
                .find(|v| v.name.eq_ignore_ascii_case(name))
                .map(|v| v.id.clone())
        };

        for response in &definition.responses {
            let Some(vid) = variant_id(&response.name) else {
                continue;
            };
            for (key, expression) in &response.overrides {
                self.set_override(&vid, key, expression).map_err(|_| {
                    CatalogError::Invalid(format!(
                        "response '{}' has no placeholder '{}'",
                        response.name, key
                    ))
                })?;
            }
        }

        for group in &definition.condition_groups {
            let mut condition_ids = Vec::with_capacity(group.conditions.len());
            for c in &group.conditions {
                let id = self.save_condition(Condition {
                    id: String::new(),
                    owner_id: endpoint_id.clone(),
                    name: if c.name.is_empty() {
                        format!("{} {} {}", c.variable, c.operator, c.value)
                    } else {
                        c.name.clone()
                    },
                    variable_key: c.variable.clone(),
                    operator: c.operator.trim().to_uppercase(),
                    value: c.value.clone(),
                    datatype: c.datatype,
                })?;
                condition_ids.push(id);
            }

            let target = group
                .response
                .as_deref()
                .and_then(variant_id)
                .unwrap_or_default();

            let mut assignments = Vec::with_capacity(group.assignments.len());
            for a in &group.assignments {
                let pid = param_id(&target, &a.key);
                if !a.key.starts_with('*') && self.params.get(&pid).is_err() {
                    return Err(CatalogError::Invalid(format!(
                        "condition group '{}' assigns unknown placeholder '{}'",
                        group.name, a.key
                    )));
                }
                assignments.push(AssignmentRecord {
                    param_id: pid,
                    key: a.key.clone(),
                    expression: a.value.clone(),
                });
            }

            self.save_group(ConditionGroupRecord {
                id: String::new(),
                owner_id: endpoint_id.clone(),
                name: group.name.clone(),
                condition_ids,
                target_variant_id: target,
                call_upstream: group.call_upstream,
                assignments,
            })?;
        }

        info!(
            "Imported endpoint {} {}/{}",
            saved.method, saved.collection, saved.name
        );
        Ok(endpoint_id)
    }

    /// Assemble the resolved, immutable shape of one stored endpoint.
    fn resolve(&self, record: EndpointRecord) -> Result<Endpoint, StoreError> {
        let mut variants = Vec::with_capacity(record.variants.len());
        for v in record.variants {
            let params = self.params.list_by_owner(&v.id)?;
            variants.push(ResponseVariant {
                id: v.id,
                name: v.name,
                status: v.status,
                body_type: v.body_type,
                placeholder: v.placeholder,
                params,
            });
        }

        let conditions: HashMap<String, Condition> = self
            .conditions
            .list_by_owner(&record.id)?
            .into_iter()
            .map(|c| (c.id.to_uppercase(), c))
            .collect();

        let mut group_records = self.groups.list_by_owner(&record.id)?;
        group_records.sort_by(|a, b| a.name.cmp(&b.name));

        let groups = group_records
            .into_iter()
            .map(|g| {
                let resolved_conditions = g
                    .condition_ids
                    .iter()
                    .filter_map(|id| {
                        let found = conditions.get(&id.to_uppercase()).cloned();
                        if found.is_none() {
                            warn!("Condition group {}: condition {} not found", g.name, id);
                        }
                        found
                    })
                    .collect();

                let assignments = g
                    .assignments
                    .iter()
                    .filter_map(|a| {
                        let param = variants
                            .iter()
                            .flat_map(|v| v.params.iter())
                            .find(|p| p.id.eq_ignore_ascii_case(&a.param_id))
                            .cloned()
                            .or_else(|| {
                                a.key.starts_with('*').then(|| {
                                    ResponseParam::new(
                                        &g.target_variant_id,
                                        &a.key,
                                        ScalarValue::Str(String::new()),
                                        DataType::String,
                                    )
                                })
                            });
                        if param.is_none() {
                            warn!("Condition group {}: param {} not found", g.name, a.param_id);
                        }
                        param.map(|param| ParameterAssignment {
                            param,
                            expression: a.expression.clone(),
                        })
                    })
                    .collect();

                ConditionGroup {
                    id: g.id,
                    name: g.name,
                    conditions: resolved_conditions,
                    target_variant_id: g.target_variant_id,
                    call_upstream: g.call_upstream,
                    assignments,
                }
            })
            .collect();

        Ok(Endpoint {
            id: record.id,
            collection: record.collection,
            name: record.name,
            method: record.method,
            on_hold: record.on_hold,
            enable_logging: record.enable_logging,
            actual_url: record.actual_url,
            parsed_url: record.parsed_url,
            path_params: record.path_params,
            request_type: record.request_type,
            variants,
            groups,
        })
    }
}

impl EndpointSource for Catalog {
    fn load_endpoints(&self, limit: Option<usize>) -> Result<Vec<Endpoint>, StoreError> {
        let mut out = Vec::new();
        for record in self.endpoints.list()? {
            if limit.is_some_and(|limit| out.len() >= limit) {
                debug!("Endpoint limit {:?} reached, skipping the rest", limit);
                break;
            }
            out.push(self.resolve(record)?);
        }
        Ok(out)
    }
}

impl CallHistory for Catalog {
    fn record_call(&self, endpoint_id: &str, entry: CallLogEntry) -> Result<(), StoreError> {
        let record = self.endpoints.get(endpoint_id)?;
        if !record.enable_logging {
            return Ok(());
        }
        let mut logs = self.call_logs.write();
        let log = logs.entry(record.id).or_default();
        if log.len() >= MAX_CALL_LOG_ENTRIES {
            log.pop_front();
        }
        log.push_back(entry);
        Ok(())
    }
}

fn check_variants(record: &EndpointRecord) -> Result<(), CatalogError> {
    let defaults = record
        .variants
        .iter()
        .filter(|v| v.name.eq_ignore_ascii_case(DEFAULT_VARIANT_NAME))
        .count();
    if defaults > 1 {
        return Err(CatalogError::Invalid(format!(
            "at most one response may be named {DEFAULT_VARIANT_NAME}"
        )));
    }
    let mut seen = HashSet::new();
    for v in &record.variants {
        if !is_valid_status(v.status) {
            return Err(CatalogError::Invalid(format!(
                "response {} has invalid status {}",
                v.name, v.status
            )));
        }
        if !seen.insert((v.status, v.name.to_uppercase())) {
            return Err(CatalogError::Invalid(format!(
                "duplicate response {} {}",
                v.status, v.name
            )));
        }
    }
    Ok(())
}

/// Header name from a flattened header-template key. XML templates wrap
/// headers in a root element, which is dropped.
fn header_name(key: &str, content_type: ContentType) -> &str {
    match content_type {
        ContentType::Json => key,
        ContentType::Xml => key.split_once('.').map(|(_, rest)| rest).unwrap_or(key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::EndpointCache;
    use crate::store::definition::{AssignmentDefinition, VariantDefinition};

    fn users_definition() -> EndpointDefinition {
        serde_yaml::from_str(
            r#"
collection: shop
name: /users/
method: get
actualUrl: http://upstream.local/users/{id}?v=1
enableLogging: true
responses:
  - name: DEFAULT
    status: 200
    body: '{"id":"1","age":30}'
    headers: '{"X-Mock":"yes"}'
    overrides:
      id: "REQUEST[id]:id"
  - name: NOT_FOUND
    status: 404
    body: '{"error":"not found"}'
conditionGroups:
  - name: b second
    conditions:
      - variable: id
        operator: equals_to
        value: "7"
    response: DEFAULT
  - name: a first
    conditions:
      - variable: id
        operator: EQUALS_TO
        value: "42"
    response: NOT_FOUND
    assignments:
      - key: "*DELAY_RESPONSE_MILLI_SEC"
        value: "5"
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_import_builds_params_and_groups() {
        let catalog = Catalog::in_memory();
        let id = catalog.import(&users_definition()).unwrap();
        let record = catalog.endpoint(&id).unwrap();

        assert_eq!(record.method, "GET");
        assert_eq!(record.name, "users");
        assert_eq!(record.parsed_url.host, "upstream.local");
        assert_eq!(record.path_params.len(), 2);
        assert_eq!(record.variants[0].placeholder, r#"{"id":"{{id}}","age":"{{age}}"}"#);

        let params = catalog.params_for(&record.variants[0].id).unwrap();
        let keys: Vec<&str> = params.iter().map(|p| p.key.as_str()).collect();
        assert!(keys.contains(&"id"));
        assert!(keys.contains(&"age"));
        assert!(keys.contains(&"*HEADER_X-Mock"));
        assert!(keys.contains(&DELAY_KEY));
        let id_param = params.iter().find(|p| p.key == "id").unwrap();
        assert_eq!(id_param.override_value, "REQUEST[id]:id");

        let endpoints = catalog.load_endpoints(None).unwrap();
        assert_eq!(endpoints.len(), 1);
        let groups = &endpoints[0].groups;
        assert_eq!(groups[0].name, "a first");
        assert_eq!(groups[0].assignments.len(), 1);
        assert_eq!(groups[0].assignments[0].param.key, DELAY_KEY);
        assert_eq!(groups[1].conditions[0].operator, "EQUALS_TO");
    }

    #[test]
    fn test_resave_keeps_overrides_and_drops_stale_keys() {
        let catalog = Catalog::in_memory();
        let id = catalog.import(&users_definition()).unwrap();
        let mut record = catalog.endpoint(&id).unwrap();
        record.variants[0].body = r#"{"id":"1","name":"x"}"#.to_string();
        catalog.save_endpoint(record.clone()).unwrap();

        let params = catalog.params_for(&record.variants[0].id).unwrap();
        assert!(params.iter().any(|p| p.key == "name"));
        assert!(!params.iter().any(|p| p.key == "age"));
        let id_param = params.iter().find(|p| p.key == "id").unwrap();
        assert_eq!(id_param.override_value, "REQUEST[id]:id");
    }

    #[test]
    fn test_removed_variant_loses_params() {
        let catalog = Catalog::in_memory();
        let id = catalog.import(&users_definition()).unwrap();
        let mut record = catalog.endpoint(&id).unwrap();
        let removed = record.variants.pop().unwrap();
        catalog.save_endpoint(record).unwrap();
        assert!(catalog.params_for(&removed.id).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_template_rejected() {
        let catalog = Catalog::in_memory();
        let mut def = users_definition();
        def.responses[1].body = "{broken".to_string();
        assert!(matches!(
            catalog.import(&def),
            Err(CatalogError::Template { part: "body", .. })
        ));
    }

    #[test]
    fn test_saved_record_with_invalid_status_rejected() {
        let catalog = Catalog::in_memory();
        let id = catalog.import(&users_definition()).unwrap();
        let mut record = catalog.endpoint(&id).unwrap();
        record.variants[1].status = 42;
        assert!(matches!(
            catalog.save_endpoint(record),
            Err(CatalogError::Invalid(msg)) if msg.contains("invalid status")
        ));
        assert_eq!(catalog.endpoint(&id).unwrap().variants[1].status, 404);
    }

    #[test]
    fn test_unknown_override_key_rejected() {
        let catalog = Catalog::in_memory();
        let mut def = users_definition();
        def.responses[1]
            .overrides
            .insert("missing".to_string(), "x".to_string());
        assert!(matches!(catalog.import(&def), Err(CatalogError::Invalid(_))));
    }

    #[test]
    fn test_unknown_assignment_key_rejected() {
        let catalog = Catalog::in_memory();
        let mut def = users_definition();
        def.condition_groups[0].assignments.push(AssignmentDefinition {
            key: "nope".to_string(),
            value: "x".to_string(),
        });
        assert!(matches!(catalog.import(&def), Err(CatalogError::Invalid(_))));
    }

    #[test]
    fn test_blank_collection_defaults() {
        let catalog = Catalog::in_memory();
        let mut def = users_definition();
        def.collection = String::new();
        let id = catalog.import(&def).unwrap();
        assert_eq!(catalog.endpoint(&id).unwrap().collection, DEFAULT_COLLECTION);
    }

    #[test]
    fn test_load_limit_stops_early() {
        let catalog = Catalog::in_memory();
        for name in ["a", "b", "c"] {
            let mut def = users_definition();
            def.name = name.to_string();
            catalog.import(&def).unwrap();
        }
        assert_eq!(catalog.load_endpoints(Some(2)).unwrap().len(), 2);
        assert_eq!(catalog.load_endpoints(None).unwrap().len(), 3);
    }

    #[test]
    fn test_delete_endpoint_cascades() {
        let catalog = Arc::new(Catalog::in_memory());
        let id = catalog.import(&users_definition()).unwrap();
        let variant_id = catalog.endpoint(&id).unwrap().variants[0].id.clone();
        catalog.delete_endpoint(&id).unwrap();
        assert!(catalog.params_for(&variant_id).unwrap().is_empty());

        let cache = EndpointCache::new(catalog.clone(), catalog.invalidation(), None);
        assert!(cache.resolve("shop", "users", "get").is_err());
    }

    #[test]
    fn test_record_call_only_when_logging_enabled() {
        let catalog = Catalog::in_memory();
        let id = catalog.import(&users_definition()).unwrap();
        let entry = CallLogEntry {
            correlation_id: "c1".to_string(),
            called_at: chrono::Utc::now(),
        };
        catalog.record_call(&id, entry.clone()).unwrap();
        assert_eq!(catalog.call_log(&id), vec![entry.clone()]);

        let mut quiet = users_definition();
        quiet.name = "quiet".to_string();
        quiet.enable_logging = false;
        let quiet_id = catalog.import(&quiet).unwrap();
        catalog.record_call(&quiet_id, entry).unwrap();
        assert!(catalog.call_log(&quiet_id).is_empty());
    }

    #[test]
    fn test_record_call_keeps_cache_valid() {
        let catalog = Arc::new(Catalog::in_memory());
        let id = catalog.import(&users_definition()).unwrap();
        let cache = EndpointCache::new(catalog.clone(), catalog.invalidation(), None);
        let first = cache.resolve("shop", "users", "GET").unwrap();
        assert!(!catalog.invalidation().is_raised());

        for n in 0..3 {
            let entry = CallLogEntry {
                correlation_id: format!("c{n}"),
                called_at: chrono::Utc::now(),
            };
            catalog.record_call(&id, entry).unwrap();
            assert!(!catalog.invalidation().is_raised());
        }

        let again = cache.resolve("shop", "users", "GET").unwrap();
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(catalog.call_log(&id).len(), 3);
    }

    #[test]
    fn test_call_log_drops_oldest_past_cap() {
        let catalog = Catalog::in_memory();
        let id = catalog.import(&users_definition()).unwrap();
        for n in 0..MAX_CALL_LOG_ENTRIES + 5 {
            let entry = CallLogEntry {
                correlation_id: format!("c{n}"),
                called_at: chrono::Utc::now(),
            };
            catalog.record_call(&id, entry).unwrap();
        }
        let log = catalog.call_log(&id);
        assert_eq!(log.len(), MAX_CALL_LOG_ENTRIES);
        assert_eq!(log[0].correlation_id, "c5");

        catalog.delete_endpoint(&id).unwrap();
        assert!(catalog.call_log(&id).is_empty());
    }

    #[test]
    fn test_xml_header_template_names() {
        let catalog = Catalog::in_memory();
        let mut def = users_definition();
        def.responses = vec![VariantDefinition {
            name: "DEFAULT".to_string(),
            status: 200,
            body: "<user><id>1</id></user>".to_string(),
            body_type: ContentType::Xml,
            headers: "<headers><X-Trace>t</X-Trace></headers>".to_string(),
            header_type: ContentType::Xml,
            overrides: Default::default(),
        }];
        def.condition_groups.clear();
        let id = catalog.import(&def).unwrap();
        let vid = catalog.endpoint(&id).unwrap().variants[0].id.clone();
        let params = catalog.params_for(&vid).unwrap();
        assert!(params.iter().any(|p| p.key == "*HEADER_X-Trace"));
        assert!(params
            .iter()
            .any(|p| p.key == "user.id" && p.default_datatype == DataType::XmlString));
    }
}

//! Shared builders for unit tests.

use crate::call::Call;
use crate::endpoint::{Endpoint, EndpointSource};
use crate::flatten::{FlatMap, FlatValue};
use crate::store::{Catalog, EndpointDefinition};

/// `GET /api/v1/users/{id}`: `id == 42` selects NOT_FOUND, DEFAULT echoes the id.
pub const USERS_YAML: &str = r#"
name: users
method: GET
actualUrl: http://upstream.invalid/{id}
responses:
  - name: DEFAULT
    status: 200
    body: '{"id":"1"}'
    overrides:
      id: "REQUEST[id]:id"
  - name: NOT_FOUND
    status: 404
    body: '{"error":"user not found"}'
conditionGroups:
  - name: missing user
    conditions:
      - variable: id
        operator: EQUALS_TO
        value: "42"
    response: NOT_FOUND
"#;

/// Import one YAML definition and return the resolved endpoint.
pub fn endpoint_from_yaml(yaml: &str) -> Endpoint {
    let catalog = Catalog::in_memory();
    let definition: EndpointDefinition = serde_yaml::from_str(yaml).unwrap();
    catalog.import(&definition).unwrap();
    catalog.load_endpoints(None).unwrap().remove(0)
}

pub fn request(pairs: &[(&str, &str)]) -> FlatMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), FlatValue::string(*v)))
        .collect()
}

pub fn call_for(endpoint: &Endpoint, pairs: &[(&str, &str)]) -> Call {
    Call::new("test-call", endpoint, request(pairs), Vec::new())
}

pub fn variant_id(endpoint: &Endpoint, name: &str) -> String {
    endpoint
        .variants
        .iter()
        .find(|v| v.name == name)
        .map(|v| v.id.clone())
        .unwrap()
}

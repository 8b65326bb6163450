use super::*;
use crate::fixtures::{call_for, endpoint_from_yaml, variant_id, USERS_YAML};
use crate::flatten::{DataType, FlatValue};

fn param(owner: &str, key: &str, default: &str, datatype: DataType) -> ResponseParam {
    ResponseParam::new(owner, key, ScalarValue::from(default), datatype)
}

fn fixed_random() -> Substituter {
    Substituter::new(Arc::new(
        RandomRegistry::empty().with("NAME", || "Grace".to_string()),
    ))
}

#[test]
fn test_resolve_override_sources() {
    let sub = fixed_random();
    let mut request = FlatMap::new();
    request.insert("user.id".to_string(), FlatValue::new(ScalarValue::Int(9), DataType::Int));

    assert_eq!(
        sub.resolve_override("REQUEST[body]:user.id", &request).unwrap(),
        ScalarValue::Int(9)
    );
    assert_eq!(
        sub.resolve_override("*RANDOM:NAME", &request).unwrap(),
        ScalarValue::Str("Grace".to_string())
    );
    assert_eq!(
        sub.resolve_override("plain text", &request).unwrap(),
        ScalarValue::Str("plain text".to_string())
    );
    // Only the first colon splits.
    assert_eq!(
        sub.resolve_override("time:10:30", &request).unwrap(),
        ScalarValue::Str("time:10:30".to_string())
    );
}

#[test]
fn test_resolve_override_errors() {
    let sub = fixed_random();
    let request = FlatMap::new();
    assert!(matches!(
        sub.resolve_override("REQUEST[query]:nope", &request),
        Err(SubstitutionError::MissingRequestKey(_))
    ));
    assert!(matches!(
        sub.resolve_override("*RANDOM:NOPE", &request),
        Err(SubstitutionError::UnknownGenerator(_))
    ));
}

#[test]
fn test_process_uses_default_when_nothing_assigned() {
    let endpoint = endpoint_from_yaml(USERS_YAML);
    let not_found = variant_id(&endpoint, "NOT_FOUND");
    let mut call = call_for(&endpoint, &[]);

    let p = param(&not_found, "error", "gone", DataType::String);
    Substituter::default().process(&mut call, &not_found, &p, "");

    assert_eq!(call.variant(&not_found).unwrap().body, r#"{"error":"gone"}"#);
}

#[test]
fn test_process_falls_back_to_literal_on_missing_request_key() {
    let endpoint = endpoint_from_yaml(USERS_YAML);
    let not_found = variant_id(&endpoint, "NOT_FOUND");
    let mut call = call_for(&endpoint, &[]);

    let mut p = param(&not_found, "error", "fallback", DataType::String);
    p.override_value = "REQUEST[query]:missing_key".to_string();
    Substituter::default().process(&mut call, &not_found, &p, "");

    assert_eq!(
        call.variant(&not_found).unwrap().body,
        r#"{"error":"REQUEST[query]:missing_key"}"#
    );
    assert!(call
        .trace
        .lines()
        .iter()
        .any(|l| l.starts_with("ERROR") && l.contains("missing_key")));
}

#[test]
fn test_process_numeric_values_are_unquoted() {
    let endpoint = endpoint_from_yaml(
        r#"
name: totals
method: GET
responses:
  - name: DEFAULT
    status: 200
    body: '{"count":1,"ratio":0.5,"ok":true}'
"#,
    );
    let default = variant_id(&endpoint, "DEFAULT");
    let mut call = call_for(&endpoint, &[("n", "12")]);
    let sub = Substituter::default();

    sub.process(&mut call, &default, &param(&default, "count", "0", DataType::Int), "REQUEST[query]:n");
    sub.process(&mut call, &default, &param(&default, "ratio", "0", DataType::Float64), "2.5");
    sub.process(&mut call, &default, &param(&default, "ok", "true", DataType::Bool), "0");

    assert_eq!(
        call.variant(&default).unwrap().body,
        r#"{"count":12,"ratio":2.5,"ok":false}"#
    );
}

#[test]
fn test_process_second_write_is_a_no_op() {
    let endpoint = endpoint_from_yaml(USERS_YAML);
    let not_found = variant_id(&endpoint, "NOT_FOUND");
    let mut call = call_for(&endpoint, &[]);
    let sub = Substituter::default();
    let p = param(&not_found, "error", "x", DataType::String);

    sub.process(&mut call, &not_found, &p, "first");
    sub.process(&mut call, &not_found, &p, "second");

    assert_eq!(call.variant(&not_found).unwrap().body, r#"{"error":"first"}"#);
}

#[test]
fn test_specials_first_writer_wins() {
    let endpoint = endpoint_from_yaml(USERS_YAML);
    let default = variant_id(&endpoint, "DEFAULT");
    let mut call = call_for(&endpoint, &[]);
    let sub = Substituter::default();

    let status = param(&default, STATUS_CODE_KEY, "", DataType::String);
    sub.process(&mut call, &default, &status, "201");
    sub.process(&mut call, &default, &status, "202");
    assert_eq!(call.variant(&default).unwrap().final_status(), 201);

    let delay = param(&default, DELAY_KEY, "0", DataType::String);
    sub.process(&mut call, &default, &delay, "(10,20)");
    sub.process(&mut call, &default, &delay, "5");
    assert_eq!(call.delay_for(&default), Some("(10,20)"));

    let header = param(&default, "*HEADER_X-Trace", "", DataType::String);
    sub.process(&mut call, &default, &header, "abc");
    sub.process(&mut call, &default, &header, "def");
    assert_eq!(
        call.variant(&default).unwrap().headers.get("X-Trace").map(String::as_str),
        Some("abc")
    );
}

#[test]
fn test_invalid_status_code_is_ignored() {
    let endpoint = endpoint_from_yaml(USERS_YAML);
    let default = variant_id(&endpoint, "DEFAULT");
    let mut call = call_for(&endpoint, &[]);
    let sub = Substituter::default();
    let status = param(&default, STATUS_CODE_KEY, "", DataType::String);

    sub.process(&mut call, &default, &status, "299");
    assert_eq!(call.variant(&default).unwrap().final_status(), 200);

    // Not claimed, so a later valid code still applies.
    sub.process(&mut call, &default, &status, "418");
    assert_eq!(call.variant(&default).unwrap().final_status(), 418);
}

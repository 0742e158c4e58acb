//! Unit tests for payload validation.
//!
//! Run with: cargo test --test validate_unit_test

use datalab_db::validate::{ParamType, Reply, checked, type_name, validate, validate_optional};
use serde::Deserialize;
use serde_json::json;

#[test]
fn accepts_complete_payload_and_ignores_extra_fields() {
    let payload = json!({ "userID": 3, "projectName": "gait", "extra": [1, 2] });
    let errors = validate(
        &[
            ("userID", ParamType::Integer),
            ("projectName", ParamType::String),
        ],
        &payload,
    );
    assert!(errors.is_empty(), "{errors:?}");
}

#[test]
fn reports_one_message_per_violated_field() {
    let payload = json!({ "userID": "3", "flag": true });
    let errors = validate(
        &[
            ("userID", ParamType::Integer),
            ("projectName", ParamType::String),
            ("flag", ParamType::Boolean),
        ],
        &payload,
    );
    assert_eq!(
        errors,
        vec![
            "Param userID has not type integer, but type string".to_string(),
            "Param projectName not set".to_string(),
        ]
    );
}

#[test]
fn null_counts_as_not_set() {
    let errors = validate(&[("label", ParamType::Object)], &json!({ "label": null }));
    assert_eq!(errors, vec!["Param label not set".to_string()]);
}

#[test]
fn non_object_payload_has_no_fields() {
    let errors = validate(
        &[("a", ParamType::Integer), ("b", ParamType::Array)],
        &json!([1, 2, 3]),
    );
    assert_eq!(errors, vec!["Param a not set", "Param b not set"]);
}

#[test]
fn numeric_types_are_distinguished() {
    let payload = json!({ "i": 1, "d": 0.625, "big": 1e3 });

    assert!(validate(&[("i", ParamType::Integer)], &payload).is_empty());
    assert!(validate(&[("d", ParamType::Double)], &payload).is_empty());
    assert!(validate(&[("big", ParamType::Double)], &payload).is_empty());
    assert!(validate(&[("i", ParamType::Number), ("d", ParamType::Number)], &payload).is_empty());

    assert_eq!(
        validate(&[("i", ParamType::Double)], &payload),
        vec!["Param i has not type double, but type integer"]
    );
    assert_eq!(
        validate(&[("d", ParamType::Integer)], &payload),
        vec!["Param d has not type integer, but type double"]
    );
}

#[test]
fn type_names_cover_all_json_values() {
    assert_eq!(type_name(&json!(null)), "null");
    assert_eq!(type_name(&json!(false)), "boolean");
    assert_eq!(type_name(&json!(7)), "integer");
    assert_eq!(type_name(&json!(7.5)), "double");
    assert_eq!(type_name(&json!("x")), "string");
    assert_eq!(type_name(&json!([])), "array");
    assert_eq!(type_name(&json!({})), "object");
}

#[test]
fn optional_fields_are_only_checked_when_present() {
    let payload = json!({ "start": "soon" });
    let errors = validate_optional(
        &[("start", ParamType::Number), ("end", ParamType::Number)],
        &payload,
    );
    assert_eq!(errors, vec!["Param start has not type number, but type string"]);
}

#[derive(Debug, Deserialize)]
struct Ids {
    #[serde(rename = "userID")]
    user_id: i32,
}

#[test]
fn checked_keeps_validation_messages() {
    let payload = json!({});
    let errors = validate(&[("userID", ParamType::Integer)], &payload);
    let result: Result<Ids, _> = checked(errors, &payload);
    assert_eq!(result.unwrap_err(), vec!["Param userID not set"]);
}

#[test]
fn checked_reports_out_of_range_ids() {
    let payload = json!({ "userID": 5_000_000_000_i64 });
    let errors = validate(&[("userID", ParamType::Integer)], &payload);
    assert!(errors.is_empty());

    let result: Result<Ids, _> = checked(errors, &payload);
    let messages = result.unwrap_err();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].starts_with("Invalid parameters:"), "{messages:?}");
}

#[test]
fn checked_decodes_valid_payload() {
    let payload = json!({ "userID": 12 });
    let ids: Ids = checked(Vec::new(), &payload).unwrap();
    assert_eq!(ids.user_id, 12);
}

#[test]
fn reply_serializes_untagged() {
    let done: Reply<serde_json::Value> = Reply::Done(json!({ "projectID": 1 }));
    assert_eq!(serde_json::to_value(&done).unwrap(), json!({ "projectID": 1 }));

    let rejected: Reply<serde_json::Value> = Reply::rejected(vec!["Param x not set".into()]);
    assert!(rejected.is_rejected());
    assert_eq!(
        serde_json::to_value(&rejected).unwrap(),
        json!({ "error": ["Param x not set"] })
    );
}

//! Integration tests for instance migration across definition versions.
//!
//! Each test loads two versions of a definition from JSON, creates or loads
//! an instance against the old one and upgrades it to the new one.

use formwork_fields::{
    create_instance_from_definition, load_definition, load_instance, upgrade_instance,
    FieldValues, FormInstance, HookError, MigrationError, MigrationOptions, UnknownKeyPolicy,
};
use serde_json::{json, Value};
use std::borrow::Cow;

fn v1() -> &'static str {
    r#"{
        "name": "profile", "version": "1",
        "properties": [
            {"name": "age", "type": "string"},
            {"name": "subscribed", "type": "string", "defaultValue": "no"},
            {"name": "height", "type": "number", "defaultValue": 170},
            {"name": "tags", "type": "string", "defaultValue": "a,b"},
            {"name": "legacy", "type": "string"}
        ]
    }"#
}

fn v2() -> &'static str {
    r#"{
        "name": "profile", "version": "2",
        "properties": [
            {"name": "age", "type": "number"},
            {"name": "subscribed", "type": "boolean"},
            {"name": "height", "type": "unit", "dimension": "length", "defaultUnit": "cm"},
            {"name": "tags", "type": "string-array"},
            {"name": "country", "type": "select", "defaultValue": "NZ"}
        ]
    }"#
}

fn instance(values: Value) -> FormInstance {
    load_instance(
        &json!({"name": "me", "definition": "profile", "version": "1", "values": values})
            .to_string(),
    )
    .unwrap()
}

#[test_log::test]
fn test_same_version_is_returned_unchanged() {
    let definition = load_definition(v1()).unwrap();
    let old = instance(json!({"age": "abc", "mystery": [1, 2]}));

    let upgraded = upgrade_instance(&old, &definition, &MigrationOptions::default(), None).unwrap();

    assert!(matches!(upgraded, Cow::Borrowed(_)));
    assert_eq!(upgraded.values, old.values);
}

#[test_log::test]
fn test_full_upgrade_coerces_each_field() {
    let definition = load_definition(v2()).unwrap();
    let old = instance(json!({
        "age": "42",
        "subscribed": "yes",
        "height": 180,
        "tags": "x, y",
        "legacy": "gone"
    }));

    let upgraded = upgrade_instance(&old, &definition, &MigrationOptions::default(), None)
        .unwrap()
        .into_owned();

    assert_eq!(upgraded.version, "2");
    assert_eq!(upgraded.values["age"], json!(42));
    assert_eq!(upgraded.values["subscribed"], json!(true));
    assert_eq!(upgraded.values["height"], json!([180, "cm"]));
    assert_eq!(upgraded.values["tags"], json!(["x", "y"]));
    assert_eq!(upgraded.values["country"], json!("NZ"));
    assert!(!upgraded.values.contains_key("legacy"));
}

#[test_log::test]
fn test_unparsable_number_falls_back_to_zero() {
    let definition = load_definition(v2()).unwrap();
    let old = instance(json!({"age": "abc"}));

    let upgraded =
        upgrade_instance(&old, &definition, &MigrationOptions::default(), None).unwrap();

    assert_eq!(upgraded.values["age"], json!(0));
}

#[test_log::test]
fn test_strict_mode_refuses_fallbacks() {
    let definition = load_definition(v2()).unwrap();
    let old = instance(json!({"age": "abc"}));
    let options = MigrationOptions::default().with_strict(true);

    let err = upgrade_instance(&old, &definition, &options, None).unwrap_err();
    match err {
        MigrationError::Coercion { field, expected, .. } => {
            assert_eq!(field, "age");
            assert_eq!(expected, "number");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let exact = instance(json!({"age": "7"}));
    let upgraded = upgrade_instance(&exact, &definition, &options, None).unwrap();
    assert_eq!(upgraded.values["age"], json!(7));
}

#[test_log::test]
fn test_explicit_converter_wins() {
    let definition = load_definition(v2()).unwrap();
    let old = instance(json!({"age": "forty-two", "subscribed": "maybe"}));
    let options = MigrationOptions::default()
        .with_strict(true)
        .with_converter("age", |v| match v.as_str() {
            Some("forty-two") => Ok(json!(42)),
            _ => Err(format!("cannot read {v}")),
        })
        .with_converter("subscribed", |_| Ok(json!(false)));

    let upgraded = upgrade_instance(&old, &definition, &options, None).unwrap();
    assert_eq!(upgraded.values["age"], json!(42));
    assert_eq!(upgraded.values["subscribed"], json!(false));

    let refused = instance(json!({"age": "eleventy"}));
    let err = upgrade_instance(&refused, &definition, &options, None).unwrap_err();
    assert!(err.to_string().contains("eleventy"));
}

#[test_log::test]
fn test_unknown_keys_preserved_on_request() {
    let definition = load_definition(v2()).unwrap();
    let old = instance(json!({"legacy": "kept", "age": 3}));
    let options = MigrationOptions::default().with_unknown_keys(UnknownKeyPolicy::Preserve);

    let upgraded = upgrade_instance(&old, &definition, &options, None).unwrap();
    assert_eq!(upgraded.values["legacy"], json!("kept"));
    assert_eq!(upgraded.values["age"], json!(3));
}

#[test_log::test]
fn test_hook_adjusts_values() {
    let definition = load_definition(v2()).unwrap();
    let old = instance(json!({"age": "30"}));
    let hook = |values: &mut FieldValues, old: &FormInstance| -> Result<(), HookError> {
        values.insert("country".into(), json!(format!("from-{}", old.version)));
        Ok(())
    };

    let upgraded =
        upgrade_instance(&old, &definition, &MigrationOptions::default(), Some(&hook)).unwrap();
    assert_eq!(upgraded.values["country"], json!("from-1"));
}

#[test_log::test]
fn test_hook_error_aborts_migration() {
    let definition = load_definition(v2()).unwrap();
    let old = instance(json!({}));
    let hook =
        |_: &mut FieldValues, _: &FormInstance| -> Result<(), HookError> { Err("no thanks".into()) };

    let err =
        upgrade_instance(&old, &definition, &MigrationOptions::default(), Some(&hook)).unwrap_err();
    assert_eq!(
        err,
        MigrationError::Hook {
            message: "no thanks".into()
        }
    );
}

#[test_log::test]
fn test_hook_panic_becomes_migration_error() {
    let definition = load_definition(v2()).unwrap();
    let old = instance(json!({}));
    let hook = |_: &mut FieldValues, _: &FormInstance| -> Result<(), HookError> {
        panic!("hook exploded")
    };

    let err =
        upgrade_instance(&old, &definition, &MigrationOptions::default(), Some(&hook)).unwrap_err();
    match err {
        MigrationError::Hook { message } => assert!(message.contains("hook exploded")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test_log::test]
fn test_defaults_instance_survives_upgrade() {
    let old_definition = load_definition(v1()).unwrap();
    let new_definition = load_definition(v2()).unwrap();
    let old = create_instance_from_definition(&old_definition, "fresh");

    let upgraded =
        upgrade_instance(&old, &new_definition, &MigrationOptions::default(), None).unwrap();

    assert_eq!(upgraded.values["subscribed"], json!(false));
    assert_eq!(upgraded.values["height"], json!([170, "cm"]));
    assert_eq!(upgraded.values["tags"], json!(["a", "b"]));
    assert_eq!(upgraded.values["age"], Value::Null);
}

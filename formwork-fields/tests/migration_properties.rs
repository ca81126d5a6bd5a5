//! Property tests for lenient migration.

use formwork_fields::{
    upgrade_instance, FieldDefinition, FieldType, FieldValues, FormDefinition, FormInstance,
    MigrationOptions,
};
use proptest::prelude::*;
use serde_json::Value;

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-1.0e6f64..1.0e6).prop_map(|n| serde_json::json!(n)),
        "[a-z0-9 ,.-]{0,12}".prop_map(Value::String),
    ]
}

fn value() -> impl Strategy<Value = Value> {
    prop_oneof![
        scalar(),
        prop::collection::vec(scalar(), 0..4).prop_map(Value::Array),
    ]
}

fn every_type_definition() -> FormDefinition {
    let fields = FieldType::BUILT_IN
        .iter()
        .map(|t| FieldDefinition::new(t.as_str(), t.clone()))
        .collect();
    FormDefinition::new("all", "2", fields)
}

proptest! {
    #[test]
    fn lenient_migration_always_succeeds(v in value()) {
        let definition = every_type_definition();
        let values: FieldValues = definition
            .field_names()
            .map(|name| (name.to_string(), v.clone()))
            .collect();
        let old = FormInstance::new("i", "all", "1", values);

        let upgraded = upgrade_instance(&old, &definition, &MigrationOptions::default(), None);
        prop_assert!(upgraded.is_ok());
        let upgraded = upgraded.unwrap();
        prop_assert_eq!(upgraded.values.len(), definition.len());
    }

    #[test]
    fn migrated_numbers_are_numbers_or_null(v in value()) {
        let definition = FormDefinition::new(
            "n",
            "2",
            vec![FieldDefinition::new("n", FieldType::Number)],
        );
        let mut values = FieldValues::new();
        values.insert("n".into(), v);
        let old = FormInstance::new("i", "n", "1", values);

        let upgraded = upgrade_instance(&old, &definition, &MigrationOptions::default(), None).unwrap();
        let n = &upgraded.values["n"];
        prop_assert!(n.is_number() || n.is_null());
    }
}

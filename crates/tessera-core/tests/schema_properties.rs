//! Property tests for the schema algebra.

use proptest::prelude::*;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tessera_core::schema::{final_input_schema, flatten_to_object_variants, intersect};
use tessera_core::{ObjectSchema, Schema};

fn field_names() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::btree_set("[a-z]{1,6}", 1..6).prop_map(|set| set.into_iter().collect())
}

fn described_fields() -> impl Strategy<Value = BTreeMap<String, (String, String)>> {
    proptest::collection::btree_map("[a-z]{1,6}", ("[A-Za-z ]{1,12}", "[a-z0-9]{1,8}"), 1..8)
}

fn described_object(fields: &[(&String, &(String, String))]) -> Schema {
    fields
        .iter()
        .fold(ObjectSchema::new(), |object, (name, (description, example))| {
            object.field(
                (*name).clone(),
                Schema::string().describe(description.clone()).example(example.clone()),
            )
        })
        .into()
}

fn object_of(names: &[String]) -> Schema {
    names
        .iter()
        .fold(ObjectSchema::new(), |object, name| object.field(name.clone(), Schema::string()))
        .into()
}

proptest! {
    #[test]
    fn intersection_accepts_exactly_what_both_sides_accept(
        names in field_names(),
        split in 0usize..6,
    ) {
        let split = split.min(names.len());
        let (left, right) = names.split_at(split);
        let schema = intersect(object_of(left), object_of(right));
        let value: Value = names.iter().map(|name| (name.clone(), json!("v"))).collect::<serde_json::Map<_, _>>().into();
        prop_assert_eq!(schema.parse(&value).unwrap(), value);
    }

    #[test]
    fn disjoint_final_input_flattens_to_all_fields(
        names in field_names(),
        split in 0usize..6,
    ) {
        let split = split.min(names.len());
        let (left, right) = names.split_at(split);
        let schema = final_input_schema(&[object_of(left)], &object_of(right)).unwrap();
        let variants = flatten_to_object_variants(&schema);
        prop_assert_eq!(variants.len(), 1);
        let mut keys: Vec<String> = variants[0].fields().keys().cloned().collect();
        keys.sort();
        let mut expected = names.clone();
        expected.sort();
        prop_assert_eq!(keys, expected);
    }

    #[test]
    fn final_input_keeps_field_metadata(
        fields in described_fields(),
        count in 1usize..5,
    ) {
        let entries: Vec<(&String, &(String, String))> = fields.iter().collect();
        let mut constituents: Vec<Schema> = (0..count)
            .map(|index| {
                let own: Vec<_> = entries
                    .iter()
                    .enumerate()
                    .filter(|(position, _)| position % count == index)
                    .map(|(_, entry)| *entry)
                    .collect();
                described_object(&own)
            })
            .collect();
        let endpoint_input = constituents.pop().unwrap();

        let schema = final_input_schema(&constituents, &endpoint_input).unwrap();
        let variants = flatten_to_object_variants(&schema);
        prop_assert_eq!(variants.len(), 1);
        prop_assert_eq!(variants[0].fields().len(), fields.len());
        for (name, (description, example)) in &fields {
            let field = &variants[0].fields()[name.as_str()];
            prop_assert_eq!(field.description(), Some(description.as_str()));
            prop_assert_eq!(field.examples(), &[json!(example)][..]);
        }
    }

    #[test]
    fn fingerprint_is_deterministic(names in field_names()) {
        prop_assert_eq!(object_of(&names).fingerprint(), object_of(&names).fingerprint());
    }
}

#[test]
fn test_final_input_rejects_shared_field() {
    let shared = vec!["token".to_string()];
    let err = final_input_schema(&[object_of(&shared)], &object_of(&shared)).unwrap_err();
    assert_eq!(err.to_string(), "field 'token' is declared by more than one input schema");
}

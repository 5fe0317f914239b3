//! Pure schema composition.

use super::meta::{combine_examples, Metadata};
use super::{ObjectSchema, Schema, SchemaKind};
use indexmap::IndexSet;
use thiserror::Error;

/// Errors raised while composing schemas at build time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Two constituents of a final input schema declare the same field.
    #[error("field '{field}' is declared by more than one input schema")]
    OverlappingField {
        /// The duplicated field name.
        field: String,
    },
}

/// Returns a schema accepting values that satisfy both `left` and `right`.
#[must_use]
pub fn intersect(left: Schema, right: Schema) -> Schema {
    Schema::new(SchemaKind::Intersection(Box::new(left), Box::new(right)))
}

/// Returns a schema accepting values that satisfy any of `variants`.
#[must_use]
pub fn union(variants: impl IntoIterator<Item = Schema>) -> Schema {
    Schema::new(SchemaKind::Union(variants.into_iter().collect()))
}

/// Returns `to` with the metadata of `from` merged in.
///
/// Examples become the cartesian product of both lists with objects
/// deep-merged (`from` wins on conflicts). Description and the deprecated
/// flag come from `to`, falling back to `from`.
#[must_use]
pub fn copy_metadata(from: &Schema, to: Schema) -> Schema {
    let examples = combine_examples(to.examples(), from.examples());
    let target = to.meta();
    let meta = Metadata {
        description: target
            .description
            .clone()
            .or_else(|| from.meta().description.clone()),
        examples,
        deprecated: target.deprecated || from.meta().deprecated,
        default: target.default.clone(),
    };
    to.with_metadata(meta)
}

/// Flattens a schema into the object variants it can accept.
///
/// Unions contribute each variant, intersections the pairwise merge of both
/// sides, and wrappers their inner schema. Non-object leaves contribute
/// nothing. Effects are never executed.
#[must_use]
pub fn flatten_to_object_variants(schema: &Schema) -> Vec<ObjectSchema> {
    match schema.kind() {
        SchemaKind::Object(object) => vec![object.clone()],
        SchemaKind::Union(variants) => variants.iter().flat_map(flatten_to_object_variants).collect(),
        SchemaKind::DiscriminatedUnion { variants, .. } => variants.clone(),
        SchemaKind::Intersection(left, right) => {
            let left = flatten_to_object_variants(left);
            let right = flatten_to_object_variants(right);
            if left.is_empty() {
                return right;
            }
            if right.is_empty() {
                return left;
            }
            let mut merged = Vec::with_capacity(left.len() * right.len());
            for l in &left {
                for r in &right {
                    let mut object = l.clone();
                    for (name, field) in r.fields() {
                        object.fields_mut().insert(name.clone(), field.clone());
                    }
                    merged.push(object);
                }
            }
            merged
        }
        SchemaKind::Effect { inner, .. }
        | SchemaKind::Optional(inner)
        | SchemaKind::Nullable(inner) => flatten_to_object_variants(inner),
        _ => Vec::new(),
    }
}

/// Composes middleware input schemas with the endpoint input schema.
///
/// The result is the left-to-right intersection of all constituents with the
/// examples of each copied in. The endpoint's own description wins over the
/// middlewares'. A single schema is returned unchanged.
pub fn final_input_schema(
    middleware_schemas: &[Schema],
    endpoint_input: &Schema,
) -> Result<Schema, SchemaError> {
    let constituents: Vec<&Schema> = middleware_schemas
        .iter()
        .chain(std::iter::once(endpoint_input))
        .collect();

    let mut seen = IndexSet::new();
    for schema in &constituents {
        let own: IndexSet<String> = flatten_to_object_variants(schema)
            .iter()
            .flat_map(|variant| variant.fields().keys().cloned())
            .collect();
        for field in own {
            if !seen.insert(field.clone()) {
                return Err(SchemaError::OverlappingField { field });
            }
        }
    }

    let mut iter = constituents.iter();
    let Some(first) = iter.next() else {
        return Ok(endpoint_input.clone());
    };
    if constituents.len() == 1 {
        return Ok((*first).clone());
    }
    let folded = iter.fold((*first).clone(), |acc, next| intersect(acc, (*next).clone()));
    let stripped = folded.with_metadata(Metadata::default());
    let merged = constituents
        .iter()
        .fold(stripped, |acc, constituent| copy_metadata(constituent, acc));
    let meta = Metadata {
        description: endpoint_input
            .meta()
            .description
            .clone()
            .or_else(|| merged.meta().description.clone()),
        ..merged.meta().clone()
    };
    Ok(merged.with_metadata(meta))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(name: &str) -> Schema {
        Schema::object(ObjectSchema::new().field(name, Schema::string()))
    }

    #[test]
    fn test_copy_metadata_is_pure() {
        let from = Schema::string().describe("from").example("a");
        let to = Schema::string().example("b");
        let copied = copy_metadata(&from, to.clone());
        assert_eq!(copied.description(), Some("from"));
        assert_eq!(copied.examples(), &[json!("a")]);
        assert!(to.description().is_none());
        assert_eq!(from.examples(), &[json!("a")]);
    }

    #[test]
    fn test_copy_metadata_product_of_object_examples() {
        let from = object("a").example(json!({"a": "x"}));
        let to = object("b")
            .example(json!({"b": "1"}))
            .example(json!({"b": "2"}));
        let copied = copy_metadata(&from, to);
        assert_eq!(
            copied.examples(),
            &[json!({"b": "1", "a": "x"}), json!({"b": "2", "a": "x"})]
        );
    }

    #[test]
    fn test_flatten_union_and_intersection() {
        let schema = union([object("a"), object("b")]).and(object("c"));
        let variants = flatten_to_object_variants(&schema);
        assert_eq!(variants.len(), 2);
        let keys: Vec<_> = variants[0].fields().keys().cloned().collect();
        assert_eq!(keys, vec!["a", "c"]);
    }

    #[test]
    fn test_flatten_never_runs_effects() {
        let schema = object("a").transform(|_| panic!("effect executed"));
        assert_eq!(flatten_to_object_variants(&schema).len(), 1);
    }

    #[test]
    fn test_final_input_single_schema_unchanged() {
        let input = object("a").example(json!({"a": "x"}));
        let result = final_input_schema(&[], &input).unwrap();
        assert_eq!(result.fingerprint(), input.fingerprint());
    }

    #[test]
    fn test_final_input_intersection_validates_both() {
        let result = final_input_schema(&[object("key")], &object("id")).unwrap();
        assert!(result.parse(&json!({"key": "k", "id": "1"})).is_ok());
        assert!(result.parse(&json!({"id": "1"})).is_err());
    }

    #[test]
    fn test_final_input_keeps_metadata() {
        let mw = object("key").example(json!({"key": "123"}));
        let input = object("id").describe("by id").example(json!({"id": "1"}));
        let result = final_input_schema(&[mw], &input).unwrap();
        assert_eq!(result.description(), Some("by id"));
        assert_eq!(result.examples(), &[json!({"key": "123", "id": "1"})]);
    }

    #[test]
    fn test_final_input_prefers_endpoint_description() {
        let mw = object("key").describe("api key check");
        let input = object("id").describe("by id");
        let result = final_input_schema(&[mw.clone()], &input).unwrap();
        assert_eq!(result.description(), Some("by id"));

        let result = final_input_schema(&[mw], &object("id")).unwrap();
        assert_eq!(result.description(), Some("api key check"));
    }

    #[test]
    fn test_final_input_rejects_overlap() {
        let err = final_input_schema(&[object("id")], &object("id")).unwrap_err();
        assert_eq!(err, SchemaError::OverlappingField { field: "id".into() });
    }
}

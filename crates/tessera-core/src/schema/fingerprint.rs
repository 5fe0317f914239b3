//! Stable structural fingerprints.

use super::{Effect, ObjectSchema, Schema, SchemaKind};
use serde::Serialize;
use serde_json::{json, Map, Value};
use sha1::{Digest, Sha1};

/// Returns the hex SHA-1 digest of the JSON form of `value`.
///
/// Serialization failures hash the empty string.
pub fn digest(value: &impl Serialize) -> String {
    let bytes = serde_json::to_vec(value).unwrap_or_default();
    let mut hasher = Sha1::new();
    hasher.update(&bytes);
    format!("{:x}", hasher.finalize())
}

impl Schema {
    /// Returns a JSON description of the schema structure and metadata.
    ///
    /// Effects and custom leaves contribute only their kind and name.
    #[must_use]
    pub fn describe_structure(&self) -> Value {
        let mut node = match &self.kind {
            SchemaKind::Any => json!({"type": "any"}),
            SchemaKind::String { coerce } => json!({"type": "string", "coerce": coerce}),
            SchemaKind::Number { integer, coerce } => {
                json!({"type": "number", "integer": integer, "coerce": coerce})
            }
            SchemaKind::Boolean { coerce } => json!({"type": "boolean", "coerce": coerce}),
            SchemaKind::Literal(value) => json!({"type": "literal", "value": value}),
            SchemaKind::Enum(options) => json!({"type": "enum", "options": options}),
            SchemaKind::Array(items) => {
                json!({"type": "array", "items": items.describe_structure()})
            }
            SchemaKind::Object(object) => describe_object(object),
            SchemaKind::Optional(inner) => {
                json!({"type": "optional", "inner": inner.describe_structure()})
            }
            SchemaKind::Nullable(inner) => {
                json!({"type": "nullable", "inner": inner.describe_structure()})
            }
            SchemaKind::Union(variants) => json!({
                "type": "union",
                "variants": variants.iter().map(Schema::describe_structure).collect::<Vec<_>>(),
            }),
            SchemaKind::Intersection(left, right) => json!({
                "type": "intersection",
                "left": left.describe_structure(),
                "right": right.describe_structure(),
            }),
            SchemaKind::DiscriminatedUnion {
                discriminator,
                variants,
            } => json!({
                "type": "discriminatedUnion",
                "discriminator": discriminator,
                "variants": variants.iter().map(describe_object).collect::<Vec<_>>(),
            }),
            SchemaKind::Effect { inner, effect } => json!({
                "type": "effect",
                "effect": match effect {
                    Effect::Refine { .. } => "refine",
                    Effect::Transform(_) => "transform",
                },
                "inner": inner.describe_structure(),
            }),
            SchemaKind::Binary => json!({"type": "binary"}),
            SchemaKind::Custom(custom) => json!({"type": "custom", "name": custom.name()}),
            SchemaKind::Unrepresentable(kind) => json!({"type": kind.as_str()}),
        };
        if !self.meta.is_empty() {
            if let (Value::Object(map), Ok(meta)) = (&mut node, serde_json::to_value(&self.meta)) {
                map.insert("meta".into(), meta);
            }
        }
        node
    }

    /// Returns the SHA-1 fingerprint of [`describe_structure`](Self::describe_structure).
    ///
    /// Structurally identical schemas share a fingerprint.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        digest(&self.describe_structure())
    }
}

fn describe_object(object: &ObjectSchema) -> Value {
    let fields: Map<String, Value> = object
        .fields()
        .iter()
        .map(|(name, schema)| (name.clone(), schema.describe_structure()))
        .collect();
    json!({
        "type": "object",
        "unknownKeys": object.unknown_keys(),
        "fields": fields,
    })
}

//! Detection of constructs that cannot travel as JSON.

use super::{Schema, SchemaKind};

impl Schema {
    /// Returns the first construct in this schema that has no JSON encoding.
    ///
    /// Binary leaves, unrepresentable kinds and custom leaves declared with
    /// [`non_json`](Schema::non_json) are reported. Effects are inspected
    /// through their wrapped schema.
    #[must_use]
    pub fn json_incompatibility(&self) -> Option<&'static str> {
        match &self.kind {
            SchemaKind::Binary => Some("binary"),
            SchemaKind::Unrepresentable(kind) => Some(kind.as_str()),
            SchemaKind::Custom(custom) if !custom.is_json_compatible() => Some("custom"),
            SchemaKind::Any
            | SchemaKind::String { .. }
            | SchemaKind::Number { .. }
            | SchemaKind::Boolean { .. }
            | SchemaKind::Literal(_)
            | SchemaKind::Enum(_)
            | SchemaKind::Custom(_) => None,
            SchemaKind::Array(inner)
            | SchemaKind::Optional(inner)
            | SchemaKind::Nullable(inner)
            | SchemaKind::Effect { inner, .. } => inner.json_incompatibility(),
            SchemaKind::Object(object) => object
                .fields()
                .values()
                .find_map(Schema::json_incompatibility),
            SchemaKind::Union(variants) => variants.iter().find_map(Schema::json_incompatibility),
            SchemaKind::Intersection(left, right) => left
                .json_incompatibility()
                .or_else(|| right.json_incompatibility()),
            SchemaKind::DiscriminatedUnion { variants, .. } => variants
                .iter()
                .flat_map(|variant| variant.fields().values())
                .find_map(Schema::json_incompatibility),
        }
    }

    /// Returns `true` when every construct in this schema has a JSON encoding.
    #[must_use]
    pub fn is_json_compatible(&self) -> bool {
        self.json_incompatibility().is_none()
    }
}

#[cfg(test)]
mod tests {
    use crate::schema::{ObjectSchema, Schema, Unrepresentable};

    #[test]
    fn test_plain_object_is_compatible() {
        let schema = Schema::object(ObjectSchema::new().field("a", Schema::string()));
        assert!(schema.is_json_compatible());
    }

    #[test]
    fn test_nested_unrepresentable_is_found() {
        let schema = Schema::object(ObjectSchema::new().field(
            "at",
            Schema::unrepresentable(Unrepresentable::Date).optional(),
        ));
        assert_eq!(schema.json_incompatibility(), Some("date"));
    }

    #[test]
    fn test_raw_body_is_incompatible() {
        assert_eq!(Schema::raw().json_incompatibility(), Some("binary"));
    }

    #[test]
    fn test_custom_flag() {
        assert!(Schema::custom("uuid", |_| true).is_json_compatible());
        assert!(!Schema::custom("buffer", |_| true).non_json().is_json_compatible());
    }
}

//! Conversion of schemas and request shapes into OpenAPI objects.
//!
//! Depiction is a pure, exhaustive walk over [`SchemaKind`]. Effects are
//! described by the schema they wrap and never executed. The same schema can
//! depict differently for requests and responses: coerced fields accept a
//! missing value on the way in but are always present on the way out.

use std::sync::OnceLock;

use indexmap::IndexMap;
use regex::Regex;
use serde_json::Value;
use tessera_core::schema::{flatten_to_object_variants, union, Metadata, ObjectSchema, Unrepresentable, UnknownKeys};
use tessera_core::{InputSource, Schema, SchemaKind};

use crate::openapi::{Discriminator, Example, Parameter, ParameterIn, SchemaObject, SchemaType};

/// Which side of the exchange a schema describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Request input.
    Request,
    /// Response payload.
    Response,
}

/// Longest summary written to an operation.
pub const SHORT_DESCRIPTION_LIMIT: usize = 50;

fn path_param_regex() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r":([A-Za-z0-9_]+)").expect("valid regex"))
}

/// Returns the `:name` parameters of a path in order.
#[must_use]
pub fn path_params(path: &str) -> Vec<String> {
    path_param_regex()
        .captures_iter(path)
        .filter_map(|captures| captures.get(1))
        .map(|name| name.as_str().to_string())
        .collect()
}

/// Rewrites `/user/:id` as `/user/{id}`.
#[must_use]
pub fn reformat_path(path: &str) -> String {
    path_param_regex().replace_all(path, "{$1}").into_owned()
}

/// Builds a PascalCase identifier from arbitrary words.
///
/// Words are split on non-alphanumeric characters and before runs of
/// capitals; each piece is capitalized with the rest lowercased.
///
/// ```
/// use tessera_docs::make_clean_id;
///
/// assert_eq!(make_clean_id(&["get", "/v1/user/:id"]), "GetV1UserId");
/// assert_eq!(make_clean_id(&["post", "/getUserAPI"]), "PostGetUserApi");
/// ```
#[must_use]
pub fn make_clean_id(words: &[&str]) -> String {
    let mut pieces: Vec<String> = Vec::new();
    for word in words {
        for chunk in word.split(|c: char| !c.is_ascii_alphanumeric()) {
            let mut current = String::new();
            let mut previous_upper = false;
            for c in chunk.chars() {
                let upper = c.is_ascii_uppercase();
                if upper && !previous_upper && !current.is_empty() {
                    pieces.push(std::mem::take(&mut current));
                }
                current.push(c);
                previous_upper = upper;
            }
            pieces.push(current);
        }
    }
    pieces.iter().map(|piece| uc_first(piece)).collect()
}

fn uc_first(piece: &str) -> String {
    let mut chars = piece.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase()
    })
}

/// Truncates a description to [`SHORT_DESCRIPTION_LIMIT`] characters.
#[must_use]
pub fn ensure_short_description(description: &str) -> String {
    let trimmed = description.trim();
    if trimmed.chars().count() <= SHORT_DESCRIPTION_LIMIT {
        return trimmed.to_string();
    }
    let mut short: String = trimmed.chars().take(SHORT_DESCRIPTION_LIMIT - 1).collect();
    short.push('…');
    short
}

/// Depicts a schema.
#[must_use]
pub fn depict_schema(schema: &Schema, direction: Direction) -> SchemaObject {
    let mut depicted = match schema.kind() {
        SchemaKind::Any => SchemaObject::default(),
        SchemaKind::String { .. } => SchemaObject::typed(SchemaType::String),
        SchemaKind::Number { integer: true, .. } => SchemaObject::typed(SchemaType::Integer),
        SchemaKind::Number { .. } => SchemaObject::typed(SchemaType::Number),
        SchemaKind::Boolean { .. } => SchemaObject::typed(SchemaType::Boolean),
        SchemaKind::Literal(value) => depict_literal(value),
        SchemaKind::Enum(options) => SchemaObject {
            enum_values: options.iter().cloned().map(Value::String).collect(),
            ..SchemaObject::typed(SchemaType::String)
        },
        SchemaKind::Array(items) => SchemaObject {
            items: Some(Box::new(depict_schema(items, direction))),
            ..SchemaObject::typed(SchemaType::Array)
        },
        SchemaKind::Object(object) => depict_object(object, direction),
        SchemaKind::Optional(inner) | SchemaKind::Effect { inner, .. } => depict_schema(inner, direction),
        SchemaKind::Nullable(inner) => SchemaObject {
            nullable: true,
            ..depict_schema(inner, direction)
        },
        SchemaKind::Union(variants) => SchemaObject {
            one_of: variants
                .iter()
                .map(|variant| depict_schema(variant, direction))
                .collect(),
            ..SchemaObject::default()
        },
        SchemaKind::Intersection(left, right) => SchemaObject {
            all_of: vec![depict_schema(left, direction), depict_schema(right, direction)],
            ..SchemaObject::default()
        },
        SchemaKind::DiscriminatedUnion {
            discriminator,
            variants,
        } => SchemaObject {
            one_of: variants
                .iter()
                .map(|variant| depict_object(variant, direction))
                .collect(),
            discriminator: Some(Discriminator {
                property_name: discriminator.clone(),
            }),
            ..SchemaObject::default()
        },
        SchemaKind::Binary => SchemaObject {
            format: Some("binary".to_string()),
            ..SchemaObject::typed(SchemaType::String)
        },
        SchemaKind::Custom(custom) => SchemaObject {
            format: Some(custom.name().to_string()),
            ..SchemaObject::default()
        },
        SchemaKind::Unrepresentable(kind) => depict_unrepresentable(*kind),
    };
    apply_metadata(&mut depicted, schema.meta());
    depicted
}

fn depict_literal(value: &Value) -> SchemaObject {
    let schema_type = match value {
        Value::String(_) => Some(SchemaType::String),
        Value::Number(number) if number.is_i64() || number.is_u64() => Some(SchemaType::Integer),
        Value::Number(_) => Some(SchemaType::Number),
        Value::Bool(_) => Some(SchemaType::Boolean),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    };
    SchemaObject {
        schema_type,
        enum_values: vec![value.clone()],
        nullable: value.is_null(),
        ..SchemaObject::default()
    }
}

// Best effort for kinds with no JSON encoding; callers warn about them.
fn depict_unrepresentable(kind: Unrepresentable) -> SchemaObject {
    let schema_type = match kind {
        Unrepresentable::BigInt => Some(SchemaType::Integer),
        Unrepresentable::Date => Some(SchemaType::String),
        Unrepresentable::Function | Unrepresentable::Symbol => None,
    };
    let format = match kind {
        Unrepresentable::Date => "date-time",
        other => other.as_str(),
    };
    SchemaObject {
        schema_type,
        format: Some(format.to_string()),
        ..SchemaObject::default()
    }
}

fn depict_object(object: &ObjectSchema, direction: Direction) -> SchemaObject {
    let mut depicted = SchemaObject::typed(SchemaType::Object);
    for (name, field) in object.fields() {
        depicted = depicted.property(name.clone(), depict_schema(field, direction), is_required(field, direction));
    }
    depicted.additional_properties = match object.unknown_keys() {
        UnknownKeys::Strip => None,
        UnknownKeys::Passthrough => Some(true),
        UnknownKeys::Strict => Some(false),
    };
    depicted
}

fn apply_metadata(depicted: &mut SchemaObject, meta: &Metadata) {
    if let Some(description) = &meta.description {
        depicted.description = Some(description.clone());
    }
    if let Some(example) = meta.examples.first() {
        depicted.example = Some(example.clone());
    }
    if let Some(default) = &meta.default {
        depicted.default = Some(default.clone());
    }
    depicted.deprecated |= meta.deprecated;
}

/// Returns whether an object field is documented as required.
#[must_use]
pub fn is_required(field: &Schema, direction: Direction) -> bool {
    match direction {
        Direction::Request => !field.accepts_missing(),
        Direction::Response => !field.accepts_missing() || is_coerced(field),
    }
}

fn is_coerced(schema: &Schema) -> bool {
    schema.has_coercion()
        || match schema.kind() {
            SchemaKind::Optional(inner)
            | SchemaKind::Nullable(inner)
            | SchemaKind::Effect { inner, .. } => is_coerced(inner),
            _ => false,
        }
}

/// Returns the examples of a schema as named OpenAPI examples.
#[must_use]
pub fn depict_examples(examples: &[Value]) -> IndexMap<String, Example> {
    examples
        .iter()
        .enumerate()
        .map(|(index, value)| {
            (
                format!("example{}", index + 1),
                Example {
                    value: value.clone(),
                },
            )
        })
        .collect()
}

struct MergedField {
    schema: Schema,
    required: bool,
    seen: usize,
}

/// Merges the fields of every object variant of `schema`.
///
/// A field stays required only when every variant declares it as required.
fn merged_fields(schema: &Schema) -> IndexMap<String, Schema> {
    let variants = flatten_to_object_variants(schema);
    let mut merged: IndexMap<String, MergedField> = IndexMap::new();
    for variant in &variants {
        for (name, field) in variant.fields() {
            let required = is_required(field, Direction::Request);
            merged
                .entry(name.clone())
                .and_modify(|entry| {
                    entry.required &= required;
                    entry.seen += 1;
                })
                .or_insert_with(|| MergedField {
                    schema: field.clone(),
                    required,
                    seen: 1,
                });
        }
    }
    merged
        .into_iter()
        .map(|(name, entry)| {
            let schema = if entry.required && entry.seen == variants.len() {
                entry.schema
            } else if entry.schema.accepts_missing() {
                entry.schema
            } else {
                entry.schema.optional()
            };
            (name, schema)
        })
        .collect()
}

/// Depicts path, header and query parameters of an input schema.
///
/// Path parameters are the `:name` segments of `path` when `params` is a
/// source. Fields prefixed `x-` become header parameters when `headers` is a
/// source. Everything else becomes a query parameter when `query` is a
/// source, and is skipped otherwise.
#[must_use]
pub fn depict_parameters(input: &Schema, path: &str, sources: &[InputSource]) -> Vec<Parameter> {
    let in_path = if sources.contains(&InputSource::Params) {
        path_params(path)
    } else {
        Vec::new()
    };
    let fields = merged_fields(input);
    let mut parameters = Vec::new();

    for name in &in_path {
        let field = fields.get(name);
        parameters.push(depict_parameter(name, field, input, ParameterIn::Path, true));
    }

    for (name, field) in &fields {
        if in_path.contains(name) {
            continue;
        }
        let location = if sources.contains(&InputSource::Headers) && name.starts_with("x-") {
            ParameterIn::Header
        } else if sources.contains(&InputSource::Query) {
            ParameterIn::Query
        } else {
            continue;
        };
        let required = is_required(field, Direction::Request);
        parameters.push(depict_parameter(name, Some(field), input, location, required));
    }
    parameters
}

fn depict_parameter(
    name: &str,
    field: Option<&Schema>,
    input: &Schema,
    location: ParameterIn,
    required: bool,
) -> Parameter {
    let schema = field.map_or_else(
        || SchemaObject::typed(SchemaType::String),
        |field| depict_schema(field, Direction::Request),
    );
    let mut examples: Vec<Value> = field.map(|field| field.examples().to_vec()).unwrap_or_default();
    examples.extend(
        input
            .examples()
            .iter()
            .filter_map(|example| example.get(name).cloned()),
    );
    Parameter {
        name: name.to_string(),
        location,
        required,
        description: field.and_then(|field| field.description().map(ToString::to_string)),
        deprecated: field.is_some_and(|field| field.meta().deprecated),
        schema,
        examples: depict_examples(&examples),
    }
}

/// Returns the request body schema: the input without its path parameters.
///
/// Top-level examples lose the removed keys as well.
#[must_use]
pub fn request_body_schema(input: &Schema, path: &str) -> Schema {
    let params = path_params(path);
    let variants = flatten_to_object_variants(input);
    let declares_param = variants
        .iter()
        .any(|variant| params.iter().any(|param| variant.get(param).is_some()));
    if !declares_param {
        return input.clone();
    }

    let mut stripped: Vec<Schema> = variants
        .iter()
        .map(|variant| Schema::object(variant.without(&params)))
        .collect();
    let body = if stripped.len() == 1 {
        stripped.remove(0)
    } else {
        union(stripped)
    };

    let mut meta = input.meta().clone();
    for example in &mut meta.examples {
        if let Value::Object(object) = example {
            object.retain(|key, _| !params.contains(key));
        }
    }
    body.with_metadata(meta)
}

/// Returns the media type of a request body.
///
/// Binary fields make it a multipart upload; the raw shape `{raw: binary}`
/// an octet stream.
#[must_use]
pub fn request_mime_type(body: &Schema) -> &'static str {
    let variants = flatten_to_object_variants(body);
    let is_raw = variants.len() == 1
        && variants[0].fields().len() == 1
        && variants[0]
            .get("raw")
            .is_some_and(|field| matches!(field.kind(), SchemaKind::Binary));
    if is_raw {
        return "application/octet-stream";
    }
    let has_upload = variants
        .iter()
        .flat_map(|variant| variant.fields().values())
        .any(has_binary);
    if has_upload {
        "multipart/form-data"
    } else {
        "application/json"
    }
}

fn has_binary(schema: &Schema) -> bool {
    match schema.kind() {
        SchemaKind::Binary => true,
        SchemaKind::Optional(inner)
        | SchemaKind::Nullable(inner)
        | SchemaKind::Effect { inner, .. }
        | SchemaKind::Array(inner) => has_binary(inner),
        SchemaKind::Union(variants) => variants.iter().any(has_binary),
        _ => false,
    }
}

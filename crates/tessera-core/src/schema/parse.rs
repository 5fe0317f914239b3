//! Validation and transformation of JSON values.

use super::{Effect, ObjectSchema, Schema, SchemaKind, UnknownKeys};
use crate::error::{ValidationIssue, ValidationIssues};
use serde_json::{Map, Number, Value};

type Checked = Result<Option<Value>, Vec<ValidationIssue>>;

impl Schema {
    /// Validates `value` and returns the transformed output.
    ///
    /// This is the only place where refinements and transformations run.
    pub fn parse(&self, value: &Value) -> Result<Value, ValidationIssues> {
        match self.check(Some(value), &[]) {
            Ok(parsed) => Ok(parsed.unwrap_or(Value::Null)),
            Err(issues) => Err(ValidationIssues::new(issues)),
        }
    }

    /// Validates an object of fields, returning the output object.
    pub fn parse_object(&self, value: &Map<String, Value>) -> Result<Map<String, Value>, ValidationIssues> {
        match self.parse(&Value::Object(value.clone()))? {
            Value::Object(map) => Ok(map),
            other => Err(ValidationIssues::new(vec![ValidationIssue::new(
                Vec::new(),
                "object",
                type_name(&other),
                format!("Expected object, received {}", type_name(&other)),
            )])),
        }
    }

    fn check(&self, value: Option<&Value>, path: &[String]) -> Checked {
        let value = match value {
            Some(value) => value,
            None => return self.check_missing(path),
        };
        match &self.kind {
            SchemaKind::Any => Ok(Some(value.clone())),
            SchemaKind::String { coerce } => check_string(value, *coerce, path),
            SchemaKind::Number { integer, coerce } => check_number(value, *integer, *coerce, path),
            SchemaKind::Boolean { coerce } => check_boolean(value, *coerce, path),
            SchemaKind::Literal(expected) => {
                if value == expected {
                    Ok(Some(value.clone()))
                } else {
                    Err(vec![issue(
                        path,
                        expected.to_string(),
                        type_name(value),
                        format!("Invalid literal value, expected {expected}"),
                    )])
                }
            }
            SchemaKind::Enum(options) => match value.as_str() {
                Some(s) if options.iter().any(|option| option == s) => Ok(Some(value.clone())),
                _ => {
                    let expected = options
                        .iter()
                        .map(|option| format!("'{option}'"))
                        .collect::<Vec<_>>()
                        .join(" | ");
                    let received = match value.as_str() {
                        Some(s) => format!("'{s}'"),
                        None => type_name(value).to_string(),
                    };
                    Err(vec![issue(
                        path,
                        expected.clone(),
                        received.clone(),
                        format!("Invalid enum value. Expected {expected}, received {received}"),
                    )])
                }
            },
            SchemaKind::Array(items) => {
                let Some(elements) = value.as_array() else {
                    return Err(vec![mismatch(path, "array", value)]);
                };
                let mut output = Vec::with_capacity(elements.len());
                let mut issues = Vec::new();
                for (index, element) in elements.iter().enumerate() {
                    let child = child_path(path, &index.to_string());
                    match items.check(Some(element), &child) {
                        Ok(parsed) => output.push(parsed.unwrap_or(Value::Null)),
                        Err(mut found) => issues.append(&mut found),
                    }
                }
                if issues.is_empty() {
                    Ok(Some(Value::Array(output)))
                } else {
                    Err(issues)
                }
            }
            SchemaKind::Object(object) => check_object(object, value, path),
            SchemaKind::Optional(inner) => inner.check(Some(value), path),
            SchemaKind::Nullable(inner) => {
                if value.is_null() {
                    Ok(Some(Value::Null))
                } else {
                    inner.check(Some(value), path)
                }
            }
            SchemaKind::Union(variants) => {
                for variant in variants {
                    if let Ok(parsed) = variant.check(Some(value), path) {
                        return Ok(parsed);
                    }
                }
                Err(vec![issue(path, "union", type_name(value), "Invalid input")])
            }
            SchemaKind::Intersection(left, right) => {
                let (l, r) = collect_both(left.check(Some(value), path), right.check(Some(value), path))?;
                match (l, r) {
                    (Some(l), Some(r)) => merge_values(&l, &r)
                        .map(Some)
                        .ok_or_else(|| {
                            vec![issue(
                                path,
                                "mergeable values",
                                "conflicting values",
                                "Intersection results could not be merged",
                            )]
                        }),
                    (l, r) => Ok(l.or(r)),
                }
            }
            SchemaKind::DiscriminatedUnion {
                discriminator,
                variants,
            } => {
                let Some(fields) = value.as_object() else {
                    return Err(vec![mismatch(path, "object", value)]);
                };
                let tag = fields.get(discriminator);
                let chosen = variants.iter().find(|variant| {
                    matches!(
                        (variant.get(discriminator).map(Schema::kind), tag),
                        (Some(SchemaKind::Literal(expected)), Some(actual)) if expected == actual
                    )
                });
                match chosen {
                    Some(variant) => check_object(variant, value, path),
                    None => {
                        let expected = variants
                            .iter()
                            .filter_map(|variant| match variant.get(discriminator).map(Schema::kind) {
                                Some(SchemaKind::Literal(Value::String(s))) => Some(format!("'{s}'")),
                                Some(SchemaKind::Literal(other)) => Some(other.to_string()),
                                _ => None,
                            })
                            .collect::<Vec<_>>()
                            .join(" | ");
                        Err(vec![issue(
                            &child_path(path, discriminator),
                            expected.clone(),
                            tag.map_or("undefined", type_name),
                            format!("Invalid discriminator value. Expected {expected}"),
                        )])
                    }
                }
            }
            SchemaKind::Effect { inner, effect } => {
                let parsed = inner.check(Some(value), path)?;
                apply_effect(effect, parsed, path)
            }
            SchemaKind::Binary => match value {
                Value::String(_) => Ok(Some(value.clone())),
                _ => Err(vec![mismatch(path, "binary", value)]),
            },
            SchemaKind::Custom(custom) => {
                if custom.accepts(value) {
                    Ok(Some(value.clone()))
                } else {
                    Err(vec![issue(
                        path,
                        custom.name().to_string(),
                        type_name(value),
                        format!("Expected {}, received {}", custom.name(), type_name(value)),
                    )])
                }
            }
            SchemaKind::Unrepresentable(kind) => Err(vec![issue(
                path,
                kind.as_str(),
                type_name(value),
                format!("Expected {}, received {}", kind.as_str(), type_name(value)),
            )]),
        }
    }

    fn check_missing(&self, path: &[String]) -> Checked {
        if let Some(default) = &self.meta.default {
            return self.check(Some(default), path);
        }
        if self.has_coercion() {
            return Ok(None);
        }
        match &self.kind {
            SchemaKind::Any | SchemaKind::Optional(_) => Ok(None),
            SchemaKind::Nullable(inner) => inner.check(None, path),
            SchemaKind::Effect { inner, effect } => {
                let parsed = inner.check(None, path)?;
                apply_effect(effect, parsed, path)
            }
            SchemaKind::Union(variants) if variants.iter().any(Schema::accepts_missing) => Ok(None),
            SchemaKind::Intersection(left, right) => {
                let (l, r) = collect_both(left.check(None, path), right.check(None, path))?;
                Ok(l.or(r))
            }
            _ => Err(vec![issue(path, self.expected_name(), "undefined", "Required")]),
        }
    }

    fn expected_name(&self) -> String {
        match &self.kind {
            SchemaKind::Any => "any".into(),
            SchemaKind::String { .. } => "string".into(),
            SchemaKind::Number { integer: true, .. } => "integer".into(),
            SchemaKind::Number { .. } => "number".into(),
            SchemaKind::Boolean { .. } => "boolean".into(),
            SchemaKind::Literal(value) => value.to_string(),
            SchemaKind::Enum(_) => "enum".into(),
            SchemaKind::Array(_) => "array".into(),
            SchemaKind::Object(_) | SchemaKind::DiscriminatedUnion { .. } => "object".into(),
            SchemaKind::Union(_) => "union".into(),
            SchemaKind::Intersection(left, _) => left.expected_name(),
            SchemaKind::Optional(inner)
            | SchemaKind::Nullable(inner)
            | SchemaKind::Effect { inner, .. } => inner.expected_name(),
            SchemaKind::Binary => "binary".into(),
            SchemaKind::Custom(custom) => custom.name().to_string(),
            SchemaKind::Unrepresentable(kind) => kind.as_str().into(),
        }
    }
}

fn check_object(object: &ObjectSchema, value: &Value, path: &[String]) -> Checked {
    let Some(fields) = value.as_object() else {
        return Err(vec![mismatch(path, "object", value)]);
    };
    let mut output = Map::new();
    let mut issues = Vec::new();
    for (name, schema) in object.fields() {
        let child = child_path(path, name);
        match schema.check(fields.get(name), &child) {
            Ok(Some(parsed)) => {
                output.insert(name.clone(), parsed);
            }
            Ok(None) => {}
            Err(mut found) => issues.append(&mut found),
        }
    }
    let unknown: Vec<&String> = fields
        .keys()
        .filter(|key| !object.fields().contains_key(*key))
        .collect();
    match object.unknown_keys() {
        UnknownKeys::Strip => {}
        UnknownKeys::Passthrough => {
            for key in unknown {
                output.insert(key.clone(), fields[key].clone());
            }
        }
        UnknownKeys::Strict => {
            if !unknown.is_empty() {
                let keys = unknown
                    .iter()
                    .map(|key| format!("'{key}'"))
                    .collect::<Vec<_>>()
                    .join(", ");
                issues.push(issue(
                    path,
                    "known keys",
                    keys.clone(),
                    format!("Unrecognized key(s) in object: {keys}"),
                ));
            }
        }
    }
    if issues.is_empty() {
        Ok(Some(Value::Object(output)))
    } else {
        Err(issues)
    }
}

fn check_string(value: &Value, coerce: bool, path: &[String]) -> Checked {
    match value {
        Value::String(_) => Ok(Some(value.clone())),
        Value::Number(n) if coerce => Ok(Some(Value::String(n.to_string()))),
        Value::Bool(b) if coerce => Ok(Some(Value::String(b.to_string()))),
        Value::Null if coerce => Ok(Some(Value::String("null".into()))),
        _ => Err(vec![mismatch(path, "string", value)]),
    }
}

fn check_number(value: &Value, integer: bool, coerce: bool, path: &[String]) -> Checked {
    let expected = if integer { "integer" } else { "number" };
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if coerce => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Some(0.0)
            } else {
                trimmed.parse::<f64>().ok()
            }
        }
        Value::Bool(b) if coerce => Some(if *b { 1.0 } else { 0.0 }),
        Value::Null if coerce => Some(0.0),
        _ => return Err(vec![mismatch(path, expected, value)]),
    };
    let Some(number) = number.filter(|n| n.is_finite()) else {
        return Err(vec![issue(
            path,
            expected,
            "nan",
            format!("Expected {expected}, received nan"),
        )]);
    };
    if integer && number.fract() != 0.0 {
        return Err(vec![issue(
            path,
            "integer",
            "float",
            "Expected integer, received float",
        )]);
    }
    if let Value::Number(n) = value {
        return Ok(Some(Value::Number(n.clone())));
    }
    Ok(Some(to_json_number(number)))
}

fn check_boolean(value: &Value, coerce: bool, path: &[String]) -> Checked {
    match value {
        Value::Bool(_) => Ok(Some(value.clone())),
        other if coerce => Ok(Some(Value::Bool(truthy(other)))),
        _ => Err(vec![mismatch(path, "boolean", value)]),
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn to_json_number(number: f64) -> Value {
    if number.fract() == 0.0 && number.abs() < 9_007_199_254_740_992.0 {
        Value::Number(Number::from(number as i64))
    } else {
        Number::from_f64(number).map_or(Value::Null, Value::Number)
    }
}

fn apply_effect(effect: &Effect, parsed: Option<Value>, path: &[String]) -> Checked {
    let Some(value) = parsed else {
        return Ok(None);
    };
    match effect {
        Effect::Refine { check, message } => {
            if check(&value) {
                Ok(Some(value))
            } else {
                Err(vec![issue(path, "refinement", type_name(&value), message.clone())])
            }
        }
        Effect::Transform(transform) => transform(value)
            .map(Some)
            .map_err(|message| vec![issue(path, "transformable value", "value", message)]),
    }
}

fn collect_both(left: Checked, right: Checked) -> Result<(Option<Value>, Option<Value>), Vec<ValidationIssue>> {
    match (left, right) {
        (Ok(l), Ok(r)) => Ok((l, r)),
        (Err(mut l), Err(mut r)) => {
            l.append(&mut r);
            Err(l)
        }
        (Err(issues), _) | (_, Err(issues)) => Err(issues),
    }
}

/// Merges two intersection outputs; `None` when they conflict.
fn merge_values(left: &Value, right: &Value) -> Option<Value> {
    if left == right {
        return Some(left.clone());
    }
    match (left, right) {
        (Value::Object(l), Value::Object(r)) => {
            let mut merged = l.clone();
            for (key, value) in r {
                let next = match l.get(key) {
                    Some(existing) => merge_values(existing, value)?,
                    None => value.clone(),
                };
                merged.insert(key.clone(), next);
            }
            Some(Value::Object(merged))
        }
        (Value::Array(l), Value::Array(r)) if l.len() == r.len() => l
            .iter()
            .zip(r)
            .map(|(a, b)| merge_values(a, b))
            .collect::<Option<Vec<_>>>()
            .map(Value::Array),
        _ => None,
    }
}

fn child_path(path: &[String], segment: &str) -> Vec<String> {
    let mut child = path.to_vec();
    child.push(segment.to_string());
    child
}

fn issue(
    path: &[String],
    expected: impl Into<String>,
    received: impl Into<String>,
    message: impl Into<String>,
) -> ValidationIssue {
    ValidationIssue::new(path.to_vec(), expected, received, message)
}

fn mismatch(path: &[String], expected: &str, value: &Value) -> ValidationIssue {
    let received = type_name(value);
    issue(
        path,
        expected,
        received,
        format!("Expected {expected}, received {received}"),
    )
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ObjectSchema, Unrepresentable};
    use serde_json::json;

    fn user() -> Schema {
        Schema::object(
            ObjectSchema::new()
                .field("id", Schema::integer())
                .field("name", Schema::string().optional()),
        )
    }

    #[test]
    fn test_object_strips_unknown_keys() {
        let parsed = user().parse(&json!({"id": 1, "extra": true})).unwrap();
        assert_eq!(parsed, json!({"id": 1}));
    }

    #[test]
    fn test_missing_required_field() {
        let err = user().parse(&json!({})).unwrap_err();
        assert_eq!(err.len(), 1);
        assert_eq!(err.issues()[0].path, vec!["id".to_string()]);
        assert_eq!(err.issues()[0].message, "Required");
    }

    #[test]
    fn test_type_mismatch_message() {
        let err = user().parse(&json!({"id": "x"})).unwrap_err();
        assert_eq!(err.to_string(), "id: Expected integer, received string");
    }

    #[test]
    fn test_strict_object_rejects_unknown() {
        let schema = Schema::object(ObjectSchema::new().field("a", Schema::any()).strict());
        let err = schema.parse(&json!({"a": 1, "b": 2})).unwrap_err();
        assert!(err.to_string().contains("Unrecognized key(s) in object: 'b'"));
    }

    #[test]
    fn test_passthrough_keeps_unknown() {
        let schema = Schema::object(ObjectSchema::new().passthrough());
        assert_eq!(schema.parse(&json!({"b": 2})).unwrap(), json!({"b": 2}));
    }

    #[test]
    fn test_coercion() {
        assert_eq!(Schema::number().coerce().parse(&json!("12")).unwrap(), json!(12));
        assert_eq!(Schema::number().coerce().parse(&json!("1.5")).unwrap(), json!(1.5));
        assert_eq!(Schema::string().coerce().parse(&json!(12)).unwrap(), json!("12"));
        assert_eq!(Schema::boolean().coerce().parse(&json!("")).unwrap(), json!(false));
        assert_eq!(Schema::boolean().coerce().parse(&json!("no")).unwrap(), json!(true));
        assert!(Schema::number().coerce().parse(&json!("abc")).is_err());
    }

    #[test]
    fn test_missing_coerced_field_stays_absent() {
        let schema = Schema::object(ObjectSchema::new().field("n", Schema::number().coerce()));
        assert_eq!(schema.parse(&json!({})).unwrap(), json!({}));
    }

    #[test]
    fn test_default_value_fills_missing() {
        let schema = Schema::object(
            ObjectSchema::new().field("limit", Schema::integer().default_value(10)),
        );
        assert_eq!(schema.parse(&json!({})).unwrap(), json!({"limit": 10}));
    }

    #[test]
    fn test_intersection_merges() {
        let schema = Schema::object(ObjectSchema::new().field("a", Schema::string()))
            .and(Schema::object(ObjectSchema::new().field("b", Schema::integer())));
        let parsed = schema.parse(&json!({"a": "x", "b": 2, "c": 3})).unwrap();
        assert_eq!(parsed, json!({"a": "x", "b": 2}));
    }

    #[test]
    fn test_intersection_conflict() {
        let left = Schema::object(ObjectSchema::new().field("a", Schema::string()));
        let right = Schema::object(
            ObjectSchema::new().field("a", Schema::string().transform(|_| Ok(json!("other")))),
        );
        let err = left.and(right).parse(&json!({"a": "x"})).unwrap_err();
        assert_eq!(err.issues()[0].message, "Intersection results could not be merged");
    }

    #[test]
    fn test_union_first_match() {
        let schema = crate::schema::union([Schema::integer(), Schema::string()]);
        assert_eq!(schema.parse(&json!("a")).unwrap(), json!("a"));
        let err = schema.parse(&json!(true)).unwrap_err();
        assert_eq!(err.issues()[0].message, "Invalid input");
    }

    #[test]
    fn test_discriminated_union() {
        let schema = Schema::discriminated_union(
            "type",
            vec![
                ObjectSchema::new()
                    .field("type", Schema::literal("a"))
                    .field("x", Schema::integer()),
                ObjectSchema::new()
                    .field("type", Schema::literal("b"))
                    .field("y", Schema::string()),
            ],
        );
        assert_eq!(
            schema.parse(&json!({"type": "b", "y": "z"})).unwrap(),
            json!({"type": "b", "y": "z"})
        );
        let err = schema.parse(&json!({"type": "c"})).unwrap_err();
        assert_eq!(
            err.issues()[0].message,
            "Invalid discriminator value. Expected 'a' | 'b'"
        );
    }

    #[test]
    fn test_refine_and_transform() {
        let schema = Schema::string()
            .refine(|v| v.as_str().is_some_and(|s| s.len() > 2), "Too short")
            .transform(|v| Ok(json!(v.as_str().map(str::len))));
        assert_eq!(schema.parse(&json!("abcd")).unwrap(), json!(4));
        let err = schema.parse(&json!("ab")).unwrap_err();
        assert_eq!(err.issues()[0].message, "Too short");
    }

    #[test]
    fn test_enum_message() {
        let err = Schema::enumeration(["a", "b"]).parse(&json!("c")).unwrap_err();
        assert_eq!(
            err.issues()[0].message,
            "Invalid enum value. Expected 'a' | 'b', received 'c'"
        );
    }

    #[test]
    fn test_unrepresentable_never_parses() {
        assert!(Schema::unrepresentable(Unrepresentable::BigInt)
            .parse(&json!(1))
            .is_err());
    }

    #[test]
    fn test_array_issue_paths() {
        let err = Schema::array(Schema::integer())
            .parse(&json!([1, "x", 3]))
            .unwrap_err();
        assert_eq!(err.issues()[0].path, vec!["1".to_string()]);
    }
}

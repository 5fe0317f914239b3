//! Documentation metadata attached to schema nodes.

use serde::Serialize;
use serde_json::Value;

/// Free-form annotations carried by every [`Schema`](super::Schema) node.
///
/// Metadata never affects validation, except for `default`, which is
/// substituted for a missing value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Metadata {
    /// Human-readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Example values.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<Value>,
    /// Whether the field is deprecated.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
    /// Value used when the input omits the field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl Metadata {
    /// Returns `true` when nothing is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.examples.is_empty()
            && !self.deprecated
            && self.default.is_none()
    }
}

/// Deep-merges `right` into `left`; `right` wins on scalar conflicts.
pub(crate) fn merge_deep_right(left: &Value, right: &Value) -> Value {
    match (left, right) {
        (Value::Object(l), Value::Object(r)) => {
            let mut merged = l.clone();
            for (key, value) in r {
                let next = match merged.get(key) {
                    Some(existing) => merge_deep_right(existing, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), next);
            }
            Value::Object(merged)
        }
        (_, other) => other.clone(),
    }
}

/// Combines two example lists.
///
/// When both lists are non-empty the result is their cartesian product with
/// object examples deep-merged; otherwise the lists are concatenated.
pub(crate) fn combine_examples(dest: &[Value], src: &[Value]) -> Vec<Value> {
    if dest.is_empty() || src.is_empty() {
        return dest.iter().chain(src).cloned().collect();
    }
    let mut combined = Vec::with_capacity(dest.len() * src.len());
    for d in dest {
        for s in src {
            combined.push(merge_deep_right(d, s));
        }
    }
    combined
}

//! Options contributed by middlewares.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Raised when a key is contributed twice.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("option '{key}' is already set")]
pub struct OptionsError {
    /// The duplicated key.
    pub key: String,
}

/// Append-only, insertion-ordered map of middleware contributions.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Options(IndexMap<String, Value>);

impl Options {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a key that is not present yet.
    pub fn try_insert(&mut self, key: impl Into<String>, value: Value) -> Result<(), OptionsError> {
        let key = key.into();
        if self.0.contains_key(&key) {
            return Err(OptionsError { key });
        }
        self.0.insert(key, value);
        Ok(())
    }

    /// Inserts every entry of `values`, failing on the first existing key.
    pub fn extend_from(&mut self, values: Map<String, Value>) -> Result<(), OptionsError> {
        for (key, value) in values {
            self.try_insert(key, value)?;
        }
        Ok(())
    }

    /// Returns a value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Deserializes a value.
    #[must_use]
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.0
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// Returns `true` if `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Returns the entries as a JSON object.
    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::Object(self.0.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }
}

//! Security declarations attached to middlewares.
//!
//! Declarations are documentation only: enforcing them is the job of the
//! middleware that declares them.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// How a request is authenticated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Security {
    /// HTTP basic authentication.
    Basic,
    /// HTTP bearer token.
    Bearer {
        /// Token format hint, e.g. `JWT`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        format: Option<String>,
    },
    /// A key sent as an input field.
    Input {
        /// Field name.
        name: String,
    },
    /// A key sent as a header.
    Header {
        /// Header name.
        name: String,
    },
    /// A key sent as a cookie.
    Cookie {
        /// Cookie name.
        name: String,
    },
    /// OpenID Connect discovery.
    #[serde(rename = "openid")]
    OpenId {
        /// Discovery URL.
        url: String,
    },
    /// OAuth 2 flows.
    OAuth2 {
        /// Flows keyed by name (`implicit`, `password`, `clientCredentials`,
        /// `authorizationCode`).
        #[serde(default)]
        flows: IndexMap<String, OAuthFlow>,
    },
}

/// One OAuth 2 flow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthFlow {
    /// Authorization URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization_url: Option<String>,
    /// Token URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_url: Option<String>,
    /// Refresh URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_url: Option<String>,
    /// Available scopes with descriptions.
    #[serde(default)]
    pub scopes: IndexMap<String, String>,
}

/// A boolean combination of leaves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicalContainer<T> {
    /// A single leaf.
    Leaf(T),
    /// All children must hold.
    And(Vec<LogicalContainer<T>>),
    /// Any child must hold.
    Or(Vec<LogicalContainer<T>>),
}

impl<T> From<T> for LogicalContainer<T> {
    fn from(leaf: T) -> Self {
        Self::Leaf(leaf)
    }
}

impl<T: Clone> LogicalContainer<T> {
    /// Maps every leaf.
    pub fn map<U>(&self, f: &mut impl FnMut(&T) -> U) -> LogicalContainer<U> {
        match self {
            Self::Leaf(leaf) => LogicalContainer::Leaf(f(leaf)),
            Self::And(items) => {
                let mut mapped = Vec::with_capacity(items.len());
                for item in items {
                    mapped.push(item.map(&mut *f));
                }
                LogicalContainer::And(mapped)
            }
            Self::Or(items) => {
                let mut mapped = Vec::with_capacity(items.len());
                for item in items {
                    mapped.push(item.map(&mut *f));
                }
                LogicalContainer::Or(mapped)
            }
        }
    }

    /// Returns the disjunctive normal form: any inner list satisfies the whole.
    ///
    /// ```
    /// use tessera_core::LogicalContainer;
    ///
    /// let container = LogicalContainer::And(vec![
    ///     LogicalContainer::Leaf("a"),
    ///     LogicalContainer::Or(vec![LogicalContainer::Leaf("b"), LogicalContainer::Leaf("c")]),
    /// ]);
    /// assert_eq!(container.alternatives(), vec![vec!["a", "b"], vec!["a", "c"]]);
    /// ```
    #[must_use]
    pub fn alternatives(&self) -> Vec<Vec<T>> {
        match self {
            Self::Leaf(leaf) => vec![vec![leaf.clone()]],
            Self::Or(items) => items.iter().flat_map(Self::alternatives).collect(),
            Self::And(items) => items.iter().fold(vec![Vec::new()], |acc, item| {
                let next = item.alternatives();
                acc.iter()
                    .flat_map(|prefix| {
                        next.iter().map(move |suffix| {
                            let mut combined = prefix.clone();
                            combined.extend(suffix.iter().cloned());
                            combined
                        })
                    })
                    .collect()
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaf_alternatives() {
        let container = LogicalContainer::from(Security::Basic);
        assert_eq!(container.alternatives(), vec![vec![Security::Basic]]);
    }

    #[test]
    fn test_or_of_and() {
        let container = LogicalContainer::Or(vec![
            LogicalContainer::And(vec![
                LogicalContainer::Leaf(1),
                LogicalContainer::Leaf(2),
            ]),
            LogicalContainer::Leaf(3),
        ]);
        assert_eq!(container.alternatives(), vec![vec![1, 2], vec![3]]);
    }

    #[test]
    fn test_map_keeps_shape() {
        let container = LogicalContainer::And(vec![LogicalContainer::Leaf(1), LogicalContainer::Leaf(2)]);
        let mapped = container.map(&mut |n| n * 10);
        assert_eq!(mapped.alternatives(), vec![vec![10, 20]]);
    }

    #[test]
    fn test_security_serde_tag() {
        let json = serde_json::to_value(Security::Header { name: "key".into() }).unwrap();
        assert_eq!(json, serde_json::json!({"type": "header", "name": "key"}));
    }
}

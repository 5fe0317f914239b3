//! Configuration section types.

use serde::{Deserialize, Serialize};

/// Deployment mode.
///
/// Production mode is hardened: error messages that are not meant for
/// clients are replaced by the reason phrase of their status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Full error messages in responses.
    #[default]
    Development,
    /// Hardened error messages.
    Production,
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(format!("unknown mode '{other}'")),
        }
    }
}

/// Where request and response schemas are placed in the generated document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Composition {
    /// Schemas are written inline in each operation.
    #[default]
    Inline,
    /// Schemas are moved into `components.schemas` and referenced.
    Components,
}

impl std::str::FromStr for Composition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "inline" => Ok(Self::Inline),
            "components" => Ok(Self::Components),
            other => Err(format!("unknown composition '{other}'")),
        }
    }
}

/// Documentation generator settings.
///
/// # Example
///
/// ```
/// use tessera_config::{Composition, DocsConfig};
///
/// let docs = DocsConfig {
///     composition: Composition::Components,
///     ..Default::default()
/// };
/// assert!(docs.has_summary_from_description);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DocsConfig {
    /// Document title.
    #[serde(default = "default_title")]
    pub title: String,

    /// API version written to `info.version`.
    #[serde(default = "default_version")]
    pub version: String,

    /// Server URLs written to `servers`.
    #[serde(default)]
    pub servers: Vec<String>,

    /// Schema placement.
    #[serde(default)]
    pub composition: Composition,

    /// Derive the summary from the description when no short description is set.
    #[serde(default = "default_true")]
    pub has_summary_from_description: bool,

    /// Fallback description of positive responses.
    #[serde(default = "default_positive_description")]
    pub positive_response_description: String,

    /// Fallback description of negative responses.
    #[serde(default = "default_negative_description")]
    pub negative_response_description: String,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            version: default_version(),
            servers: Vec::new(),
            composition: Composition::default(),
            has_summary_from_description: true,
            positive_response_description: default_positive_description(),
            negative_response_description: default_negative_description(),
        }
    }
}

fn default_title() -> String {
    "Tessera API".to_string()
}

fn default_version() -> String {
    "0.1.0".to_string()
}

fn default_positive_description() -> String {
    "Successful response".to_string()
}

fn default_negative_description() -> String {
    "Error response".to_string()
}

const fn default_true() -> bool {
    true
}

/// A documented tag.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TagConfig {
    /// Tag description.
    #[serde(default)]
    pub description: Option<String>,

    /// External documentation URL.
    #[serde(default)]
    pub url: Option<String>,
}

impl TagConfig {
    /// Creates a tag with a description.
    #[must_use]
    pub fn described(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            url: None,
        }
    }

    /// Sets the external documentation URL.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

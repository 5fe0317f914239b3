//! Main configuration types.
//!
//! This module provides the top-level [`TesseraConfig`] struct and its builder.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tessera_core::{InputSource, InputSources, Method};
use tessera_telemetry::LogConfig;

use crate::{ConfigError, DocsConfig, Mode, TagConfig};

/// Complete Tessera configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load configuration from files
/// and environment variables.
///
/// # Example
///
/// ```
/// use tessera_config::TesseraConfig;
///
/// let config = TesseraConfig::default();
/// assert!(!config.cors);
/// assert!(!config.is_hardened());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct TesseraConfig {
    /// Attach CORS headers to every endpoint response and answer `OPTIONS`.
    #[serde(default)]
    pub cors: bool,

    /// Deployment mode.
    #[serde(default)]
    pub mode: Mode,

    /// Input source overrides per method.
    #[serde(default)]
    pub input_sources: InputSources,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LogConfig,

    /// Documentation generator settings.
    #[serde(default)]
    pub docs: DocsConfig,

    /// Tags with descriptions, keyed by name.
    #[serde(default)]
    pub tags: IndexMap<String, TagConfig>,
}

impl TesseraConfig {
    /// Create a new configuration builder.
    ///
    /// # Example
    ///
    /// ```
    /// use tessera_config::{Mode, TesseraConfig};
    ///
    /// let config = TesseraConfig::builder()
    ///     .cors(true)
    ///     .mode(Mode::Production)
    ///     .build();
    ///
    /// assert!(config.cors);
    /// assert!(config.is_hardened());
    /// ```
    #[must_use]
    pub fn builder() -> TesseraConfigBuilder {
        TesseraConfigBuilder::new()
    }

    /// Returns `true` in production mode.
    #[must_use]
    pub fn is_hardened(&self) -> bool {
        self.mode == Mode::Production
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - The logging filter directive does not parse
    /// - An input source override is empty or repeats a source
    /// - A response description or tag name is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.logging.enabled {
            tessera_telemetry::create_env_filter(&self.logging.level)
                .map_err(|err| ConfigError::invalid_value("logging.level", err.to_string()))?;
        }

        for method in Method::ALL {
            let overridden = match method {
                Method::Get => &self.input_sources.get,
                Method::Post => &self.input_sources.post,
                Method::Put => &self.input_sources.put,
                Method::Delete => &self.input_sources.delete,
                Method::Patch => &self.input_sources.patch,
            };
            if let Some(sources) = overridden {
                validate_sources(method, sources)?;
            }
        }

        if self.docs.positive_response_description.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "docs.positive_response_description",
                "must not be empty",
            ));
        }
        if self.docs.negative_response_description.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "docs.negative_response_description",
                "must not be empty",
            ));
        }

        if self.tags.keys().any(|name| name.trim().is_empty()) {
            return Err(ConfigError::invalid_value("tags", "tag names must not be empty"));
        }

        Ok(())
    }

    /// Create a development configuration preset.
    ///
    /// - Pretty debug logging
    /// - Full error messages
    /// - CORS enabled
    ///
    /// # Example
    ///
    /// ```
    /// use tessera_config::TesseraConfig;
    ///
    /// let config = TesseraConfig::development();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn development() -> Self {
        Self {
            cors: true,
            mode: Mode::Development,
            logging: LogConfig::development(),
            ..Self::default()
        }
    }

    /// Create a production configuration preset.
    ///
    /// - JSON info logging
    /// - Hardened error messages
    ///
    /// # Example
    ///
    /// ```
    /// use tessera_config::TesseraConfig;
    ///
    /// let config = TesseraConfig::production();
    /// assert!(config.is_hardened());
    /// ```
    #[must_use]
    pub fn production() -> Self {
        Self {
            mode: Mode::Production,
            logging: LogConfig::production(),
            ..Self::default()
        }
    }
}

fn validate_sources(method: Method, sources: &[InputSource]) -> Result<(), ConfigError> {
    let field = format!("input_sources.{}", method.as_str());
    if sources.is_empty() {
        return Err(ConfigError::invalid_value(field, "must list at least one source"));
    }
    for (index, source) in sources.iter().enumerate() {
        if sources[..index].contains(source) {
            return Err(ConfigError::invalid_value(
                field,
                format!("source {source:?} is listed twice"),
            ));
        }
    }
    Ok(())
}

/// Builder for [`TesseraConfig`].
#[derive(Debug, Default)]
pub struct TesseraConfigBuilder {
    config: TesseraConfig,
}

impl TesseraConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable CORS.
    #[must_use]
    pub fn cors(mut self, cors: bool) -> Self {
        self.config.cors = cors;
        self
    }

    /// Set the deployment mode.
    #[must_use]
    pub fn mode(mut self, mode: Mode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Override the input sources of one method.
    #[must_use]
    pub fn input_sources(mut self, method: Method, sources: Vec<InputSource>) -> Self {
        self.config.input_sources = self.config.input_sources.with(method, sources);
        self
    }

    /// Set the logging configuration.
    #[must_use]
    pub fn logging(mut self, logging: LogConfig) -> Self {
        self.config.logging = logging;
        self
    }

    /// Set the documentation settings.
    #[must_use]
    pub fn docs(mut self, docs: DocsConfig) -> Self {
        self.config.docs = docs;
        self
    }

    /// Add a documented tag.
    #[must_use]
    pub fn tag(mut self, name: impl Into<String>, tag: TagConfig) -> Self {
        self.config.tags.insert(name.into(), tag);
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> TesseraConfig {
        self.config
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if validation fails.
    pub fn build_validated(self) -> Result<TesseraConfig, ConfigError> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Composition;

    #[test]
    fn test_default_config() {
        let config = TesseraConfig::default();
        assert!(!config.cors);
        assert_eq!(config.mode, Mode::Development);
        assert_eq!(config.docs.composition, Composition::Inline);
        assert!(config.tags.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_all_sections() {
        let config = TesseraConfig::builder()
            .cors(true)
            .mode(Mode::Production)
            .input_sources(Method::Get, vec![InputSource::Query, InputSource::Headers])
            .tag("users", TagConfig::described("Everything about users"))
            .build();

        assert!(config.cors);
        assert!(config.is_hardened());
        assert_eq!(
            config.input_sources.for_method(Method::Get),
            &[InputSource::Query, InputSource::Headers]
        );
        assert_eq!(config.tags.len(), 1);
    }

    #[test]
    fn test_presets_validate() {
        assert!(TesseraConfig::development().validate().is_ok());
        assert!(TesseraConfig::production().validate().is_ok());
        assert!(TesseraConfig::development().cors);
        assert!(!TesseraConfig::production().cors);
    }

    #[test]
    fn test_validate_empty_sources() {
        let err = TesseraConfig::builder()
            .input_sources(Method::Post, Vec::new())
            .build_validated()
            .unwrap_err();
        assert!(err.to_string().contains("input_sources.post"));
    }

    #[test]
    fn test_validate_repeated_source() {
        let err = TesseraConfig::builder()
            .input_sources(Method::Put, vec![InputSource::Body, InputSource::Body])
            .build_validated()
            .unwrap_err();
        assert!(err.to_string().contains("listed twice"));
    }

    #[test]
    fn test_validate_bad_log_level() {
        let config = TesseraConfig::builder()
            .logging(LogConfig {
                level: "tessera=loud".into(),
                ..LogConfig::default()
            })
            .build();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "logging.level"
        ));
    }

    #[test]
    fn test_validate_empty_description() {
        let config = TesseraConfig::builder()
            .docs(DocsConfig {
                negative_response_description: "  ".into(),
                ..DocsConfig::default()
            })
            .build();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialize_rejects_unknown_top_level() {
        let result = toml::from_str::<TesseraConfig>("cros = true");
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_tags_keep_order() {
        let config: TesseraConfig = serde_json::from_str(
            r#"{"tags": {"users": {"description": "Users"}, "files": {"url": "https://example.com/files"}}}"#,
        )
        .unwrap();
        let names: Vec<&str> = config.tags.keys().map(String::as_str).collect();
        assert_eq!(names, ["users", "files"]);
    }
}

//! Configuration loader with layered approach.
//!
//! This module provides the [`ConfigLoader`] for loading configuration from
//! multiple sources: defaults, files, and environment variables.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;

use tessera_core::{InputSource, Method};
use tessera_telemetry::LogFormat;

use crate::{ConfigError, TesseraConfig};

/// Configuration loader with layered approach.
///
/// The loader applies configuration in layers, with later layers overriding
/// earlier ones:
/// 1. Default values (or a preset)
/// 2. Configuration file (TOML or JSON)
/// 3. Environment variables named `PREFIX__SECTION__KEY`
///
/// # Example
///
/// ```no_run
/// use tessera_config::ConfigLoader;
///
/// # fn main() -> Result<(), tessera_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_defaults()
///     .with_file("tessera.toml")?
///     .with_env_prefix("TESSERA")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: TesseraConfig,
    env_prefix: Option<String>,
    file_loaded: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: TesseraConfig::default(),
            env_prefix: None,
            file_loaded: false,
        }
    }

    /// Start with default configuration values.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = TesseraConfig::default();
        self
    }

    /// Start with the development preset.
    ///
    /// # Example
    ///
    /// ```
    /// use tessera_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_development()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert!(config.cors);
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = TesseraConfig::development();
        self
    }

    /// Start with the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = TesseraConfig::production();
        self
    }

    /// Load configuration from a file.
    ///
    /// The format is chosen by extension: `.toml` or `.json`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The file does not exist
    /// - The file cannot be read
    /// - The file contains invalid TOML/JSON or unknown fields
    /// - The extension is neither `toml` nor `json`
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content =
            fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        let file_config = Self::parse(&content, &format)?;
        self.merge_config(file_config);
        self.file_loaded = true;

        Ok(self)
    }

    /// Load configuration from a file if it exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be parsed.
    pub fn with_optional_file(self, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from a string in the named format (`toml` or `json`).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the content does not parse.
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        let parsed = Self::parse(content, &format.to_lowercase())?;
        self.merge_config(parsed);
        self.file_loaded = true;
        Ok(self)
    }

    /// Enable environment overrides with the given prefix.
    ///
    /// `TESSERA__LOGGING__LEVEL=debug` sets `logging.level` for the prefix
    /// `TESSERA`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into().to_uppercase());
        self
    }

    /// Load a `.env` file from the working directory, if present.
    #[must_use]
    pub fn with_dotenv(self) -> Self {
        let _ = dotenvy::dotenv();
        self
    }

    /// Returns `true` if a file or string layer was applied.
    #[must_use]
    pub const fn file_loaded(&self) -> bool {
        self.file_loaded
    }

    /// Apply environment overrides and validate.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an override does not parse or validation fails.
    pub fn load(mut self) -> Result<TesseraConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_overrides(&prefix)?;
        }

        self.config.validate()?;

        Ok(self.config)
    }

    /// Returns the configuration without environment overrides or validation.
    #[must_use]
    pub fn load_unvalidated(self) -> TesseraConfig {
        self.config
    }

    fn parse(content: &str, format: &str) -> Result<TesseraConfig, ConfigError> {
        match format {
            "toml" => Ok(toml::from_str(content)?),
            "json" => Ok(serde_json::from_str(content)?),
            other => Err(ConfigError::unsupported_format(other)),
        }
    }

    // A file replaces the whole configuration; sections it omits take their defaults.
    fn merge_config(&mut self, file_config: TesseraConfig) {
        self.config = file_config;
    }

    fn apply_env_overrides(&mut self, prefix: &str) -> Result<(), ConfigError> {
        let env_vars: BTreeMap<String, String> = env::vars()
            .filter(|(k, _)| k.starts_with(prefix))
            .collect();

        for (key, value) in env_vars {
            self.apply_env_var(&key, &value, prefix)?;
        }

        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let Some(key_without_prefix) = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
        else {
            // Another variable sharing the prefix, e.g. TESSERA_HOME.
            return Ok(());
        };

        let parts: Vec<&str> = key_without_prefix.split("__").collect();

        match parts.as_slice() {
            ["CORS"] => {
                self.config.cors = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["MODE"] => {
                self.config.mode = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected 'development' or 'production'"))?;
            }

            ["INPUT_SOURCES", method] => {
                let method: Method = method
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "unknown method"))?;
                let sources = parse_sources(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected comma separated sources"))?;
                self.config.input_sources = std::mem::take(&mut self.config.input_sources).with(method, sources);
            }

            ["LOGGING", "ENABLED"] => {
                self.config.logging.enabled = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["LOGGING", "LEVEL"] => {
                self.config.logging.level = value.to_string();
            }
            ["LOGGING", "FORMAT"] => {
                self.config.logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'json' or 'pretty'",
                        ))
                    }
                };
            }
            ["LOGGING", "ANSI"] => {
                self.config.logging.ansi = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }

            ["DOCS", "TITLE"] => {
                self.config.docs.title = value.to_string();
            }
            ["DOCS", "VERSION"] => {
                self.config.docs.version = value.to_string();
            }
            ["DOCS", "COMPOSITION"] => {
                self.config.docs.composition = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected 'inline' or 'components'"))?;
            }
            ["DOCS", "HAS_SUMMARY_FROM_DESCRIPTION"] => {
                self.config.docs.has_summary_from_description = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }

            // Unknown key - ignore
            _ => {}
        }

        Ok(())
    }
}

/// Parse a boolean from a string.
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse `query,params` into input sources.
fn parse_sources(s: &str) -> Option<Vec<InputSource>> {
    s.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| match part.to_lowercase().as_str() {
            "query" => Some(InputSource::Query),
            "body" => Some(InputSource::Body),
            "params" => Some(InputSource::Params),
            "files" => Some(InputSource::Files),
            "headers" => Some(InputSource::Headers),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Composition, Mode};
    use std::io::Write;

    #[test]
    fn test_loader_new() {
        let config = ConfigLoader::new().load().unwrap();
        assert!(!config.cors);
        assert_eq!(config.mode, Mode::Development);
    }

    #[test]
    fn test_loader_presets() {
        assert_eq!(ConfigLoader::new().with_production().load().unwrap().mode, Mode::Production);
        assert!(ConfigLoader::new().with_development().load().unwrap().cors);
    }

    #[test]
    fn test_with_string_toml() {
        let config = ConfigLoader::new()
            .with_string(
                r#"
                cors = true
                mode = "production"

                [input_sources]
                get = ["query", "params", "headers"]

                [docs]
                composition = "components"
                "#,
                "toml",
            )
            .unwrap()
            .load()
            .unwrap();

        assert!(config.cors);
        assert_eq!(config.mode, Mode::Production);
        assert_eq!(config.docs.composition, Composition::Components);
        assert_eq!(
            config.input_sources.for_method(Method::Get),
            &[InputSource::Query, InputSource::Params, InputSource::Headers]
        );
    }

    #[test]
    fn test_with_string_json() {
        let config = ConfigLoader::new()
            .with_string(r#"{"logging": {"level": "warn"}}"#, "json")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_with_string_unknown_field() {
        let result = ConfigLoader::new().with_string("[server]\nport = 1", "toml");
        assert!(matches!(result, Err(ConfigError::TomlError(_))));
    }

    #[test]
    fn test_with_string_unsupported_format() {
        let result = ConfigLoader::new().with_string("cors: true", "yaml");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat { .. })));
    }

    #[test]
    fn test_with_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "cors = true").unwrap();

        let loader = ConfigLoader::new().with_file(file.path()).unwrap();
        assert!(loader.file_loaded());
        assert!(loader.load().unwrap().cors);
    }

    #[test]
    fn test_with_file_missing() {
        let result = ConfigLoader::new().with_file("/nonexistent/tessera.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_with_optional_file_missing() {
        let loader = ConfigLoader::new()
            .with_optional_file("/nonexistent/tessera.toml")
            .unwrap();
        assert!(!loader.file_loaded());
    }

    #[test]
    fn test_env_overrides() {
        env::set_var("TESSERA_LOADER_A__CORS", "yes");
        env::set_var("TESSERA_LOADER_A__MODE", "production");
        env::set_var("TESSERA_LOADER_A__LOGGING__FORMAT", "pretty");
        env::set_var("TESSERA_LOADER_A__INPUT_SOURCES__DELETE", "query, headers");
        env::set_var("TESSERA_LOADER_A__DOCS__COMPOSITION", "components");

        let config = ConfigLoader::new()
            .with_env_prefix("tessera_loader_a")
            .load()
            .unwrap();

        assert!(config.cors);
        assert!(config.is_hardened());
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(
            config.input_sources.for_method(Method::Delete),
            &[InputSource::Query, InputSource::Headers]
        );
        assert_eq!(config.docs.composition, Composition::Components);
    }

    #[test]
    fn test_env_override_invalid_bool() {
        env::set_var("TESSERA_LOADER_B__CORS", "maybe");
        let result = ConfigLoader::new().with_env_prefix("TESSERA_LOADER_B").load();
        assert!(matches!(result, Err(ConfigError::EnvParseError { .. })));
    }

    #[test]
    fn test_env_override_invalid_source() {
        env::set_var("TESSERA_LOADER_C__INPUT_SOURCES__GET", "query,cookies");
        let result = ConfigLoader::new().with_env_prefix("TESSERA_LOADER_C").load();
        assert!(matches!(result, Err(ConfigError::EnvParseError { .. })));
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("ON"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("nope"), None);
    }

    #[test]
    fn test_parse_sources() {
        assert_eq!(
            parse_sources("body,params"),
            Some(vec![InputSource::Body, InputSource::Params])
        );
        assert_eq!(parse_sources("body,cookie"), None);
    }
}

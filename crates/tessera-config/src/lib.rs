//! Typed configuration for Tessera.
//!
//! This crate provides the [`TesseraConfig`] struct read by the server and
//! documentation crates, with support for:
//! - TOML and JSON configuration files
//! - Environment variable overrides
//! - Strict validation (fails on unknown fields)
//! - Layered configuration (defaults → file → env)
//!
//! # Configuration File Format
//!
//! ```toml
//! cors = true
//! mode = "production"
//!
//! [input_sources]
//! get = ["query", "params", "headers"]
//!
//! [logging]
//! level = "info"
//! format = "json"
//!
//! [docs]
//! title = "Example API"
//! composition = "components"
//! has_summary_from_description = true
//!
//! [tags.users]
//! description = "Everything about users"
//! url = "https://example.com/docs/users"
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Field |
//! |---|---|
//! | `TESSERA__CORS` | `cors` |
//! | `TESSERA__MODE` | `mode` |
//! | `TESSERA__INPUT_SOURCES__GET` | `input_sources.get` (comma separated) |
//! | `TESSERA__LOGGING__LEVEL` | `logging.level` |
//! | `TESSERA__LOGGING__FORMAT` | `logging.format` |
//! | `TESSERA__DOCS__COMPOSITION` | `docs.composition` |

#![doc(html_root_url = "https://docs.rs/tessera-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::{TesseraConfig, TesseraConfigBuilder};
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{Composition, DocsConfig, Mode, TagConfig};
pub use tessera_telemetry::{LogConfig, LogFormat};

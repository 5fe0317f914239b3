//! Logging for Tessera.
//!
//! The engine logs through `tracing` macros only. This crate installs a
//! `tracing-subscriber` stack for applications that do not bring their own:
//!
//! - JSON output for production, pretty output for development
//! - Level filtering through [`EnvFilter`](tracing_subscriber::EnvFilter) directives
//! - Field names shared by the server and documentation crates ([`fields`])
//!
//! # Example
//!
//! ```rust,ignore
//! use tessera_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development())?;
//! tracing::info!("GET: /v1/user/:id");
//! ```

#![doc(html_root_url = "https://docs.rs/tessera-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, fields, init_logging, LogConfig, LogFormat};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

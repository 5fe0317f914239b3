//! # Tessera Docs
//!
//! OpenAPI generation for Tessera routing trees.
//!
//! This crate provides:
//! - **Document generation** from the same schemas endpoints validate with
//! - **Deterministic naming** of operations, components and security schemes
//! - **Warnings** for schemas with no JSON representation
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tessera_docs::Documentation;
//!
//! let documentation = Documentation::new(&routing, &config)?;
//! for warning in documentation.warnings() {
//!     eprintln!("{} {}: {}", warning.method, warning.path, warning.message);
//! }
//! std::fs::write("openapi.yaml", documentation.to_yaml()?)?;
//! ```
//!
//! Input fields are split by the configured input sources: path parameters
//! come from the route, `x-` prefixed fields become header parameters,
//! the rest go to the query or the request body.

#![doc(html_root_url = "https://docs.rs/tessera-docs/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod depict;
mod documentation;
mod error;
pub mod openapi;

pub use depict::{ensure_short_description, make_clean_id, reformat_path, Direction};
pub use documentation::{Documentation, DocumentationState, DocumentationWarning};
pub use error::{DocumentationError, DocumentationResult};
pub use openapi::{
    Components, Example, Info, MediaType, OpenApi, Operation, Parameter, ParameterIn, PathItem,
    RequestBody, Response, SchemaObject, SchemaType, SecurityRequirement, SecurityScheme, Server,
    Tag,
};

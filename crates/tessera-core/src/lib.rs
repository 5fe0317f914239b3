//! # Tessera Core
//!
//! Core types for the Tessera request-handling engine.
//!
//! This crate provides the building blocks shared by every other Tessera crate:
//!
//! - [`schema`] - Schema nodes, validation and the composition algebra
//! - [`TesseraError`] / [`HttpError`] - Error taxonomy of the request lifecycle
//! - [`Method`] / [`InputSources`] - Routed methods and where input comes from
//! - [`IncomingRequest`] / [`OutgoingResponse`] - Transport-neutral request and response
//! - [`Options`] - Append-only map of middleware contributions
//! - [`Security`] / [`LogicalContainer`] - Security declarations for documentation

#![doc(html_root_url = "https://docs.rs/tessera-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod method;
mod options;
mod request;
mod response;
pub mod schema;
mod security;

pub use error::{
    panic_message, HttpError, TesseraError, TesseraResult, ValidationIssue, ValidationIssues,
};
pub use method::{InputSource, InputSources, Method, UnknownMethod};
pub use options::{Options, OptionsError};
pub use request::{IncomingRequest, RequestParseError};
pub use response::OutgoingResponse;
pub use schema::{ObjectSchema, Schema, SchemaError, SchemaKind};
pub use security::{LogicalContainer, OAuthFlow, Security};

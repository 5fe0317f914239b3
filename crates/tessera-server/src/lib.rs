//! # Tessera Server
//!
//! Endpoint execution for the Tessera engine.
//!
//! This crate turns schemas, middlewares and handlers into running endpoints:
//!
//! - [`EndpointsFactory`] builds immutable [`Endpoint`]s
//! - [`Endpoint::execute`] drives one request through the [`Lifecycle`]
//! - [`ResultHandler`]s shape every response, with a last-resort fallback
//! - [`init_routing`] registers a routing tree with any [`RouteRegistrar`]
//! - [`App`] is an in-memory registrar and dispatcher
//!
//! ## Request flow
//!
//! ```text
//! request ─► extract input ─► validate ─► middlewares ─► handler ─► validate output
//!                               │              │            │             │
//!                               └──────────────┴─── error ──┴─────────────┤
//!                                                                         ▼
//!                                                                 result handler ─► response
//! ```

#![doc(html_root_url = "https://docs.rs/tessera-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod app;
mod endpoint;
mod factory;
mod handler;
pub mod helpers;
mod lifecycle;
pub mod result_handler;
mod routing;
pub mod static_files;

pub use app::App;
pub use endpoint::{Endpoint, Execution, OperationId};
pub use factory::{ConfigurationError, EndpointBuilder, EndpointsFactory};
pub use handler::{erase, Empty, ErasedHandler, FnHandler, Handler};
pub use helpers::{last_resort_handler, not_found_handler, parser_failure_handler, ResultHandlerError};
pub use lifecycle::{Lifecycle, Stage};
pub use result_handler::{
    ApiResponse, ArrayResultHandler, DefaultResultHandler, ResultHandler, ResultParams,
};
pub use routing::{init_routing, RouteHandler, RouteRegistrar};

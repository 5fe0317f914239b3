//! Routing for Tessera.
//!
//! This crate provides the declarative [`Routing`] tree that applications
//! mount endpoints on, the pure [`walk`](Routing::walk) over it shared by the
//! server and the documentation generator, and a [`PathTree`] that matches
//! concrete request paths back to registered patterns.
//!
//! # Example
//!
//! ```rust
//! use tessera_core::Method;
//! use tessera_router::{DependsOnMethod, RouteTarget, Routing, Visit};
//!
//! struct Stub(Vec<Method>);
//!
//! impl RouteTarget for Stub {
//!     fn methods(&self) -> &[Method] {
//!         &self.0
//!     }
//! }
//!
//! let routing = Routing::new().nest(
//!     "v1",
//!     Routing::new()
//!         .endpoint(":id", Stub(vec![Method::Get]))
//!         .depends_on_method(
//!             "user",
//!             DependsOnMethod::new()
//!                 .with(Method::Get, Stub(vec![Method::Get]))
//!                 .with(Method::Post, Stub(vec![Method::Post])),
//!         ),
//! );
//!
//! let paths: Vec<String> = routing
//!     .walk()
//!     .filter_map(|visit| match visit {
//!         Ok(Visit::Endpoint(entry)) => Some(format!("{} {}", entry.method, entry.path)),
//!         _ => None,
//!     })
//!     .collect();
//! assert_eq!(paths, ["GET /v1/:id", "GET /v1/user", "POST /v1/user"]);
//! ```

mod node;
mod params;
mod routing;
mod walker;

pub use node::PathTree;
pub use params::Params;
pub use routing::{DependsOnMethod, RouteTarget, Routing, RoutingNode, ServeStatic, StaticOptions};
pub use walker::{EndpointEntry, RoutingError, Visit, Walk};

//! # Tessera
//!
//! **Schema-driven request handling with OpenAPI generation**
//!
//! Tessera turns a declarative routing tree of endpoints into:
//!
//! - validated, typed handler calls with options contributed by middlewares
//! - responses shaped by pluggable result handlers
//! - an OpenAPI document generated from the very same schemas
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tessera::prelude::*;
//!
//! let user = EndpointsFactory::default()
//!     .endpoint()
//!     .input(Schema::object(ObjectSchema::new().field("id", Schema::string())))
//!     .output(Schema::object(ObjectSchema::new().field("name", Schema::string())))
//!     .build(FnHandler::new(|input: serde_json::Value, _options: Options| async move {
//!         Ok(serde_json::json!({"name": format!("user {}", input["id"])}))
//!     }))?;
//!
//! let routing = Routing::new().nest("v1", Routing::new().nest("user", Routing::new().endpoint(":id", user)));
//! let config = ConfigLoader::new().with_env_prefix("TESSERA").load()?;
//! init_logging(&config.logging)?;
//!
//! let app = App::from_routing(config.clone(), &routing)?;
//! let yaml = Documentation::new(&routing, &config)?.to_yaml()?;
//! ```
//!
//! ## Request flow
//!
//! ```text
//! request → input sources → input schema → middlewares → handler → output schema
//!                                                                      ↓
//!                                          response ← result handler ←─┘
//! ```

#![doc(html_root_url = "https://docs.rs/tessera/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use tessera_core as core;

// Re-export routing types
pub use tessera_router as router;

// Re-export middleware types
pub use tessera_middleware as middleware;

// Re-export configuration types
pub use tessera_config as config;

// Re-export logging setup
pub use tessera_telemetry as telemetry;

// Re-export server types
pub use tessera_server as server;

// Re-export documentation types
pub use tessera_docs as docs;

/// Prelude module for convenient imports.
///
/// ```rust
/// use tessera::prelude::*;
///
/// let schema = Schema::object(ObjectSchema::new().field("id", Schema::string()));
/// assert!(schema.as_object().is_some());
/// ```
pub mod prelude {
    pub use tessera_core::{
        HttpError, IncomingRequest, InputSource, LogicalContainer, Method, ObjectSchema, Options,
        OutgoingResponse, Schema, Security, TesseraError, TesseraResult,
    };

    pub use tessera_router::{DependsOnMethod, Routing, RoutingError, ServeStatic};

    pub use tessera_middleware::{FnMiddleware, Middleware};

    pub use tessera_config::{ConfigLoader, Mode, TesseraConfig};

    pub use tessera_telemetry::init_logging;

    pub use tessera_server::{
        init_routing, ApiResponse, App, ArrayResultHandler, DefaultResultHandler, Empty, Endpoint,
        EndpointsFactory, FnHandler, Handler, ResultHandler, ResultParams, RouteRegistrar,
    };

    pub use tessera_docs::{Documentation, DocumentationError, DocumentationWarning};
}

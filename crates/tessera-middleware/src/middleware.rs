//! Core middleware trait and types.
//!
//! A middleware runs before the endpoint handler. It declares an input schema
//! that becomes part of the endpoint's final input schema, receives the
//! validated input together with the options contributed by earlier
//! middlewares, and may contribute new option keys or reject the request.
//!
//! # Example
//!
//! ```
//! use serde_json::{json, Map};
//! use tessera_core::schema::ObjectSchema;
//! use tessera_core::{HttpError, Schema};
//! use tessera_middleware::FnMiddleware;
//!
//! let auth = FnMiddleware::new(
//!     "auth",
//!     Schema::object(ObjectSchema::new().field("key", Schema::string())),
//!     |input, _options, _request| async move {
//!         if input.get("key") != Some(&json!("123")) {
//!             return Err(HttpError::unauthorized("Invalid key"));
//!         }
//!         let mut provided = Map::new();
//!         provided.insert("user".into(), json!({"name": "Jane"}));
//!         Ok(provided)
//!     },
//! )
//! .provides(["user"]);
//! ```

use serde_json::{Map, Value};
use std::future::Future;
use std::pin::Pin;
use tessera_core::{HttpError, IncomingRequest, LogicalContainer, Options, Schema, Security};

/// A boxed future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The core middleware trait.
///
/// # Invariants
///
/// - A middleware holds no per-request state between calls
/// - Only keys listed by [`provides`](Middleware::provides) may be returned
/// - A rejection stops the chain; later middlewares and the handler never run
pub trait Middleware: Send + Sync + 'static {
    /// Returns the name used in logs and error records.
    ///
    /// Names are informative only and may repeat within a chain.
    fn name(&self) -> &str;

    /// Returns the schema this middleware contributes to the endpoint input.
    fn input_schema(&self) -> &Schema;

    /// Returns the option keys this middleware may add.
    fn provides(&self) -> &[String];

    /// Returns the security declaration for documentation.
    fn security(&self) -> Option<&LogicalContainer<Security>> {
        None
    }

    /// Runs the middleware.
    ///
    /// # Arguments
    ///
    /// * `input` - The validated endpoint input
    /// * `options` - Options contributed by earlier middlewares
    /// * `request` - The incoming request
    ///
    /// # Returns
    ///
    /// The option entries to add, or a rejection.
    fn handle<'a>(
        &'a self,
        input: &'a Map<String, Value>,
        options: &'a Options,
        request: &'a IncomingRequest,
    ) -> BoxFuture<'a, Result<Map<String, Value>, HttpError>>;
}

/// A middleware created from an async function.
///
/// The function receives owned copies of the input, the options and the
/// request, so the returned future may be `'static`.
pub struct FnMiddleware<F> {
    name: String,
    schema: Schema,
    provides: Vec<String>,
    security: Option<LogicalContainer<Security>>,
    func: F,
}

impl<F> FnMiddleware<F> {
    /// Creates a function-based middleware.
    pub fn new<Fut>(name: impl Into<String>, schema: Schema, func: F) -> Self
    where
        F: Fn(Map<String, Value>, Options, IncomingRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Map<String, Value>, HttpError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            schema,
            provides: Vec::new(),
            security: None,
            func,
        }
    }

    /// Declares the option keys this middleware adds.
    #[must_use]
    pub fn provides<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.provides = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Attaches a security declaration.
    #[must_use]
    pub fn security(mut self, security: impl Into<LogicalContainer<Security>>) -> Self {
        self.security = Some(security.into());
        self
    }
}

impl<F> std::fmt::Debug for FnMiddleware<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnMiddleware")
            .field("name", &self.name)
            .field("provides", &self.provides)
            .finish_non_exhaustive()
    }
}

impl<F, Fut> Middleware for FnMiddleware<F>
where
    F: Fn(Map<String, Value>, Options, IncomingRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Map<String, Value>, HttpError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn input_schema(&self) -> &Schema {
        &self.schema
    }

    fn provides(&self) -> &[String] {
        &self.provides
    }

    fn security(&self) -> Option<&LogicalContainer<Security>> {
        self.security.as_ref()
    }

    fn handle<'a>(
        &'a self,
        input: &'a Map<String, Value>,
        options: &'a Options,
        request: &'a IncomingRequest,
    ) -> BoxFuture<'a, Result<Map<String, Value>, HttpError>> {
        Box::pin((self.func)(input.clone(), options.clone(), request.clone()))
    }
}

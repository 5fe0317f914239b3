//! Building endpoints.
//!
//! ```
//! use serde_json::{json, Value};
//! use tessera_core::schema::ObjectSchema;
//! use tessera_core::{Method, Options, Schema};
//! use tessera_server::{EndpointsFactory, FnHandler};
//!
//! let endpoint = EndpointsFactory::default()
//!     .endpoint()
//!     .method(Method::Post)
//!     .input(Schema::object(ObjectSchema::new().field("test", Schema::number())))
//!     .output(Schema::object(ObjectSchema::new().field("result", Schema::boolean())))
//!     .describe("Checks the test value")
//!     .build(FnHandler::new(|_input: Value, _options: Options| async move {
//!         Ok(json!({"result": true}))
//!     }))
//!     .unwrap();
//!
//! assert_eq!(endpoint.methods(), &[Method::Post]);
//! ```

use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use tessera_core::schema::{final_input_schema, flatten_to_object_variants, SchemaError};
use tessera_core::{Method, Schema};
use tessera_middleware::{BoxedMiddleware, ChainError, Middleware, MiddlewareChain};
use thiserror::Error;

use crate::endpoint::{Endpoint, OperationId};
use crate::handler::{erase, Handler};
use crate::result_handler::{DefaultResultHandler, ResultHandler};

/// Fatal endpoint build errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// Input schemas overlap.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Two middlewares provide the same option.
    #[error(transparent)]
    DuplicateOption(#[from] ChainError),

    /// The method list is empty.
    #[error("an endpoint must accept at least one method")]
    NoMethods,

    /// A top-level schema does not describe an object.
    #[error("the {which} schema of an endpoint must describe an object")]
    NotAnObject {
        /// `input` or `output`.
        which: &'static str,
    },
}

/// Creates endpoints sharing a result handler and a middleware prefix.
///
/// Adding a middleware returns a new factory; existing factories and the
/// endpoints they built are unaffected.
#[derive(Clone)]
pub struct EndpointsFactory {
    result_handler: Arc<dyn ResultHandler>,
    middlewares: Vec<BoxedMiddleware>,
}

impl Default for EndpointsFactory {
    fn default() -> Self {
        Self::new(DefaultResultHandler)
    }
}

impl std::fmt::Debug for EndpointsFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointsFactory")
            .field(
                "middlewares",
                &self.middlewares.iter().map(|m| m.name()).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

impl EndpointsFactory {
    /// Creates a factory using the given result handler.
    pub fn new(result_handler: impl ResultHandler) -> Self {
        Self {
            result_handler: Arc::new(result_handler),
            middlewares: Vec::new(),
        }
    }

    /// Returns a factory whose endpoints also run `middleware`.
    #[must_use]
    pub fn add_middleware(&self, middleware: impl Middleware) -> Self {
        self.add_boxed_middleware(Arc::new(middleware))
    }

    /// Like [`add_middleware`](Self::add_middleware) for a shared middleware.
    #[must_use]
    pub fn add_boxed_middleware(&self, middleware: BoxedMiddleware) -> Self {
        let mut factory = self.clone();
        factory.middlewares.push(middleware);
        factory
    }

    /// Starts describing an endpoint.
    #[must_use]
    pub fn endpoint(&self) -> EndpointBuilder {
        EndpointBuilder {
            result_handler: Arc::clone(&self.result_handler),
            middlewares: self.middlewares.clone(),
            methods: None,
            input: Schema::empty_object(),
            output: Schema::empty_object(),
            description: None,
            short_description: None,
            tags: Vec::new(),
            operation_id: None,
            scopes: Vec::new(),
        }
    }
}

/// Describes one endpoint. Finished by [`build`](Self::build).
#[must_use]
pub struct EndpointBuilder {
    result_handler: Arc<dyn ResultHandler>,
    middlewares: Vec<BoxedMiddleware>,
    methods: Option<Vec<Method>>,
    input: Schema,
    output: Schema,
    description: Option<String>,
    short_description: Option<String>,
    tags: Vec<String>,
    operation_id: Option<OperationId>,
    scopes: Vec<String>,
}

impl EndpointBuilder {
    /// Adds an accepted method. Without any, the endpoint accepts `GET`.
    pub fn method(mut self, method: Method) -> Self {
        let methods = self.methods.get_or_insert_with(Vec::new);
        if !methods.contains(&method) {
            methods.push(method);
        }
        self
    }

    /// Replaces the accepted methods.
    pub fn methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        let mut unique = Vec::new();
        for method in methods {
            if !unique.contains(&method) {
                unique.push(method);
            }
        }
        self.methods = Some(unique);
        self
    }

    /// Sets the endpoint's own input schema.
    pub fn input(mut self, schema: Schema) -> Self {
        self.input = schema;
        self
    }

    /// Sets the output schema.
    pub fn output(mut self, schema: Schema) -> Self {
        self.output = schema;
        self
    }

    /// Sets the description.
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the short description (documentation summary).
    pub fn short_description(mut self, summary: impl Into<String>) -> Self {
        self.short_description = Some(summary.into());
        self
    }

    /// Adds a tag.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Adds tags.
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Sets the same operation id for every method.
    pub fn operation_id(mut self, id: impl Into<String>) -> Self {
        self.operation_id = Some(OperationId::Fixed(id.into()));
        self
    }

    /// Computes the operation id from the method.
    pub fn operation_id_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(Method) -> String + Send + Sync + 'static,
    {
        self.operation_id = Some(OperationId::PerMethod(Arc::new(f)));
        self
    }

    /// Adds an oauth2/openid scope.
    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scopes.push(scope.into());
        self
    }

    /// Adds oauth2/openid scopes.
    pub fn scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes.extend(scopes.into_iter().map(Into::into));
        self
    }

    /// Builds the endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] when the method list is empty, a schema
    /// is not object-based, input fields overlap, or two middlewares provide
    /// the same option.
    pub fn build<H, I, O>(self, handler: H) -> Result<Endpoint, ConfigurationError>
    where
        H: Handler<I, O>,
        I: DeserializeOwned + Send + 'static,
        O: Serialize + Send + 'static,
    {
        let methods = self.methods.unwrap_or_else(|| vec![Method::Get]);
        if methods.is_empty() {
            return Err(ConfigurationError::NoMethods);
        }
        if flatten_to_object_variants(&self.input).is_empty() {
            return Err(ConfigurationError::NotAnObject { which: "input" });
        }
        if flatten_to_object_variants(&self.output).is_empty() {
            return Err(ConfigurationError::NotAnObject { which: "output" });
        }

        let middlewares = MiddlewareChain::new(self.middlewares)?;
        let input_schema = final_input_schema(&middlewares.input_schemas(), &self.input)?;
        let positive = self.result_handler.positive_response(&self.output);
        let negative = self.result_handler.negative_response();

        Ok(Endpoint {
            methods,
            middlewares,
            input_schema,
            output_schema: self.output,
            handler: erase(handler),
            result_handler: self.result_handler,
            description: self.description,
            short_description: self.short_description,
            tags: self.tags,
            operation_id: self.operation_id,
            scopes: self.scopes,
            positive,
            negative,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::Empty;
    use crate::result_handler::ArrayResultHandler;
    use serde_json::{json, Map, Value};
    use tessera_core::schema::ObjectSchema;
    use tessera_core::{Options, SchemaKind};
    use tessera_middleware::FnMiddleware;

    struct Noop;

    impl Handler<Empty, Value> for Noop {
        async fn handle(&self, _input: Empty, _options: Options) -> anyhow::Result<Value> {
            Ok(json!({}))
        }
    }

    fn noop() -> Noop {
        Noop
    }

    fn keyed(name: &'static str, field: &'static str, provides: &[&'static str]) -> BoxedMiddleware {
        Arc::new(
            FnMiddleware::new(
                name,
                Schema::object(ObjectSchema::new().field(field, Schema::string())),
                |_input, _options, _request| async move { Ok(Map::new()) },
            )
            .provides(provides.to_vec()),
        )
    }

    #[test]
    fn test_defaults() {
        let endpoint = EndpointsFactory::default().endpoint().build(noop()).unwrap();
        assert_eq!(endpoint.methods(), &[Method::Get]);
        assert!(endpoint.description().is_none());
        assert!(endpoint.operation_id(Method::Get).is_none());
        assert_eq!(endpoint.positive_responses().len(), 1);
        assert_eq!(endpoint.negative_responses().len(), 1);
    }

    #[test]
    fn test_methods_deduplicated() {
        let endpoint = EndpointsFactory::default()
            .endpoint()
            .method(Method::Put)
            .method(Method::Patch)
            .method(Method::Put)
            .build(noop())
            .unwrap();
        assert_eq!(endpoint.methods(), &[Method::Put, Method::Patch]);
    }

    #[test]
    fn test_empty_methods_rejected() {
        let err = EndpointsFactory::default()
            .endpoint()
            .methods([])
            .build(noop())
            .unwrap_err();
        assert_eq!(err, ConfigurationError::NoMethods);
    }

    #[test]
    fn test_non_object_schema_rejected() {
        let err = EndpointsFactory::default()
            .endpoint()
            .output(Schema::string())
            .build(noop())
            .unwrap_err();
        assert_eq!(err, ConfigurationError::NotAnObject { which: "output" });
    }

    #[test]
    fn test_final_input_schema_composition() {
        let endpoint = EndpointsFactory::default()
            .add_boxed_middleware(keyed("auth", "key", &[]))
            .endpoint()
            .input(Schema::object(ObjectSchema::new().field("id", Schema::string())))
            .build(noop())
            .unwrap();
        assert!(matches!(endpoint.input_schema().kind(), SchemaKind::Intersection(..)));
        let parsed = endpoint
            .input_schema()
            .parse(&json!({"key": "123", "id": "7", "extra": true}))
            .unwrap();
        assert_eq!(parsed, json!({"key": "123", "id": "7"}));
    }

    #[test]
    fn test_overlapping_fields_rejected() {
        let err = EndpointsFactory::default()
            .add_boxed_middleware(keyed("auth", "id", &[]))
            .endpoint()
            .input(Schema::object(ObjectSchema::new().field("id", Schema::string())))
            .build(noop())
            .unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::Schema(SchemaError::OverlappingField { field: "id".into() })
        );
    }

    #[test]
    fn test_duplicate_option_rejected() {
        let err = EndpointsFactory::default()
            .add_boxed_middleware(keyed("a", "x", &["user"]))
            .add_boxed_middleware(keyed("b", "y", &["user"]))
            .endpoint()
            .build(noop())
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::DuplicateOption(_)));
    }

    #[test]
    fn test_factory_is_immutable() {
        let base = EndpointsFactory::default();
        let extended = base.add_boxed_middleware(keyed("auth", "key", &[]));
        let plain = base.endpoint().build(noop()).unwrap();
        let guarded = extended.endpoint().build(noop()).unwrap();
        assert!(plain.middlewares().is_empty());
        assert_eq!(guarded.middlewares().len(), 1);
    }

    #[test]
    fn test_metadata() {
        let endpoint = EndpointsFactory::new(ArrayResultHandler)
            .endpoint()
            .methods([Method::Get, Method::Post])
            .describe("Retrieves the user.")
            .short_description("Get user")
            .tag("users")
            .tags(["admin"])
            .scope("read")
            .operation_id_fn(|method| format!("{}User", method.as_str()))
            .build(noop())
            .unwrap();
        assert_eq!(endpoint.description(), Some("Retrieves the user."));
        assert_eq!(endpoint.short_description(), Some("Get user"));
        assert_eq!(endpoint.tags(), &["users".to_string(), "admin".to_string()]);
        assert_eq!(endpoint.scopes(), &["read".to_string()]);
        assert_eq!(endpoint.operation_id(Method::Post).as_deref(), Some("postUser"));
        assert!(matches!(
            endpoint.positive_responses()[0].schema.kind(),
            SchemaKind::Array(_)
        ));
    }
}

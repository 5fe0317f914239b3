//! Endpoints and their request lifecycle.
//!
//! An [`Endpoint`] is built once by the
//! [`EndpointsFactory`](crate::EndpointsFactory) and then shared between
//! requests. Every call to [`Endpoint::execute`] owns a fresh [`Lifecycle`]
//! and walks it from [`Stage::Idle`] to [`Stage::Done`] (or
//! [`Stage::Failed`] when the result handler gives up).

use std::fmt;
use std::sync::Arc;

use http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
};
use http::{HeaderValue, StatusCode};
use serde_json::Value;
use tessera_config::TesseraConfig;
use tessera_core::{
    IncomingRequest, LogicalContainer, Method, OutgoingResponse, Schema, Security, TesseraError,
};
use tessera_middleware::MiddlewareChain;
use tessera_router::RouteTarget;
use tracing::{debug, debug_span, Instrument};

use crate::handler::ErasedHandler;
use crate::helpers::{last_resort_handler, run_result_handler};
use crate::lifecycle::{Lifecycle, Stage};
use crate::result_handler::{ApiResponse, ResultHandler, ResultParams};

/// Operation id override for the documentation.
#[derive(Clone)]
pub enum OperationId {
    /// The same id for every method.
    Fixed(String),
    /// An id computed from the method.
    PerMethod(Arc<dyn Fn(Method) -> String + Send + Sync>),
}

impl OperationId {
    /// Returns the id for a method.
    #[must_use]
    pub fn resolve(&self, method: Method) -> String {
        match self {
            Self::Fixed(id) => id.clone(),
            Self::PerMethod(f) => f(method),
        }
    }
}

impl fmt::Debug for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(id) => f.debug_tuple("Fixed").field(id).finish(),
            Self::PerMethod(_) => f.write_str("PerMethod(..)"),
        }
    }
}

/// The outcome of one execution.
#[derive(Debug)]
pub struct Execution {
    /// The response to send.
    pub response: OutgoingResponse,
    /// The final state of the lifecycle.
    pub lifecycle: Lifecycle,
}

/// An immutable, shareable endpoint.
pub struct Endpoint {
    pub(crate) methods: Vec<Method>,
    pub(crate) middlewares: MiddlewareChain,
    pub(crate) input_schema: Schema,
    pub(crate) output_schema: Schema,
    pub(crate) handler: ErasedHandler,
    pub(crate) result_handler: Arc<dyn ResultHandler>,
    pub(crate) description: Option<String>,
    pub(crate) short_description: Option<String>,
    pub(crate) tags: Vec<String>,
    pub(crate) operation_id: Option<OperationId>,
    pub(crate) scopes: Vec<String>,
    pub(crate) positive: Vec<ApiResponse>,
    pub(crate) negative: Vec<ApiResponse>,
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("methods", &self.methods)
            .field("middlewares", &self.middlewares)
            .field("tags", &self.tags)
            .field("operation_id", &self.operation_id)
            .finish_non_exhaustive()
    }
}

impl RouteTarget for Endpoint {
    fn methods(&self) -> &[Method] {
        &self.methods
    }
}

impl Endpoint {
    /// Returns the accepted methods.
    #[must_use]
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    /// Returns the final input schema (middlewares first, then the endpoint's own).
    #[must_use]
    pub const fn input_schema(&self) -> &Schema {
        &self.input_schema
    }

    /// Returns the output schema.
    #[must_use]
    pub const fn output_schema(&self) -> &Schema {
        &self.output_schema
    }

    /// Returns the middlewares.
    #[must_use]
    pub const fn middlewares(&self) -> &MiddlewareChain {
        &self.middlewares
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the short description.
    #[must_use]
    pub fn short_description(&self) -> Option<&str> {
        self.short_description.as_deref()
    }

    /// Returns the tags.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Returns the operation id override for a method.
    #[must_use]
    pub fn operation_id(&self, method: Method) -> Option<String> {
        self.operation_id.as_ref().map(|id| id.resolve(method))
    }

    /// Returns the oauth2/openid scopes.
    #[must_use]
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    /// Returns the combined security declarations of the middlewares.
    #[must_use]
    pub fn security(&self) -> Option<LogicalContainer<Security>> {
        self.middlewares.security()
    }

    /// Returns the documented successful responses.
    #[must_use]
    pub fn positive_responses(&self) -> &[ApiResponse] {
        &self.positive
    }

    /// Returns the documented error responses.
    #[must_use]
    pub fn negative_responses(&self) -> &[ApiResponse] {
        &self.negative
    }

    /// Returns the result handler.
    #[must_use]
    pub fn result_handler(&self) -> &Arc<dyn ResultHandler> {
        &self.result_handler
    }

    /// Runs one request through the endpoint.
    ///
    /// `siblings` are the methods served on the same path; they populate
    /// the CORS headers when enabled.
    pub async fn execute(
        &self,
        request: &IncomingRequest,
        config: &TesseraConfig,
        siblings: &[Method],
    ) -> Execution {
        let span = debug_span!("endpoint", method = %request.method(), path = request.path());
        async move {
            let mut lifecycle = Lifecycle::new();
            if request.method() == http::Method::OPTIONS {
                lifecycle.advance(Stage::Responding);
                let mut response = OutgoingResponse::empty(StatusCode::OK);
                if config.cors {
                    apply_cors(&mut response, siblings);
                }
                lifecycle.advance(Stage::Done);
                return Execution { response, lifecycle };
            }

            lifecycle.advance(Stage::ExtractingInput);
            lifecycle.raw_input = request.input(&config.input_sources);

            if let Err(error) = self.run_stages(&mut lifecycle, request).await {
                debug!(status = %error.status_code(), stage = lifecycle.stage().name(), "request failed");
                lifecycle.fail(error);
            }

            let params = ResultParams {
                error: lifecycle.error.as_ref(),
                input: lifecycle.input.as_ref(),
                output: lifecycle.output.as_ref(),
                options: &lifecycle.options,
                request,
                hardened: config.is_hardened(),
            };
            let outcome = run_result_handler(self.result_handler.as_ref(), params).await;
            let mut response = match outcome {
                Ok(response) => {
                    lifecycle.advance(Stage::Done);
                    response
                }
                Err(failure) => {
                    lifecycle.advance(Stage::Failed);
                    last_resort_handler(&failure)
                }
            };
            if config.cors {
                apply_cors(&mut response, siblings);
            }
            Execution { response, lifecycle }
        }
        .instrument(span)
        .await
    }

    async fn run_stages(
        &self,
        lifecycle: &mut Lifecycle,
        request: &IncomingRequest,
    ) -> Result<(), TesseraError> {
        lifecycle.advance(Stage::ValidatingInput);
        let input = self
            .input_schema
            .parse_object(&lifecycle.raw_input)
            .map_err(TesseraError::InputValidation)?;
        lifecycle.input = Some(input.clone());

        lifecycle.advance(Stage::RunningMiddlewares);
        self.middlewares
            .run_into(&input, request, &mut lifecycle.options)
            .await?;

        lifecycle.advance(Stage::RunningHandler);
        let output = (self.handler)(Value::Object(input), lifecycle.options.clone()).await?;

        lifecycle.advance(Stage::ValidatingOutput);
        let output = self
            .output_schema
            .parse(&output)
            .map_err(TesseraError::OutputValidation)?;
        lifecycle.output = Some(output);

        lifecycle.advance(Stage::Responding);
        Ok(())
    }
}

/// Sets the CORS headers for a path serving `methods`.
pub(crate) fn apply_cors(response: &mut OutgoingResponse, methods: &[Method]) {
    let allowed = methods
        .iter()
        .map(ToString::to_string)
        .chain(std::iter::once("OPTIONS".to_string()))
        .collect::<Vec<_>>()
        .join(", ");
    response.set_header(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    if let Ok(value) = HeaderValue::from_str(&allowed) {
        response.set_header(ACCESS_CONTROL_ALLOW_METHODS, value);
    }
    response.set_header(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("content-type"),
    );
}

//! Result handlers shape the outgoing response.
//!
//! After the handler ran (or failed) the endpoint passes exactly one of an
//! error or an output to its [`ResultHandler`], which alone decides the
//! status code and the payload. The same result handler describes its
//! responses for the documentation generator.

use http::StatusCode;
use serde_json::{json, Map, Value};
use tessera_core::schema::ObjectSchema;
use tessera_core::{HttpError, IncomingRequest, Options, OutgoingResponse, Schema, SchemaKind, TesseraError};
use tessera_middleware::BoxFuture;

use crate::helpers::log_server_error;

/// Default MIME type of documented responses.
pub const MIME_JSON: &str = "application/json";

/// MIME type of plain text responses.
pub const MIME_TEXT: &str = "text/plain";

/// Message used for examples of error responses.
pub const SAMPLE_ERROR_MESSAGE: &str = "Sample error message";

/// A documented response variant.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// Response body schema.
    pub schema: Schema,
    /// Status codes this variant is sent with.
    pub status_codes: Vec<StatusCode>,
    /// MIME types this variant is sent with.
    pub mime_types: Vec<String>,
}

impl ApiResponse {
    /// A JSON response sent with `200 OK`.
    #[must_use]
    pub fn positive(schema: Schema) -> Self {
        Self {
            schema,
            status_codes: vec![StatusCode::OK],
            mime_types: vec![MIME_JSON.to_string()],
        }
    }

    /// A JSON response sent with `400 Bad Request`.
    #[must_use]
    pub fn negative(schema: Schema) -> Self {
        Self {
            schema,
            status_codes: vec![StatusCode::BAD_REQUEST],
            mime_types: vec![MIME_JSON.to_string()],
        }
    }

    /// Replaces the status codes with one code.
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status_codes = vec![status];
        self
    }

    /// Replaces the status codes.
    #[must_use]
    pub fn with_status_codes(mut self, status_codes: impl IntoIterator<Item = StatusCode>) -> Self {
        self.status_codes = status_codes.into_iter().collect();
        self
    }

    /// Replaces the MIME types with one type.
    #[must_use]
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_types = vec![mime_type.into()];
        self
    }

    /// Replaces the MIME types.
    #[must_use]
    pub fn with_mime_types<I, S>(mut self, mime_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mime_types = mime_types.into_iter().map(Into::into).collect();
        self
    }
}

/// Everything a result handler may look at.
///
/// Exactly one of `error` and `output` is set.
#[derive(Debug, Clone, Copy)]
pub struct ResultParams<'a> {
    /// The failure, if any.
    pub error: Option<&'a TesseraError>,
    /// The validated input; `None` when validation failed or no endpoint matched.
    pub input: Option<&'a Map<String, Value>>,
    /// The validated output.
    pub output: Option<&'a Value>,
    /// Options contributed by middlewares.
    pub options: &'a Options,
    /// The incoming request.
    pub request: &'a IncomingRequest,
    /// Whether non-exposed error messages must be hidden.
    pub hardened: bool,
}

impl ResultParams<'_> {
    /// Returns the error message the client may see.
    #[must_use]
    pub fn public_message(&self) -> Option<String> {
        self.error.map(|error| error.public_message(self.hardened))
    }
}

/// Turns the outcome of an endpoint into a response.
pub trait ResultHandler: Send + Sync + 'static {
    /// Describes successful responses for an endpoint with the given output schema.
    fn positive_response(&self, output: &Schema) -> Vec<ApiResponse>;

    /// Describes error responses.
    fn negative_response(&self) -> Vec<ApiResponse>;

    /// Builds the response.
    ///
    /// A returned error (or a panic) is answered by the last-resort handler.
    fn handle<'a>(&'a self, params: ResultParams<'a>) -> BoxFuture<'a, Result<OutgoingResponse, HttpError>>;
}

/// Wraps data in `{"status": "success", "data": ...}` and errors in
/// `{"status": "error", "error": {"message": ...}}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultResultHandler;

impl ResultHandler for DefaultResultHandler {
    fn positive_response(&self, output: &Schema) -> Vec<ApiResponse> {
        let envelope = Schema::object(
            ObjectSchema::new()
                .field("status", Schema::literal("success"))
                .field("data", output.clone()),
        );
        let schema = output.examples().iter().fold(envelope, |schema, example| {
            schema.example(json!({"status": "success", "data": example}))
        });
        vec![ApiResponse::positive(schema)]
    }

    fn negative_response(&self) -> Vec<ApiResponse> {
        let schema = Schema::object(
            ObjectSchema::new()
                .field("status", Schema::literal("error"))
                .field(
                    "error",
                    Schema::object(ObjectSchema::new().field("message", Schema::string())),
                ),
        )
        .example(json!({"status": "error", "error": {"message": SAMPLE_ERROR_MESSAGE}}));
        vec![ApiResponse::negative(schema)]
    }

    fn handle<'a>(&'a self, params: ResultParams<'a>) -> BoxFuture<'a, Result<OutgoingResponse, HttpError>> {
        Box::pin(async move {
            let Some(error) = params.error else {
                let data = params.output.cloned().unwrap_or(Value::Null);
                return Ok(OutgoingResponse::json(
                    StatusCode::OK,
                    &json!({"status": "success", "data": data}),
                ));
            };
            let status = error.status_code();
            log_server_error(error, params.request, params.input);
            Ok(OutgoingResponse::json(
                status,
                &json!({"status": "error", "error": {"message": error.public_message(params.hardened)}}),
            ))
        })
    }
}

/// Responds with the `items` array of the output.
///
/// Intended for legacy APIs that must respond with a bare array. The
/// endpoint output must be an object with an `items` array.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArrayResultHandler;

impl ResultHandler for ArrayResultHandler {
    fn positive_response(&self, output: &Schema) -> Vec<ApiResponse> {
        let items = output
            .as_object()
            .and_then(|object| object.get("items"))
            .filter(|items| matches!(items.kind(), SchemaKind::Array(_)))
            .cloned()
            .unwrap_or_else(|| Schema::array(Schema::any()));
        let schema = output
            .examples()
            .iter()
            .filter_map(|example| example.get("items").filter(|items| items.is_array()))
            .fold(items, |schema, items| schema.example(items.clone()));
        vec![ApiResponse::positive(schema)]
    }

    fn negative_response(&self) -> Vec<ApiResponse> {
        vec![ApiResponse::negative(Schema::string().example(SAMPLE_ERROR_MESSAGE)).with_mime_type(MIME_TEXT)]
    }

    fn handle<'a>(&'a self, params: ResultParams<'a>) -> BoxFuture<'a, Result<OutgoingResponse, HttpError>> {
        Box::pin(async move {
            if let Some(error) = params.error {
                log_server_error(error, params.request, params.input);
                return Ok(OutgoingResponse::text(
                    error.status_code(),
                    error.public_message(params.hardened),
                ));
            }
            match params.output.and_then(|output| output.get("items")) {
                Some(items) if items.is_array() => Ok(OutgoingResponse::json(StatusCode::OK, items)),
                _ => Ok(OutgoingResponse::text(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Property 'items' is missing in the endpoint output",
                )),
            }
        })
    }
}

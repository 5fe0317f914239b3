//! Fallback responders shared by endpoints and the dispatcher.

use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;
use http::StatusCode;
use serde_json::{Map, Value};
use tessera_core::{
    panic_message, HttpError, IncomingRequest, OutgoingResponse, RequestParseError, TesseraError,
};
use thiserror::Error;
use tracing::error;

use crate::result_handler::{ResultHandler, ResultParams, MIME_TEXT};

/// A result handler failed, possibly while answering another error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ResultHandlerError {
    /// What the result handler failed with.
    pub message: String,
    /// The error it was asked to respond with, if any.
    pub original: Option<String>,
}

impl ResultHandlerError {
    /// Creates a result handler error.
    pub fn new(message: impl Into<String>, original: Option<&TesseraError>) -> Self {
        Self {
            message: message.into(),
            original: original.map(ToString::to_string),
        }
    }
}

/// Logs errors with a status of 500 or above as `Server side error`.
pub fn log_server_error(err: &TesseraError, request: &IncomingRequest, input: Option<&Map<String, Value>>) {
    if err.status_code().is_server_error() {
        let payload = input.map_or_else(String::new, |input| Value::Object(input.clone()).to_string());
        error!(
            url = %request.uri(),
            payload = %payload,
            error = %err,
            "Server side error"
        );
    }
}

/// Answers when the result handler itself failed.
///
/// Always a `500` plain text response.
pub fn last_resort_handler(err: &ResultHandlerError) -> OutgoingResponse {
    error!(
        original = err.original.as_deref().unwrap_or_default(),
        "Result handler failure: {}.",
        err.message
    );
    let mut text = format!("An error occurred while serving the result: {}.", err.message);
    if let Some(original) = &err.original {
        text.push_str(&format!("\nOriginal error: {original}."));
    }
    OutgoingResponse::text(StatusCode::INTERNAL_SERVER_ERROR, text)
}

/// Runs a result handler, turning returned errors and panics into [`ResultHandlerError`].
pub async fn run_result_handler(
    handler: &dyn ResultHandler,
    params: ResultParams<'_>,
) -> Result<OutgoingResponse, ResultHandlerError> {
    let original = params.error;
    match AssertUnwindSafe(handler.handle(params)).catch_unwind().await {
        Ok(Ok(response)) => Ok(response),
        Ok(Err(err)) => Err(ResultHandlerError::new(err.message(), original)),
        Err(payload) => Err(ResultHandlerError::new(panic_message(payload.as_ref()), original)),
    }
}

/// Responds to requests no route matched: `404 Can not {METHOD} {path}`.
pub async fn not_found_handler(
    handler: &dyn ResultHandler,
    request: &IncomingRequest,
    hardened: bool,
) -> OutgoingResponse {
    let err = TesseraError::from(HttpError::not_found(format!(
        "Can not {} {}",
        request.method(),
        request.path()
    )));
    respond_with_error(handler, request, &err, hardened).await
}

/// Responds to requests whose body could not be decoded with `400`.
pub async fn parser_failure_handler(
    handler: &dyn ResultHandler,
    request: &IncomingRequest,
    failure: &RequestParseError,
    hardened: bool,
) -> OutgoingResponse {
    let err = TesseraError::from(HttpError::bad_request(failure.to_string()));
    respond_with_error(handler, request, &err, hardened).await
}

pub(crate) async fn respond_with_error(
    handler: &dyn ResultHandler,
    request: &IncomingRequest,
    err: &TesseraError,
    hardened: bool,
) -> OutgoingResponse {
    let options = tessera_core::Options::new();
    let params = ResultParams {
        error: Some(err),
        input: None,
        output: None,
        options: &options,
        request,
        hardened,
    };
    match run_result_handler(handler, params).await {
        Ok(response) => response,
        Err(failure) => last_resort_handler(&failure),
    }
}

/// Returns `true` if the response is the plain text fallback.
#[must_use]
pub fn is_plain_text(response: &OutgoingResponse) -> bool {
    response
        .header(http::header::CONTENT_TYPE.as_str())
        .is_some_and(|value| value.starts_with(MIME_TEXT))
}

//! Test error types.

use tessera_core::RequestParseError;
use thiserror::Error;

/// Errors that can occur while preparing or reading a test exchange.
#[derive(Debug, Error)]
pub enum TestError {
    /// Request building failed.
    #[error("Request build error: {0}")]
    RequestBuild(String),

    /// A header name or value is invalid.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// The request body could not be decoded.
    #[error("Request parse error: {0}")]
    Parse(#[from] RequestParseError),

    /// The response body is not valid UTF-8.
    #[error("Body read error: {0}")]
    BodyRead(String),

    /// JSON serialization or deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

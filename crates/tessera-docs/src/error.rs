//! Error types for the documentation generator.
//!
//! Every error here is fatal to document generation only; the endpoints
//! themselves keep serving.

use tessera_core::Method;
use tessera_router::RoutingError;
use thiserror::Error;

/// Errors that can occur while generating a document.
#[derive(Debug, Error)]
pub enum DocumentationError {
    /// The routing tree is invalid.
    #[error(transparent)]
    Routing(#[from] RoutingError),

    /// Two endpoints declare the same explicit operation id.
    #[error("Duplicated operationId: \"{operation_id}\" ({method} {path})")]
    DuplicateOperationId {
        /// The duplicated id.
        operation_id: String,
        /// Method of the second declaration.
        method: Method,
        /// Path of the second declaration.
        path: String,
    },

    /// Failed to serialize the document to JSON.
    #[error("Failed to serialize OpenAPI document: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to serialize the document to YAML.
    #[error("Failed to serialize OpenAPI document: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type for documentation operations.
pub type DocumentationResult<T> = Result<T, DocumentationError>;

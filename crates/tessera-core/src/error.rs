//! Error types for Tessera.
//!
//! This module provides the [`TesseraError`] taxonomy that flows from the
//! request lifecycle into result handlers, plus the [`HttpError`] type that
//! middlewares and handlers use to reject a request with a specific status.
//!
//! # Status mapping
//!
//! | Variant | Status |
//! |---|---|
//! | `InputValidation` | 400 |
//! | `OutputValidation` | 500 |
//! | `Middleware` | status of the wrapped [`HttpError`] |
//! | `Http` | status of the wrapped [`HttpError`] |
//! | `Internal` | 500 |

use http::StatusCode;
use serde::Serialize;
use std::any::Any;
use std::fmt;
use thiserror::Error;

/// Result type alias using [`TesseraError`].
pub type TesseraResult<T> = Result<T, TesseraError>;

/// A single failed check produced by schema validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// Field path from the validated root, e.g. `["user", "id"]`.
    pub path: Vec<String>,
    /// What the schema expected at this path.
    pub expected: String,
    /// What was actually received.
    pub received: String,
    /// Human-readable description.
    pub message: String,
}

impl ValidationIssue {
    /// Creates a new issue.
    pub fn new(
        path: Vec<String>,
        expected: impl Into<String>,
        received: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            path,
            expected: expected.into(),
            received: received.into(),
            message: message.into(),
        }
    }

    /// Returns the dotted path, e.g. `user.id`.
    #[must_use]
    pub fn path_string(&self) -> String {
        self.path.join(".")
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path_string(), self.message)
        }
    }
}

/// A non-empty list of [`ValidationIssue`]s.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationIssues(Vec<ValidationIssue>);

impl ValidationIssues {
    /// Wraps a list of issues.
    #[must_use]
    pub fn new(issues: Vec<ValidationIssue>) -> Self {
        Self(issues)
    }

    /// Returns the individual issues.
    #[must_use]
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.0
    }

    /// Returns the number of issues.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no issues.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ValidationIssues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, issue) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationIssues {}

/// An error carrying an HTTP status code.
///
/// Middlewares and handlers return it to reject a request with a specific
/// status. The `expose` flag controls whether the message may reach the client
/// in hardened deployments; it defaults to `true` for statuses below 500.
///
/// # Example
///
/// ```
/// use tessera_core::HttpError;
/// use http::StatusCode;
///
/// let err = HttpError::forbidden("Access denied");
/// assert_eq!(err.status(), StatusCode::FORBIDDEN);
/// assert!(err.expose());
///
/// let err = HttpError::internal("database is down");
/// assert!(!err.expose());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HttpError {
    status: StatusCode,
    message: String,
    expose: bool,
}

impl HttpError {
    /// Creates an error with the given status and message.
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            expose: status.as_u16() < 500,
        }
    }

    /// 400 Bad Request.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// 401 Unauthorized.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    /// 403 Forbidden.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    /// 404 Not Found.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// 500 Internal Server Error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Overrides whether the message may be shown to clients.
    #[must_use]
    pub fn with_expose(mut self, expose: bool) -> Self {
        self.expose = expose;
        self
    }

    /// Returns the status code.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns whether the message may be shown to clients.
    #[must_use]
    pub const fn expose(&self) -> bool {
        self.expose
    }
}

/// Errors produced while serving a request.
///
/// Every variant is recovered at the endpoint boundary and handed to the
/// result handler as data.
#[derive(Debug, Error)]
pub enum TesseraError {
    /// The merged request input failed the endpoint's input schema.
    #[error("{0}")]
    InputValidation(ValidationIssues),

    /// The handler returned a value that failed the output schema.
    #[error("output: {0}")]
    OutputValidation(ValidationIssues),

    /// A middleware rejected the request.
    #[error("{source}")]
    Middleware {
        /// Name of the failing middleware.
        middleware: String,
        /// The rejection.
        #[source]
        source: HttpError,
    },

    /// An error carrying its own HTTP status.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// Any other failure.
    #[error("{message}")]
    Internal {
        /// Human-readable error message.
        message: String,
    },
}

impl TesseraError {
    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Wraps a middleware rejection.
    pub fn middleware(name: impl Into<String>, source: HttpError) -> Self {
        Self::Middleware {
            middleware: name.into(),
            source,
        }
    }

    /// Normalizes an arbitrary handler error.
    ///
    /// [`TesseraError`] and [`HttpError`] values are unwrapped as-is; anything
    /// else becomes [`TesseraError::Internal`] carrying its display form.
    #[must_use]
    pub fn from_anyhow(error: anyhow::Error) -> Self {
        match error.downcast::<Self>() {
            Ok(err) => err,
            Err(error) => match error.downcast::<HttpError>() {
                Ok(err) => Self::Http(err),
                Err(error) => Self::internal(error.to_string()),
            },
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InputValidation(_) => StatusCode::BAD_REQUEST,
            Self::OutputValidation(_) | Self::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Middleware { source, .. } | Self::Http(source) => source.status(),
        }
    }

    /// Returns whether the message may be shown to clients.
    #[must_use]
    pub const fn exposes_message(&self) -> bool {
        match self {
            Self::InputValidation(_) => true,
            Self::OutputValidation(_) | Self::Internal { .. } => false,
            Self::Middleware { source, .. } | Self::Http(source) => source.expose(),
        }
    }

    /// Returns the message that may be sent to the client.
    ///
    /// In hardened mode a message that is not exposed is replaced with the
    /// canonical reason phrase of its status code.
    ///
    /// ```
    /// use tessera_core::{HttpError, TesseraError};
    ///
    /// let err = TesseraError::internal("connection refused");
    /// assert_eq!(err.public_message(false), "connection refused");
    /// assert_eq!(err.public_message(true), "Internal Server Error");
    /// ```
    #[must_use]
    pub fn public_message(&self, hardened: bool) -> String {
        if hardened && !self.exposes_message() {
            return self
                .status_code()
                .canonical_reason()
                .unwrap_or("Internal Server Error")
                .to_string();
        }
        self.to_string()
    }

    /// Returns the validation issues carried by this error, if any.
    #[must_use]
    pub fn issues(&self) -> Option<&ValidationIssues> {
        match self {
            Self::InputValidation(issues) | Self::OutputValidation(issues) => Some(issues),
            _ => None,
        }
    }

    /// Converts any error into an [`HttpError`] with the matching status.
    #[must_use]
    pub fn to_http_error(&self) -> HttpError {
        match self {
            Self::Middleware { source, .. } | Self::Http(source) => source.clone(),
            other => HttpError::new(other.status_code(), other.to_string())
                .with_expose(other.exposes_message()),
        }
    }
}

/// Extracts the message of a caught panic payload.
#[must_use]
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unexpected panic".to_string()
    }
}

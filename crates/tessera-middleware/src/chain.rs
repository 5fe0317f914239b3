//! Ordered middleware chains.

use crate::middleware::Middleware;
use futures_util::FutureExt;
use serde_json::{Map, Value};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tessera_core::{
    panic_message, HttpError, IncomingRequest, LogicalContainer, Options, Schema, Security,
    TesseraError,
};
use thiserror::Error;
use tracing::{debug, trace};

/// A type-erased middleware that can be shared between chains.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// Raised when building a chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    /// Two middlewares declare the same option key.
    #[error("option '{key}' provided by '{middleware}' is already provided by an earlier middleware")]
    DuplicateOption {
        /// The duplicated key.
        key: String,
        /// The later middleware.
        middleware: String,
    },
}

/// Middlewares of one endpoint in declaration order.
///
/// Built once per endpoint; running it never mutates the chain.
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    middlewares: Vec<BoxedMiddleware>,
}

impl std::fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.middlewares.iter().map(|middleware| middleware.name()))
            .finish()
    }
}

impl MiddlewareChain {
    /// Builds a chain, rejecting option keys declared twice.
    pub fn new(middlewares: Vec<BoxedMiddleware>) -> Result<Self, ChainError> {
        let mut chain = Self::default();
        for middleware in middlewares {
            chain.push(middleware)?;
        }
        Ok(chain)
    }

    /// Appends a middleware.
    pub fn push(&mut self, middleware: BoxedMiddleware) -> Result<(), ChainError> {
        for key in middleware.provides() {
            let taken = self
                .middlewares
                .iter()
                .any(|existing| existing.provides().contains(key));
            if taken {
                return Err(ChainError::DuplicateOption {
                    key: key.clone(),
                    middleware: middleware.name().to_string(),
                });
            }
        }
        self.middlewares.push(middleware);
        Ok(())
    }

    /// Returns the number of middlewares.
    #[must_use]
    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    /// Returns `true` if the chain is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    /// Iterates the middlewares in order.
    pub fn iter(&self) -> impl Iterator<Item = &BoxedMiddleware> {
        self.middlewares.iter()
    }

    /// Returns the input schemas in order.
    #[must_use]
    pub fn input_schemas(&self) -> Vec<Schema> {
        self.middlewares
            .iter()
            .map(|middleware| middleware.input_schema().clone())
            .collect()
    }

    /// Combines the security declarations of every middleware with `And`.
    #[must_use]
    pub fn security(&self) -> Option<LogicalContainer<Security>> {
        let mut declared: Vec<LogicalContainer<Security>> = self
            .middlewares
            .iter()
            .filter_map(|middleware| middleware.security().cloned())
            .collect();
        match declared.len() {
            0 => None,
            1 => declared.pop(),
            _ => Some(LogicalContainer::And(declared)),
        }
    }

    /// Runs every middleware in order and returns the accumulated options.
    ///
    /// The first rejection stops the chain and is returned as
    /// [`TesseraError::Middleware`]. Returning an undeclared or already
    /// present key is an internal error.
    pub async fn run(
        &self,
        input: &Map<String, Value>,
        request: &IncomingRequest,
    ) -> Result<Options, TesseraError> {
        let mut options = Options::new();
        self.run_into(input, request, &mut options).await?;
        Ok(options)
    }

    /// Like [`run`](Self::run), but accumulates into `options` so that the
    /// options provided before a failure stay available to the caller.
    ///
    /// A panicking middleware is reported as a 500 rejection by that middleware.
    pub async fn run_into(
        &self,
        input: &Map<String, Value>,
        request: &IncomingRequest,
        options: &mut Options,
    ) -> Result<(), TesseraError> {
        for middleware in &self.middlewares {
            let name = middleware.name();
            trace!(middleware = name, "running middleware");
            let current: &Options = options;
            let provided = AssertUnwindSafe(async { middleware.handle(input, current, request).await })
                .catch_unwind()
                .await
                .unwrap_or_else(|payload| Err(HttpError::internal(panic_message(payload.as_ref()))))
                .map_err(|err| {
                    debug!(middleware = name, status = %err.status(), "middleware rejected request");
                    TesseraError::middleware(name, err)
                })?;
            if let Some(key) = provided
                .keys()
                .find(|key| !middleware.provides().contains(key))
            {
                return Err(TesseraError::internal(format!(
                    "middleware '{name}' returned undeclared option '{key}'"
                )));
            }
            options
                .extend_from(provided)
                .map_err(|err| TesseraError::internal(err.to_string()))?;
        }
        Ok(())
    }
}

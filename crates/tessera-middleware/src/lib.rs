//! # Tessera Middleware
//!
//! Middlewares for the Tessera engine.
//!
//! A middleware contributes an input schema to its endpoint and runs before
//! the handler. Middlewares of one endpoint form a [`MiddlewareChain`] that
//! runs strictly in declaration order:
//!
//! ```text
//! validated input ──► mw 1 ──► mw 2 ──► … ──► handler(input, options)
//!                      │        │
//!                      ▼        ▼
//!                   options  options      (append-only, ordered)
//! ```
//!
//! Option keys declared by two middlewares of the same chain are rejected
//! when the chain is built.

#![doc(html_root_url = "https://docs.rs/tessera-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod chain;
mod middleware;

pub use chain::{BoxedMiddleware, ChainError, MiddlewareChain};
pub use middleware::{BoxFuture, FnMiddleware, Middleware};

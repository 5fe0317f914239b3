//! Typed endpoint handlers.
//!
//! A handler receives the validated input, deserialized into its own request
//! type, together with the [`Options`] contributed by middlewares. Its output
//! is serialized back to JSON and validated against the endpoint's output
//! schema.
//!
//! Handlers return [`anyhow::Result`], so `?` works on any error type. Errors
//! are normalized when they leave the handler:
//!
//! | Returned | Becomes |
//! |---|---|
//! | [`HttpError`](tessera_core::HttpError) | [`TesseraError::Http`] with its status |
//! | [`TesseraError`] | itself |
//! | anything else | [`TesseraError::Internal`] with its message |
//! | a panic | [`TesseraError::Internal`] with the panic message |
//!
//! # Example
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use tessera_core::Options;
//! use tessera_server::Handler;
//!
//! #[derive(Deserialize)]
//! struct GetUser {
//!     id: u64,
//! }
//!
//! #[derive(Serialize)]
//! struct User {
//!     id: u64,
//!     name: String,
//! }
//!
//! struct GetUserHandler;
//!
//! impl Handler<GetUser, User> for GetUserHandler {
//!     async fn handle(&self, input: GetUser, _options: Options) -> anyhow::Result<User> {
//!         Ok(User { id: input.id, name: "Jane".into() })
//!     }
//! }
//! ```

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tessera_core::{panic_message, Options, TesseraError};
use tessera_middleware::BoxFuture;

/// A trait for handling typed input.
///
/// # Type Parameters
///
/// - `I`: The input type, deserialized from the validated input object
/// - `O`: The output type, serialized and checked against the output schema
pub trait Handler<I, O>: Send + Sync + 'static
where
    I: DeserializeOwned + Send + 'static,
    O: Serialize + Send + 'static,
{
    /// Handles one request.
    ///
    /// # Arguments
    ///
    /// * `input` - The validated input
    /// * `options` - Values contributed by the endpoint's middlewares
    fn handle(&self, input: I, options: Options) -> impl Future<Output = anyhow::Result<O>> + Send;
}

/// A type-erased handler working on JSON values.
pub type ErasedHandler =
    Arc<dyn Fn(Value, Options) -> BoxFuture<'static, Result<Value, TesseraError>> + Send + Sync>;

/// A function-based handler wrapper.
///
/// # Example
///
/// ```rust
/// use serde_json::{json, Value};
/// use tessera_core::Options;
/// use tessera_server::FnHandler;
///
/// let handler = FnHandler::new(|input: Value, _options: Options| async move {
///     Ok(json!({ "echo": input }))
/// });
/// ```
pub struct FnHandler<F, I, O, Fut>
where
    F: Fn(I, Options) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<O>> + Send,
    I: DeserializeOwned + Send + 'static,
    O: Serialize + Send + 'static,
{
    func: F,
    _phantom: std::marker::PhantomData<fn(I) -> (O, Fut)>,
}

impl<F, I, O, Fut> FnHandler<F, I, O, Fut>
where
    F: Fn(I, Options) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<O>> + Send,
    I: DeserializeOwned + Send + 'static,
    O: Serialize + Send + 'static,
{
    /// Creates a new function-based handler.
    #[must_use]
    pub const fn new(func: F) -> Self {
        Self {
            func,
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<F, I, O, Fut> Handler<I, O> for FnHandler<F, I, O, Fut>
where
    F: Fn(I, Options) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<O>> + Send + 'static,
    I: DeserializeOwned + Send + 'static,
    O: Serialize + Send + 'static,
{
    async fn handle(&self, input: I, options: Options) -> anyhow::Result<O> {
        (self.func)(input, options).await
    }
}

/// Input type for handlers that ignore their input.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Empty {}

/// Erases the types of a handler.
///
/// The returned closure deserializes the input, catches panics, normalizes
/// errors and serializes the output.
pub fn erase<H, I, O>(handler: H) -> ErasedHandler
where
    H: Handler<I, O>,
    I: DeserializeOwned + Send + 'static,
    O: Serialize + Send + 'static,
{
    let handler = Arc::new(handler);
    Arc::new(move |input: Value, options: Options| -> BoxFuture<'static, Result<Value, TesseraError>> {
        let handler = Arc::clone(&handler);
        Box::pin(async move {
            let input: I = serde_json::from_value(input).map_err(|e| {
                TesseraError::internal(format!("validated input does not fit the handler input type: {e}"))
            })?;

            let output = AssertUnwindSafe(async move { handler.handle(input, options).await })
                .catch_unwind()
                .await
                .map_err(|payload| TesseraError::internal(panic_message(payload.as_ref())))?
                .map_err(TesseraError::from_anyhow)?;

            serde_json::to_value(output).map_err(|e| {
                TesseraError::internal(format!("handler output could not be serialized: {e}"))
            })
        })
    })
}

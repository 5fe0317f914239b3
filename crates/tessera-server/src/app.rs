//! In-memory dispatcher.
//!
//! [`App`] implements [`RouteRegistrar`] over a [`PathTree`] and answers
//! buffered [`http::Request`]s without any socket. A transport binding only
//! needs to collect the body and call [`App::handle`].
//!
//! # Example
//!
//! ```rust
//! use bytes::Bytes;
//! use serde_json::json;
//! use tessera_config::TesseraConfig;
//! use tessera_core::{Method, Options};
//! use tessera_router::Routing;
//! use tessera_server::{App, EndpointsFactory, FnHandler, Empty};
//!
//! # tokio_test::block_on(async {
//! let routing = Routing::new().endpoint(
//!     "ping",
//!     EndpointsFactory::default()
//!         .endpoint()
//!         .build(FnHandler::new(|_input: Empty, _options: Options| async move {
//!             Ok(json!({}))
//!         }))
//!         .unwrap(),
//! );
//! let app = App::from_routing(TesseraConfig::default(), &routing).unwrap();
//!
//! let request = http::Request::get("/ping").body(Bytes::new()).unwrap();
//! let response = app.dispatch(request).await;
//! assert_eq!(response.status(), http::StatusCode::OK);
//! # });
//! ```

use std::sync::Arc;

use bytes::Bytes;
use http_body_util::Full;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use tessera_config::TesseraConfig;
use tessera_core::{HttpError, IncomingRequest, OutgoingResponse, TesseraError};
use tessera_router::{PathTree, RoutingError, Routing, ServeStatic};
use tracing::debug;

use crate::endpoint::Endpoint;
use crate::helpers::{not_found_handler, parser_failure_handler, respond_with_error};
use crate::result_handler::{DefaultResultHandler, ResultHandler};
use crate::routing::{init_routing, RouteHandler, RouteRegistrar};
use crate::static_files::{self, StaticFileError};

const STATIC_REST: &str = "rest";

/// Routes requests to registered handlers and static mounts.
pub struct App {
    config: Arc<TesseraConfig>,
    routes: PathTree<IndexMap<http::Method, RouteHandler>>,
    statics: PathTree<ServeStatic>,
    result_handler: Arc<dyn ResultHandler>,
    registered: Vec<(http::Method, String)>,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("registered", &self.registered)
            .field("statics", &self.statics.len())
            .finish_non_exhaustive()
    }
}

impl App {
    /// Creates an empty application.
    #[must_use]
    pub fn new(config: TesseraConfig) -> Self {
        Self {
            config: Arc::new(config),
            routes: PathTree::new(),
            statics: PathTree::new(),
            result_handler: Arc::new(DefaultResultHandler),
            registered: Vec::new(),
        }
    }

    /// Sets the result handler used for not-found and parser failures.
    #[must_use]
    pub fn with_error_handler(mut self, handler: impl ResultHandler) -> Self {
        self.result_handler = Arc::new(handler);
        self
    }

    /// Creates an application serving a routing tree.
    ///
    /// # Errors
    ///
    /// Returns the first [`RoutingError`] of the tree.
    pub fn from_routing(config: TesseraConfig, routing: &Routing<Endpoint>) -> Result<Self, RoutingError> {
        let mut app = Self::new(config);
        app.mount(routing)?;
        Ok(app)
    }

    /// Registers a routing tree.
    ///
    /// # Errors
    ///
    /// Returns the first [`RoutingError`] of the tree; nothing is registered then.
    pub fn mount(&mut self, routing: &Routing<Endpoint>) -> Result<(), RoutingError> {
        let config = Arc::clone(&self.config);
        init_routing(self, routing, config)
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &TesseraConfig {
        &self.config
    }

    /// Returns the registered `(method, path)` pairs in registration order.
    #[must_use]
    pub fn registered(&self) -> &[(http::Method, String)] {
        &self.registered
    }

    /// Decodes and dispatches a request.
    pub async fn dispatch(&self, request: http::Request<Bytes>) -> OutgoingResponse {
        let method = request.method().clone();
        let uri = request.uri().to_string();
        match IncomingRequest::from_http(request) {
            Ok(request) => self.dispatch_incoming(request).await,
            Err(failure) => {
                debug!(error = %failure, "request body could not be parsed");
                let request = IncomingRequest::new(method, &uri);
                parser_failure_handler(self.result_handler.as_ref(), &request, &failure, self.config.is_hardened())
                    .await
            }
        }
    }

    /// Dispatches an already decoded request.
    pub async fn dispatch_incoming(&self, mut request: IncomingRequest) -> OutgoingResponse {
        let path = request.path().to_string();
        let hardened = self.config.is_hardened();

        if let Some((handlers, params)) = self.routes.find(&path) {
            if let Some(handler) = handlers.get(request.method()) {
                let params: Map<String, Value> = params
                    .iter()
                    .map(|(name, value)| (name.to_string(), Value::String(value.to_string())))
                    .collect();
                request.set_params(params);
                return handler(request).await;
            }
        }

        if let Some((mount, params)) = self.statics.find(&path) {
            let rest = params.get(STATIC_REST).unwrap_or_default();
            match static_files::serve(mount, rest, request.method()) {
                Ok(response) => return response,
                Err(StaticFileError::NotFound(_) | StaticFileError::MethodNotAllowed) => {}
                Err(err) => {
                    let err = TesseraError::from(HttpError::new(err.status_code(), err.to_string()));
                    return respond_with_error(self.result_handler.as_ref(), &request, &err, hardened).await;
                }
            }
        }

        not_found_handler(self.result_handler.as_ref(), &request, hardened).await
    }

    /// Dispatches a request and converts the response.
    pub async fn handle(&self, request: http::Request<Bytes>) -> http::Response<Full<Bytes>> {
        self.dispatch(request).await.into_http()
    }
}

impl RouteRegistrar for App {
    fn register_route(&mut self, method: http::Method, path: &str, handler: RouteHandler) {
        self.registered.push((method.clone(), path.to_string()));
        if let Some(handlers) = self.routes.get_mut(path) {
            handlers.insert(method, handler);
            return;
        }
        let mut handlers = IndexMap::new();
        handlers.insert(method, handler);
        self.routes.insert(path, handlers);
    }

    fn register_static(&mut self, path: &str, serve: ServeStatic) {
        let pattern = format!("{}/*{STATIC_REST}", path.trim_end_matches('/'));
        self.statics.insert(&pattern, serve);
    }
}

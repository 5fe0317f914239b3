//! Registering a routing tree with a transport.

use std::sync::Arc;

use indexmap::IndexMap;
use tessera_config::TesseraConfig;
use tessera_core::{IncomingRequest, Method, OutgoingResponse};
use tessera_middleware::BoxFuture;
use tessera_router::{EndpointEntry, RoutingError, Routing, ServeStatic, Visit};
use tracing::{info, warn};

use crate::endpoint::Endpoint;

/// A registered request handler.
pub type RouteHandler =
    Arc<dyn Fn(IncomingRequest) -> BoxFuture<'static, OutgoingResponse> + Send + Sync>;

/// Something that accepts route registrations, such as an HTTP server binding.
pub trait RouteRegistrar {
    /// Registers a handler for a method and a path pattern (`/v1/user/:id`).
    fn register_route(&mut self, method: http::Method, path: &str, handler: RouteHandler);

    /// Registers a static file mount.
    fn register_static(&mut self, path: &str, serve: ServeStatic);
}

/// Walks `routing` and registers every endpoint and static mount.
///
/// The whole tree is validated before anything is registered, so a
/// [`RoutingError`] leaves the registrar untouched. With CORS enabled one
/// `OPTIONS` route is added per endpoint path.
///
/// # Errors
///
/// Returns the first [`RoutingError`] found in the tree.
pub fn init_routing<R>(
    registrar: &mut R,
    routing: &Routing<Endpoint>,
    config: Arc<TesseraConfig>,
) -> Result<(), RoutingError>
where
    R: RouteRegistrar + ?Sized,
{
    let visits = routing.collect_visits()?;
    let mut preflight: IndexMap<String, (Arc<Endpoint>, Vec<Method>)> = IndexMap::new();

    for visit in visits {
        match visit {
            Visit::Endpoint(entry) => {
                warn_json_incompatible(&entry);
                if config.cors {
                    preflight
                        .entry(entry.path.clone())
                        .or_insert_with(|| (Arc::clone(&entry.endpoint), entry.siblings.clone()));
                }
                let handler = endpoint_route(
                    Arc::clone(&entry.endpoint),
                    Arc::clone(&config),
                    entry.siblings,
                );
                registrar.register_route(entry.method.to_http(), &entry.path, handler);
            }
            Visit::Static { path, serve } => registrar.register_static(&path, serve),
        }
    }

    for (path, (endpoint, siblings)) in preflight {
        let handler = endpoint_route(endpoint, Arc::clone(&config), siblings);
        registrar.register_route(http::Method::OPTIONS, &path, handler);
    }
    Ok(())
}

fn endpoint_route(endpoint: Arc<Endpoint>, config: Arc<TesseraConfig>, siblings: Vec<Method>) -> RouteHandler {
    let siblings: Arc<[Method]> = siblings.into();
    Arc::new(move |request: IncomingRequest| -> BoxFuture<'static, OutgoingResponse> {
        let endpoint = Arc::clone(&endpoint);
        let config = Arc::clone(&config);
        let siblings = Arc::clone(&siblings);
        Box::pin(async move {
            info!("{}: {}", request.method(), request.path());
            endpoint.execute(&request, &config, &siblings).await.response
        })
    })
}

fn warn_json_incompatible(entry: &EndpointEntry<Endpoint>) {
    let endpoint = &entry.endpoint;
    if let Some(reason) = endpoint.input_schema().json_incompatibility() {
        warn!(
            method = %entry.method,
            path = %entry.path,
            reason,
            "The final input schema of the endpoint contains an unsupported JSON payload type."
        );
    }
    for response in endpoint.positive_responses() {
        if let Some(reason) = response.schema.json_incompatibility() {
            warn!(
                method = %entry.method,
                path = %entry.path,
                reason,
                "The final positive response schema of the endpoint contains an unsupported JSON payload type."
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::EndpointsFactory;
    use crate::handler::{Empty, FnHandler};
    use serde_json::{json, Value};
    use tessera_core::Options;
    use tessera_router::DependsOnMethod;

    #[derive(Default)]
    struct Recorder {
        routes: Vec<(http::Method, String)>,
        statics: Vec<String>,
    }

    impl RouteRegistrar for Recorder {
        fn register_route(&mut self, method: http::Method, path: &str, _handler: RouteHandler) {
            self.routes.push((method, path.to_string()));
        }

        fn register_static(&mut self, path: &str, _serve: ServeStatic) {
            self.statics.push(path.to_string());
        }
    }

    fn endpoint(methods: &[Method]) -> Endpoint {
        EndpointsFactory::default()
            .endpoint()
            .methods(methods.iter().copied())
            .build(FnHandler::new(|_input: Empty, _options: Options| async move {
                Ok(json!({}))
            }))
            .unwrap()
    }

    #[test]
    fn test_registers_routes_and_statics() {
        let routing = Routing::new().nest(
            "v1",
            Routing::new()
                .nest("user", Routing::new().endpoint(":id", endpoint(&[Method::Get])))
                .serve_static("public", ServeStatic::new("assets")),
        );
        let mut recorder = Recorder::default();
        init_routing(&mut recorder, &routing, Arc::new(TesseraConfig::default())).unwrap();
        assert_eq!(recorder.routes, vec![(http::Method::GET, "/v1/user/:id".to_string())]);
        assert_eq!(recorder.statics, vec!["/v1/public".to_string()]);
    }

    #[test]
    fn test_cors_adds_one_options_route_per_path() {
        let routing = Routing::new().depends_on_method(
            "user",
            DependsOnMethod::new()
                .with(Method::Get, endpoint(&[Method::Get]))
                .with(Method::Post, endpoint(&[Method::Post])),
        );
        let mut recorder = Recorder::default();
        let config = TesseraConfig::builder().cors(true).build();
        init_routing(&mut recorder, &routing, Arc::new(config)).unwrap();
        assert_eq!(
            recorder.routes,
            vec![
                (http::Method::GET, "/user".to_string()),
                (http::Method::POST, "/user".to_string()),
                (http::Method::OPTIONS, "/user".to_string()),
            ]
        );
    }

    #[test]
    fn test_invalid_tree_registers_nothing() {
        let routing = Routing::new()
            .endpoint("ok", endpoint(&[Method::Get]))
            .depends_on_method(
                "user",
                DependsOnMethod::new().with(Method::Post, endpoint(&[Method::Put, Method::Patch])),
            );
        let mut recorder = Recorder::default();
        let err = init_routing(&mut recorder, &routing, Arc::new(TesseraConfig::default())).unwrap_err();
        assert!(matches!(err, RoutingError::UnsupportedMethod { .. }));
        assert!(recorder.routes.is_empty());
    }

    #[tokio::test]
    async fn test_route_handler_executes_endpoint() {
        let routing = Routing::new().endpoint(
            "echo",
            EndpointsFactory::default()
                .endpoint()
                .build(FnHandler::new(|input: Value, _options: Options| async move { Ok(input) }))
                .unwrap(),
        );

        struct Capture(Option<RouteHandler>);
        impl RouteRegistrar for Capture {
            fn register_route(&mut self, _method: http::Method, _path: &str, handler: RouteHandler) {
                self.0 = Some(handler);
            }
            fn register_static(&mut self, _path: &str, _serve: ServeStatic) {}
        }

        let mut capture = Capture(None);
        init_routing(&mut capture, &routing, Arc::new(TesseraConfig::default())).unwrap();
        let handler = capture.0.unwrap();
        let response = handler(IncomingRequest::new(http::Method::GET, "/echo")).await;
        assert_eq!(response.status(), http::StatusCode::OK);
        assert_eq!(response.json_body(), Some(json!({"status": "success", "data": {}})));
    }
}

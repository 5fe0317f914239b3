//! Chains built from hand-written and function middlewares.

use serde_json::{json, Map, Value};
use tessera_core::schema::ObjectSchema;
use tessera_core::{
    HttpError, IncomingRequest, LogicalContainer, Options, Schema, Security, TesseraError,
};
use tessera_middleware::{BoxFuture, BoxedMiddleware, ChainError, FnMiddleware, Middleware, MiddlewareChain};
use std::sync::Arc;

/// Authenticates with a bearer token header and provides `user`.
struct BearerAuth {
    schema: Schema,
    provides: Vec<String>,
    security: Option<LogicalContainer<Security>>,
}

impl BearerAuth {
    fn new() -> Self {
        Self {
            schema: Schema::empty_object(),
            provides: vec!["user".to_string()],
            security: Some(LogicalContainer::Leaf(Security::Bearer {
                format: Some("JWT".into()),
            })),
        }
    }
}

impl Middleware for BearerAuth {
    fn name(&self) -> &str {
        "bearer"
    }

    fn input_schema(&self) -> &Schema {
        &self.schema
    }

    fn provides(&self) -> &[String] {
        &self.provides
    }

    fn security(&self) -> Option<&LogicalContainer<Security>> {
        self.security.as_ref()
    }

    fn handle<'a>(
        &'a self,
        _input: &'a Map<String, Value>,
        _options: &'a Options,
        request: &'a IncomingRequest,
    ) -> BoxFuture<'a, Result<Map<String, Value>, HttpError>> {
        Box::pin(async move {
            let token = request
                .headers()
                .get(http::header::AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.strip_prefix("Bearer "))
                .ok_or_else(|| HttpError::unauthorized("Missing token"))?;
            let mut provided = Map::new();
            provided.insert("user".into(), json!({ "token": token }));
            Ok(provided)
        })
    }
}

fn role_check() -> BoxedMiddleware {
    Arc::new(
        FnMiddleware::new(
            "role",
            Schema::object(ObjectSchema::new().field("role", Schema::string().optional())),
            |input: Map<String, Value>, options: Options, _request: IncomingRequest| async move {
                if options.get("user").is_none() {
                    return Err(HttpError::internal("role check needs a user"));
                }
                let role = input.get("role").cloned().unwrap_or_else(|| json!("guest"));
                let mut provided = Map::new();
                provided.insert("role".into(), role);
                Ok(provided)
            },
        )
        .provides(["role"]),
    )
}

fn authorized_request() -> IncomingRequest {
    IncomingRequest::new(http::Method::GET, "/me").with_header("authorization", "Bearer abc")
}

#[tokio::test]
async fn later_middlewares_see_earlier_options() {
    let chain = MiddlewareChain::new(vec![Arc::new(BearerAuth::new()), role_check()]).unwrap();

    let mut input = Map::new();
    input.insert("role".into(), json!("admin"));
    let options = chain.run(&input, &authorized_request()).await.unwrap();

    let keys: Vec<&str> = options.iter().map(|(key, _)| key.as_str()).collect();
    assert_eq!(keys, vec!["user", "role"]);
    assert_eq!(options.get("user"), Some(&json!({"token": "abc"})));
    assert_eq!(options.get("role"), Some(&json!("admin")));
}

#[tokio::test]
async fn rejection_names_the_middleware() {
    let chain = MiddlewareChain::new(vec![Arc::new(BearerAuth::new()), role_check()]).unwrap();
    let request = IncomingRequest::new(http::Method::GET, "/me");

    let err = chain.run(&Map::new(), &request).await.unwrap_err();
    match &err {
        TesseraError::Middleware { middleware, source } => {
            assert_eq!(middleware, "bearer");
            assert_eq!(source.status(), http::StatusCode::UNAUTHORIZED);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.public_message(true), "Missing token");
}

#[test]
fn duplicate_option_keys_are_rejected() {
    let err = MiddlewareChain::new(vec![Arc::new(BearerAuth::new()), Arc::new(BearerAuth::new())])
        .unwrap_err();
    assert_eq!(
        err,
        ChainError::DuplicateOption {
            key: "user".into(),
            middleware: "bearer".into()
        }
    );
}

#[test]
fn schemas_and_security_follow_declaration_order() {
    let chain = MiddlewareChain::new(vec![Arc::new(BearerAuth::new()), role_check()]).unwrap();
    let schemas = chain.input_schemas();
    assert_eq!(schemas.len(), 2);
    assert!(schemas[1].as_object().is_some_and(|object| object.get("role").is_some()));
    assert_eq!(
        chain.security(),
        Some(LogicalContainer::Leaf(Security::Bearer {
            format: Some("JWT".into())
        }))
    );
}

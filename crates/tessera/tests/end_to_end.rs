//! Serving and documenting one routing tree through the facade.

use bytes::Bytes;
use http::StatusCode;
use serde_json::{json, Value};
use tessera::core::schema::Unrepresentable;
use tessera::prelude::*;

fn routing() -> Routing<Endpoint> {
    let user = EndpointsFactory::default()
        .endpoint()
        .describe("Retrieves the user.")
        .tag("users")
        .input(Schema::object(ObjectSchema::new().field("id", Schema::string())))
        .output(Schema::object(ObjectSchema::new().field("name", Schema::string())))
        .build(FnHandler::new(|input: Value, _options: Options| async move {
            let id = input["id"].as_str().unwrap_or_default().to_string();
            Ok(json!({"name": format!("user {id}")}))
        }))
        .unwrap();

    let compare = EndpointsFactory::default()
        .endpoint()
        .method(Method::Post)
        .input(Schema::object(ObjectSchema::new().field("test", Schema::number())))
        .output(Schema::object(ObjectSchema::new().field("result", Schema::boolean())))
        .build(FnHandler::new(|input: Value, _options: Options| async move {
            Ok(json!({"result": input["test"].as_f64().unwrap_or_default() > 100.0}))
        }))
        .unwrap();

    let event = EndpointsFactory::default()
        .endpoint()
        .output(Schema::object(
            ObjectSchema::new().field("at", Schema::unrepresentable(Unrepresentable::Date)),
        ))
        .build(FnHandler::new(|_input: Empty, _options: Options| async move {
            Ok(json!({"at": "2024-01-01T00:00:00Z"}))
        }))
        .unwrap();

    Routing::new().nest(
        "v1",
        Routing::new()
            .nest("user", Routing::new().endpoint(":id", user))
            .endpoint("compare", compare)
            .endpoint("event", event),
    )
}

fn config() -> TesseraConfig {
    ConfigLoader::new()
        .with_string(
            r#"
            cors = true

            [docs]
            title = "Example API"
            version = "2.0.0"

            [tags.users]
            description = "Everything about users"
            "#,
            "toml",
        )
        .unwrap()
        .load()
        .unwrap()
}

#[tokio::test]
async fn serves_and_documents_the_same_tree() {
    let routing = routing();
    let config = config();

    let app = App::from_routing(config.clone(), &routing).unwrap();
    let response = app
        .dispatch(
            http::Request::post("/v1/compare")
                .header("content-type", "application/json")
                .body(Bytes::from(json!({"test": 123}).to_string()))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.json_body(),
        Some(json!({"status": "success", "data": {"result": true}}))
    );
    assert_eq!(response.header("access-control-allow-origin"), Some("*"));

    let documentation = Documentation::new(&routing, &config).unwrap();
    let document = documentation.document();
    assert_eq!(document.info.title, "Example API");
    assert_eq!(document.info.version, "2.0.0");
    assert!(document.operation("/v1/user/{id}", Method::Get).is_some());
    assert!(document.operation("/v1/compare", Method::Post).is_some());
    assert_eq!(document.tags[0].name, "users");

    let warnings = documentation.warnings();
    assert_eq!(warnings.len(), 1);
    assert_eq!((warnings[0].method, warnings[0].path.as_str()), (Method::Get, "/v1/event"));
}

#[tokio::test]
async fn registration_matches_the_tree() {
    let app = App::from_routing(config(), &routing()).unwrap();
    let registered: Vec<(String, &str)> = app
        .registered()
        .iter()
        .map(|(method, path)| (method.to_string(), path.as_str()))
        .collect();

    for expected in [("GET", "/v1/user/:id"), ("POST", "/v1/compare"), ("GET", "/v1/event")] {
        assert!(
            registered.contains(&(expected.0.to_string(), expected.1)),
            "missing {expected:?} in {registered:?}"
        );
    }
    // cors adds one OPTIONS responder per path
    assert!(registered.contains(&("OPTIONS".to_string(), "/v1/compare")));
}

//! Document generation over complete routing trees.

use serde_json::{json, Map, Value};
use tessera_config::{Composition, DocsConfig, TagConfig, TesseraConfig};
use tessera_core::schema::{ObjectSchema, Unrepresentable};
use tessera_core::{HttpError, IncomingRequest, InputSource, Method, Options, Schema, Security};
use tessera_docs::{Documentation, DocumentationError, ParameterIn, SchemaType};
use tessera_middleware::FnMiddleware;
use tessera_router::{DependsOnMethod, Routing};
use tessera_server::{Endpoint, EndpointBuilder, EndpointsFactory, FnHandler};

fn build(builder: EndpointBuilder) -> Endpoint {
    builder
        .build(FnHandler::new(|_input: Value, _options: Options| async move { Ok(json!({})) }))
        .unwrap()
}

fn user_endpoint() -> Endpoint {
    build(
        EndpointsFactory::default()
            .endpoint()
            .describe("Retrieves the user by id, including every profile field we store.")
            .tag("users")
            .input(Schema::object(
                ObjectSchema::new()
                    .field("id", Schema::string().describe("user id"))
                    .field("verbose", Schema::boolean().coerce())
                    .field("x-request-id", Schema::string()),
            ))
            .output(Schema::object(ObjectSchema::new().field("name", Schema::string()))),
    )
}

fn user_routing() -> Routing<Endpoint> {
    Routing::new().nest("v1", Routing::new().nest("user", Routing::new().endpoint(":id", user_endpoint())))
}

#[test]
fn unrepresentable_output_is_a_warning() {
    let event = build(
        EndpointsFactory::default()
            .endpoint()
            .output(Schema::object(
                ObjectSchema::new().field("at", Schema::unrepresentable(Unrepresentable::Date)),
            )),
    );
    let routing = Routing::new().nest("v1", Routing::new().endpoint("event", event));

    let documentation = Documentation::new(&routing, &TesseraConfig::default()).unwrap();

    let warnings = documentation.warnings();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].method, Method::Get);
    assert_eq!(warnings[0].path, "/v1/event");
    assert!(warnings[0].message.contains("date"));

    let operation = documentation.document().operation("/v1/event", Method::Get).unwrap();
    let schema = &operation.responses["200"].content["application/json"].schema;
    let at = &schema.properties["data"].properties["at"];
    assert_eq!(at.schema_type, Some(SchemaType::String));
    assert_eq!(at.format.as_deref(), Some("date-time"));
}

#[test]
fn generation_is_deterministic() {
    let routing = user_routing();
    let config = TesseraConfig::default();
    let first = Documentation::new(&routing, &config).unwrap().to_yaml().unwrap();
    let second = Documentation::new(&routing, &config).unwrap().to_yaml().unwrap();
    assert_eq!(first, second);
    assert!(first.contains("openapi: 3.0.0"));
}

#[test]
fn colliding_generated_ids_get_suffixes() {
    let routing = Routing::new()
        .nest("user", Routing::new().endpoint("list", build(EndpointsFactory::default().endpoint())))
        .endpoint("user-list", build(EndpointsFactory::default().endpoint()));

    let documentation = Documentation::new(&routing, &TesseraConfig::default()).unwrap();
    let document = documentation.document();
    assert_eq!(
        document.operation("/user/list", Method::Get).unwrap().operation_id,
        "GetUserList"
    );
    assert_eq!(
        document.operation("/user-list", Method::Get).unwrap().operation_id,
        "GetUserList2"
    );
}

#[test]
fn explicit_duplicate_operation_id_fails() {
    let routing = Routing::new()
        .endpoint("a", build(EndpointsFactory::default().endpoint().operation_id("thing")))
        .endpoint("b", build(EndpointsFactory::default().endpoint().operation_id("thing")));

    let err = Documentation::new(&routing, &TesseraConfig::default()).unwrap_err();
    assert!(matches!(err, DocumentationError::DuplicateOperationId { .. }));
    assert_eq!(err.to_string(), "Duplicated operationId: \"thing\" (GET /b)");
}

#[test]
fn parameters_follow_input_sources() {
    let config = TesseraConfig::builder()
        .input_sources(Method::Get, vec![InputSource::Query, InputSource::Params, InputSource::Headers])
        .build();
    let documentation = Documentation::new(&user_routing(), &config).unwrap();
    let operation = documentation.document().operation("/v1/user/{id}", Method::Get).unwrap();

    let parameters: Vec<_> = operation
        .parameters
        .iter()
        .map(|parameter| (parameter.name.as_str(), parameter.location, parameter.required))
        .collect();
    assert_eq!(
        parameters,
        vec![
            ("id", ParameterIn::Path, true),
            ("verbose", ParameterIn::Query, false),
            ("x-request-id", ParameterIn::Header, true),
        ]
    );
    assert_eq!(operation.parameters[0].description.as_deref(), Some("user id"));
    assert!(operation.request_body.is_none());
}

#[test]
fn request_body_excludes_path_params() {
    let update = build(
        EndpointsFactory::default()
            .endpoint()
            .method(Method::Post)
            .input(
                Schema::object(
                    ObjectSchema::new()
                        .field("id", Schema::string())
                        .field("name", Schema::string()),
                )
                .example(json!({"id": "12", "name": "Jane"})),
            ),
    );
    let routing = Routing::new().nest("user", Routing::new().endpoint(":id", update));

    let documentation = Documentation::new(&routing, &TesseraConfig::default()).unwrap();
    let operation = documentation.document().operation("/user/{id}", Method::Post).unwrap();
    let body = operation.request_body.as_ref().unwrap();
    assert_eq!(body.description.as_deref(), Some("POST /user/:id Request body"));

    let media = &body.content["application/json"];
    assert!(media.schema.properties.contains_key("name"));
    assert!(!media.schema.properties.contains_key("id"));
    assert_eq!(media.examples["example1"].value, json!({"name": "Jane"}));
}

#[test]
fn summary_is_taken_from_description() {
    let documentation = Documentation::new(&user_routing(), &TesseraConfig::default()).unwrap();
    let operation = documentation.document().operation("/v1/user/{id}", Method::Get).unwrap();
    let summary = operation.summary.as_deref().unwrap();
    assert_eq!(summary.chars().count(), 50);
    assert!(summary.ends_with('…'));
    assert_eq!(operation.tags, vec!["users".to_string()]);

    let config = TesseraConfig::builder()
        .docs(DocsConfig {
            has_summary_from_description: false,
            ..DocsConfig::default()
        })
        .build();
    let documentation = Documentation::new(&user_routing(), &config).unwrap();
    let operation = documentation.document().operation("/v1/user/{id}", Method::Get).unwrap();
    assert!(operation.summary.is_none());
}

#[test]
fn responses_use_configured_descriptions() {
    let documentation = Documentation::new(&user_routing(), &TesseraConfig::default()).unwrap();
    let operation = documentation.document().operation("/v1/user/{id}", Method::Get).unwrap();
    let codes: Vec<&str> = operation.responses.keys().map(String::as_str).collect();
    assert_eq!(codes, vec!["200", "400"]);
    assert_eq!(operation.responses["200"].description, "Successful response");
    assert_eq!(operation.responses["400"].description, "Error response");
}

#[test]
fn security_schemes_are_named_and_shared() {
    let auth = FnMiddleware::new(
        "auth",
        Schema::empty_object(),
        |_input: Map<String, Value>, _options: Options, _request: IncomingRequest| async move {
            Ok::<_, HttpError>(Map::new())
        },
    )
    .security(Security::Bearer {
        format: Some("JWT".to_string()),
    });
    let factory = EndpointsFactory::default().add_middleware(auth);
    let routing = Routing::new()
        .endpoint("me", build(factory.endpoint()))
        .endpoint("settings", build(factory.endpoint()));

    let documentation = Documentation::new(&routing, &TesseraConfig::default()).unwrap();
    let document = documentation.document();
    let schemes = &document.components.security_schemes;
    assert_eq!(schemes.len(), 1);
    let scheme = &schemes["HTTP_1"];
    assert_eq!(scheme.scheme.as_deref(), Some("bearer"));
    assert_eq!(scheme.bearer_format.as_deref(), Some("JWT"));

    for path in ["/me", "/settings"] {
        let operation = document.operation(path, Method::Get).unwrap();
        assert_eq!(operation.security.len(), 1);
        assert_eq!(operation.security[0]["HTTP_1"], Vec::<String>::new());
    }
}

#[test]
fn components_composition_deduplicates_schemas() {
    let config = TesseraConfig::builder()
        .docs(DocsConfig {
            composition: Composition::Components,
            ..DocsConfig::default()
        })
        .build();
    let routing = Routing::new()
        .endpoint("a", build(EndpointsFactory::default().endpoint()))
        .endpoint("b", build(EndpointsFactory::default().endpoint()));

    let documentation = Documentation::new(&routing, &config).unwrap();
    let document = documentation.document();
    let reference = |path: &str, status: &str| {
        document.operation(path, Method::Get).unwrap().responses[status].content["application/json"]
            .schema
            .reference
            .clone()
            .unwrap()
    };

    assert_eq!(reference("/a", "200"), "#/components/schemas/GetAPositiveResponse");
    assert_eq!(reference("/b", "200"), reference("/a", "200"));
    assert_eq!(reference("/b", "400"), "#/components/schemas/GetANegativeResponse");
    assert_eq!(document.components.schemas.len(), 2);
}

#[test]
fn method_keyed_nodes_document_each_method() {
    let read = build(EndpointsFactory::default().endpoint());
    let write = build(EndpointsFactory::default().endpoint().methods([Method::Put, Method::Patch]));
    let routing = Routing::new().depends_on_method(
        "item",
        DependsOnMethod::new()
            .with(Method::Get, read)
            .with(Method::Put, write),
    );

    let documentation = Documentation::new(&routing, &TesseraConfig::default()).unwrap();
    let item = &documentation.document().paths["/item"];
    assert!(item.get.is_some());
    assert!(item.put.is_some());
    assert!(item.patch.is_none());
}

#[test]
fn info_servers_and_tags() {
    let config = TesseraConfig::builder()
        .docs(DocsConfig {
            title: "Example API".to_string(),
            version: "1.2.3".to_string(),
            servers: vec!["https://api.example.com".to_string()],
            ..DocsConfig::default()
        })
        .tag("users", TagConfig::described("Everything about users").with_url("https://example.com"))
        .build();

    let documentation = Documentation::new(&user_routing(), &config).unwrap();
    let json: Value = serde_json::from_str(&documentation.to_json().unwrap()).unwrap();
    assert_eq!(json["info"]["title"], "Example API");
    assert_eq!(json["info"]["version"], "1.2.3");
    assert_eq!(json["servers"][0]["url"], "https://api.example.com");
    assert_eq!(json["tags"][0]["name"], "users");
    assert_eq!(json["tags"][0]["externalDocs"]["url"], "https://example.com");
}

//! Building an OpenAPI document from a routing tree.

use indexmap::IndexMap;
use serde::Serialize;
use tessera_config::{Composition, TagConfig, TesseraConfig};
use tessera_core::{InputSource, Method, Schema, Security};
use tessera_router::{EndpointEntry, Routing, Visit};
use tessera_server::{ApiResponse, Endpoint};
use tracing::{debug, warn};

use crate::depict::{
    depict_examples, depict_parameters, depict_schema, ensure_short_description, make_clean_id,
    reformat_path, request_body_schema, request_mime_type, Direction,
};
use crate::error::{DocumentationError, DocumentationResult};
use crate::openapi::{
    ExternalDocumentation, MediaType, OpenApi, Operation, RequestBody, Response, SchemaObject,
    SecurityRequirement, SecurityScheme, Server, Tag,
};

/// A non-fatal problem found while documenting an endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentationWarning {
    /// Method of the endpoint.
    pub method: Method,
    /// Path of the endpoint.
    pub path: String,
    /// What is wrong.
    pub message: String,
}

/// Counters and name registries of one document build.
///
/// Nothing here outlives the build, so generating twice from the same
/// routing tree yields the same names.
#[derive(Debug, Default)]
pub struct DocumentationState {
    operation_ids: IndexMap<String, u32>,
    security_counters: IndexMap<String, u32>,
    components: IndexMap<String, String>,
}

impl DocumentationState {
    /// Creates an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a unique operation id.
    ///
    /// An explicit id is used as is and must not repeat. A generated id gets
    /// a numeric suffix from `2` on when it was taken before.
    pub fn ensure_unique_operation_id(
        &mut self,
        path: &str,
        method: Method,
        explicit: Option<String>,
    ) -> DocumentationResult<String> {
        if let Some(operation_id) = explicit {
            if self.operation_ids.contains_key(&operation_id) {
                return Err(DocumentationError::DuplicateOperationId {
                    operation_id,
                    method,
                    path: path.to_string(),
                });
            }
            self.operation_ids.insert(operation_id.clone(), 1);
            return Ok(operation_id);
        }

        let operation_id = make_clean_id(&[method.as_str(), path]);
        match self.operation_ids.get_mut(&operation_id) {
            Some(count) => {
                *count += 1;
                Ok(format!("{operation_id}{count}"))
            }
            None => {
                self.operation_ids.insert(operation_id.clone(), 1);
                Ok(operation_id)
            }
        }
    }

    /// Returns the name of a security scheme, `TYPE_N` for new ones.
    ///
    /// A scheme equal to one already in `existing` reuses its name.
    pub fn ensure_unique_security_name(
        &mut self,
        scheme: &SecurityScheme,
        existing: &IndexMap<String, SecurityScheme>,
    ) -> String {
        if let Some((name, _)) = existing.iter().find(|(_, known)| *known == scheme) {
            return name.clone();
        }
        let counter = self
            .security_counters
            .entry(scheme.scheme_type.clone())
            .or_insert(0);
        *counter += 1;
        format!("{}_{}", scheme.scheme_type.to_uppercase(), counter)
    }

    /// Returns the component name for a schema fingerprint.
    ///
    /// A fingerprint seen before maps to its first name. New ones take
    /// `preferred`, suffixed from `2` on when `existing` already holds it.
    pub fn component_name(
        &mut self,
        fingerprint: &str,
        preferred: &str,
        existing: &IndexMap<String, SchemaObject>,
    ) -> String {
        if let Some(name) = self.components.get(fingerprint) {
            return name.clone();
        }
        let mut name = preferred.to_string();
        let mut suffix = 1;
        while existing.contains_key(&name) {
            suffix += 1;
            name = format!("{preferred}{suffix}");
        }
        self.components.insert(fingerprint.to_string(), name.clone());
        name
    }
}

/// An OpenAPI document generated from a routing tree.
///
/// # Example
///
/// ```rust
/// use serde_json::json;
/// use tessera_config::TesseraConfig;
/// use tessera_core::schema::ObjectSchema;
/// use tessera_core::{Options, Schema};
/// use tessera_docs::Documentation;
/// use tessera_router::Routing;
/// use tessera_server::{EndpointsFactory, FnHandler};
///
/// let user = EndpointsFactory::default()
///     .endpoint()
///     .describe("Retrieves the user.")
///     .input(Schema::object(ObjectSchema::new().field("id", Schema::string())))
///     .output(Schema::object(ObjectSchema::new().field("name", Schema::string())))
///     .build(FnHandler::new(|_input: serde_json::Value, _options: Options| async move {
///         Ok(json!({"name": "Jane"}))
///     }))
///     .unwrap();
/// let routing = Routing::new().nest("v1", Routing::new().nest("user", Routing::new().endpoint(":id", user)));
///
/// let documentation = Documentation::new(&routing, &TesseraConfig::default()).unwrap();
/// let yaml = documentation.to_yaml().unwrap();
/// assert!(yaml.contains("/v1/user/{id}"));
/// assert!(yaml.contains("GetV1UserId"));
/// ```
#[derive(Debug, Clone)]
pub struct Documentation {
    document: OpenApi,
    warnings: Vec<DocumentationWarning>,
}

impl Documentation {
    /// Walks `routing` and documents every endpoint.
    ///
    /// Title, version, servers, composition and response descriptions come
    /// from `config.docs`; document tags from `config.tags`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentationError::Routing`] for an invalid tree and
    /// [`DocumentationError::DuplicateOperationId`] for a repeated explicit
    /// operation id.
    pub fn new(routing: &Routing<Endpoint>, config: &TesseraConfig) -> DocumentationResult<Self> {
        let mut document = OpenApi::new(config.docs.title.clone(), config.docs.version.clone());
        document.servers = config
            .docs
            .servers
            .iter()
            .map(|url| Server { url: url.clone() })
            .collect();

        let mut builder = Builder {
            config,
            document,
            state: DocumentationState::new(),
            warnings: Vec::new(),
        };
        for visit in routing.walk() {
            if let Visit::Endpoint(entry) = visit? {
                builder.add_endpoint(&entry)?;
            }
        }
        builder.document.tags = depict_tags(&config.tags);

        debug!(
            paths = builder.document.paths.len(),
            warnings = builder.warnings.len(),
            "documentation generated"
        );
        Ok(Self {
            document: builder.document,
            warnings: builder.warnings,
        })
    }

    /// Returns the document.
    #[must_use]
    pub const fn document(&self) -> &OpenApi {
        &self.document
    }

    /// Consumes the documentation, returning the document.
    #[must_use]
    pub fn into_document(self) -> OpenApi {
        self.document
    }

    /// Returns the warnings raised while generating.
    #[must_use]
    pub fn warnings(&self) -> &[DocumentationWarning] {
        &self.warnings
    }

    /// Serializes the document as YAML.
    pub fn to_yaml(&self) -> DocumentationResult<String> {
        serde_yaml::to_string(&self.document).map_err(DocumentationError::from)
    }

    /// Serializes the document as pretty-printed JSON.
    pub fn to_json(&self) -> DocumentationResult<String> {
        serde_json::to_string_pretty(&self.document).map_err(DocumentationError::from)
    }
}

struct Builder<'a> {
    config: &'a TesseraConfig,
    document: OpenApi,
    state: DocumentationState,
    warnings: Vec<DocumentationWarning>,
}

impl Builder<'_> {
    fn add_endpoint(&mut self, entry: &EndpointEntry<Endpoint>) -> DocumentationResult<()> {
        let method = entry.method;
        let path = entry.path.as_str();
        let endpoint = entry.endpoint.as_ref();
        self.check_json_compatibility(method, path, endpoint);

        let sources = self.config.input_sources.for_method(method);
        let operation_id = self
            .state
            .ensure_unique_operation_id(path, method, endpoint.operation_id(method))?;

        let mut responses = IndexMap::new();
        let positive_clue = self.config.docs.positive_response_description.clone();
        let negative_clue = self.config.docs.negative_response_description.clone();
        self.depict_responses(&mut responses, method, path, endpoint.positive_responses(), &positive_clue, "positive response");
        self.depict_responses(&mut responses, method, path, endpoint.negative_responses(), &negative_clue, "negative response");

        let description = endpoint.description().map(ToString::to_string);
        let summary = endpoint.short_description().map(ensure_short_description).or_else(|| {
            description
                .as_deref()
                .filter(|_| self.config.docs.has_summary_from_description)
                .map(ensure_short_description)
        });

        let request_body = sources
            .contains(&InputSource::Body)
            .then(|| self.depict_request_body(method, path, endpoint.input_schema()));

        let operation = Operation {
            operation_id,
            summary,
            description,
            tags: endpoint.tags().to_vec(),
            parameters: depict_parameters(endpoint.input_schema(), path, sources),
            request_body,
            responses,
            security: self.depict_security(endpoint),
        };
        self.document
            .paths
            .entry(reformat_path(path))
            .or_default()
            .set(method, operation);
        Ok(())
    }

    fn check_json_compatibility(&mut self, method: Method, path: &str, endpoint: &Endpoint) {
        // Binary input is an upload, documented as multipart.
        let input_reason = endpoint
            .input_schema()
            .json_incompatibility()
            .filter(|reason| *reason != "binary");
        if let Some(reason) = input_reason {
            self.warn(
                method,
                path,
                format!("The final input schema of the endpoint contains an unsupported JSON payload type: {reason}."),
            );
        }
        for response in endpoint.positive_responses() {
            if let Some(reason) = response.schema.json_incompatibility() {
                self.warn(
                    method,
                    path,
                    format!("The final positive response schema of the endpoint contains an unsupported JSON payload type: {reason}."),
                );
            }
        }
    }

    fn warn(&mut self, method: Method, path: &str, message: String) {
        warn!(method = %method, path, "{message}");
        self.warnings.push(DocumentationWarning {
            method,
            path: path.to_string(),
            message,
        });
    }

    fn depict_responses(
        &mut self,
        into: &mut IndexMap<String, Response>,
        method: Method,
        path: &str,
        responses: &[ApiResponse],
        clue: &str,
        label: &str,
    ) {
        for response in responses {
            let schema = self.place_schema(method, path, &response.schema, Direction::Response, label);
            let examples = depict_examples(response.schema.examples());
            for status in &response.status_codes {
                let depicted = into
                    .entry(status.as_u16().to_string())
                    .or_insert_with(|| Response {
                        description: clue.to_string(),
                        content: IndexMap::new(),
                    });
                for mime_type in &response.mime_types {
                    depicted.content.insert(
                        mime_type.clone(),
                        MediaType {
                            schema: schema.clone(),
                            examples: examples.clone(),
                        },
                    );
                }
            }
        }
    }

    fn depict_request_body(&mut self, method: Method, path: &str, input: &Schema) -> RequestBody {
        let body = request_body_schema(input, path);
        let mime_type = request_mime_type(&body);
        let schema = self.place_schema(method, path, &body, Direction::Request, "request body");
        let mut content = IndexMap::new();
        content.insert(
            mime_type.to_string(),
            MediaType {
                schema,
                examples: depict_examples(body.examples()),
            },
        );
        RequestBody {
            description: Some(format!("{method} {path} Request body")),
            content,
        }
    }

    fn place_schema(
        &mut self,
        method: Method,
        path: &str,
        schema: &Schema,
        direction: Direction,
        label: &str,
    ) -> SchemaObject {
        let depicted = depict_schema(schema, direction);
        if self.config.docs.composition == Composition::Inline {
            return depicted;
        }
        let fingerprint = format!("{direction:?}:{}", schema.fingerprint());
        let preferred = make_clean_id(&[method.as_str(), path, label]);
        let name = self
            .state
            .component_name(&fingerprint, &preferred, &self.document.components.schemas);
        self.document
            .components
            .schemas
            .entry(name.clone())
            .or_insert(depicted);
        SchemaObject::reference(&name)
    }

    fn depict_security(&mut self, endpoint: &Endpoint) -> Vec<SecurityRequirement> {
        let Some(container) = endpoint.security() else {
            return Vec::new();
        };
        let scopes = endpoint.scopes().to_vec();
        let named = container.map(&mut |security: &Security| {
            let scheme = depict_security_scheme(security);
            let name = self
                .state
                .ensure_unique_security_name(&scheme, &self.document.components.security_schemes);
            let required_scopes = if scheme.has_scopes() { scopes.clone() } else { Vec::new() };
            self.document
                .components
                .security_schemes
                .entry(name.clone())
                .or_insert(scheme);
            (name, required_scopes)
        });
        named
            .alternatives()
            .into_iter()
            .map(|alternative| alternative.into_iter().collect::<SecurityRequirement>())
            .collect()
    }
}

fn depict_security_scheme(security: &Security) -> SecurityScheme {
    match security {
        Security::Basic => SecurityScheme {
            scheme: Some("basic".to_string()),
            ..SecurityScheme::of_type("http")
        },
        Security::Bearer { format } => SecurityScheme {
            scheme: Some("bearer".to_string()),
            bearer_format: format.clone(),
            ..SecurityScheme::of_type("http")
        },
        Security::Input { name } => api_key("query", name),
        Security::Header { name } => api_key("header", name),
        Security::Cookie { name } => api_key("cookie", name),
        Security::OpenId { url } => SecurityScheme {
            open_id_connect_url: Some(url.clone()),
            ..SecurityScheme::of_type("openIdConnect")
        },
        Security::OAuth2 { flows } => SecurityScheme {
            flows: Some(flows.clone()),
            ..SecurityScheme::of_type("oauth2")
        },
    }
}

fn api_key(location: &str, name: &str) -> SecurityScheme {
    SecurityScheme {
        location: Some(location.to_string()),
        name: Some(name.to_string()),
        ..SecurityScheme::of_type("apiKey")
    }
}

fn depict_tags(tags: &IndexMap<String, TagConfig>) -> Vec<Tag> {
    tags.iter()
        .map(|(name, tag)| Tag {
            name: name.clone(),
            description: tag.description.clone(),
            external_docs: tag.url.clone().map(|url| ExternalDocumentation { url }),
        })
        .collect()
}

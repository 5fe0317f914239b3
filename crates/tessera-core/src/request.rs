//! The incoming request model.
//!
//! [`IncomingRequest`] is a transport-neutral view of a request whose query,
//! path parameters and body have already been decoded into JSON objects. The
//! endpoint lifecycle merges those parts into one input object according to
//! the configured [`InputSources`].

use crate::method::{InputSource, InputSources};
use base64::Engine;
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderName, HeaderValue, Uri};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors raised while decoding a request.
#[derive(Debug, Error)]
pub enum RequestParseError {
    /// The body is declared as JSON but does not parse.
    #[error("invalid JSON body: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The JSON body is not an object.
    #[error("JSON body must be an object")]
    NotAnObject,

    /// The query string or form body does not parse.
    #[error("invalid urlencoded data: {0}")]
    InvalidUrlEncoded(#[from] serde_urlencoded::de::Error),
}

/// A decoded incoming request.
#[derive(Debug, Clone)]
pub struct IncomingRequest {
    method: http::Method,
    uri: Uri,
    headers: HeaderMap,
    query: Map<String, Value>,
    params: Map<String, Value>,
    body: Map<String, Value>,
    files: Option<Map<String, Value>>,
}

impl IncomingRequest {
    /// Creates a request without query, params or body.
    ///
    /// An unparsable `uri` falls back to `/`.
    pub fn new(method: http::Method, uri: &str) -> Self {
        Self {
            method,
            uri: uri.parse().unwrap_or_else(|_| Uri::from_static("/")),
            headers: HeaderMap::new(),
            query: Map::new(),
            params: Map::new(),
            body: Map::new(),
            files: None,
        }
    }

    /// Decodes an [`http::Request`] with a buffered body.
    ///
    /// JSON bodies must be objects; form bodies are decoded like query
    /// strings; multipart bodies are left to the transport; any other
    /// non-empty body is exposed as `{ "raw": <base64> }`.
    pub fn from_http(request: http::Request<Bytes>) -> Result<Self, RequestParseError> {
        let (parts, body) = request.into_parts();
        let query = match parts.uri.query() {
            Some(query) => parse_urlencoded(query)?,
            None => Map::new(),
        };
        let content_type = parts
            .headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let body = if body.is_empty() || content_type.starts_with("multipart/") {
            Map::new()
        } else if content_type.starts_with("application/json") {
            match serde_json::from_slice::<Value>(&body)? {
                Value::Object(map) => map,
                _ => return Err(RequestParseError::NotAnObject),
            }
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            parse_urlencoded(&String::from_utf8_lossy(&body))?
        } else {
            let mut raw = Map::new();
            raw.insert(
                "raw".into(),
                Value::String(base64::engine::general_purpose::STANDARD.encode(&body)),
            );
            raw
        };
        Ok(Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            query,
            params: Map::new(),
            body,
            files: None,
        })
    }

    /// Sets the query object.
    #[must_use]
    pub fn with_query(mut self, query: Map<String, Value>) -> Self {
        self.query = query;
        self
    }

    /// Sets the path parameters.
    #[must_use]
    pub fn with_params(mut self, params: Map<String, Value>) -> Self {
        self.params = params;
        self
    }

    /// Sets the body object.
    #[must_use]
    pub fn with_body(mut self, body: Map<String, Value>) -> Self {
        self.body = body;
        self
    }

    /// Sets the uploaded files.
    #[must_use]
    pub fn with_files(mut self, files: Map<String, Value>) -> Self {
        self.files = Some(files);
        self
    }

    /// Adds a header. Invalid names or values are ignored.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Replaces the path parameters in place.
    pub fn set_params(&mut self, params: Map<String, Value>) {
        self.params = params;
    }

    /// Returns the method.
    #[must_use]
    pub const fn method(&self) -> &http::Method {
        &self.method
    }

    /// Returns the URI.
    #[must_use]
    pub const fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the path component of the URI.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Returns the headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the decoded query.
    #[must_use]
    pub const fn query(&self) -> &Map<String, Value> {
        &self.query
    }

    /// Returns the path parameters.
    #[must_use]
    pub const fn params(&self) -> &Map<String, Value> {
        &self.params
    }

    /// Returns the decoded body.
    #[must_use]
    pub const fn body(&self) -> &Map<String, Value> {
        &self.body
    }

    /// Returns the uploaded files, if any.
    #[must_use]
    pub const fn files(&self) -> Option<&Map<String, Value>> {
        self.files.as_ref()
    }

    /// Returns `true` for `multipart/*` requests.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.to_ascii_lowercase().starts_with("multipart/"))
    }

    /// Returns the `x-` prefixed headers keyed by lowercase name.
    #[must_use]
    pub fn custom_headers(&self) -> Map<String, Value> {
        self.headers
            .iter()
            .filter(|(name, _)| name.as_str().starts_with("x-"))
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), Value::String(value.to_string())))
            })
            .collect()
    }

    /// Merges the configured sources into one input object.
    ///
    /// `OPTIONS` requests always yield an empty object. Files only
    /// contribute to multipart requests.
    #[must_use]
    pub fn input(&self, sources: &InputSources) -> Map<String, Value> {
        let mut input = Map::new();
        if self.method == http::Method::OPTIONS {
            return input;
        }
        for source in sources.resolve(&self.method) {
            match source {
                InputSource::Query => extend(&mut input, &self.query),
                InputSource::Body => extend(&mut input, &self.body),
                InputSource::Params => extend(&mut input, &self.params),
                InputSource::Files => {
                    if let Some(files) = self.files.as_ref().filter(|_| self.is_multipart()) {
                        extend(&mut input, files);
                    }
                }
                InputSource::Headers => extend(&mut input, &self.custom_headers()),
            }
        }
        input
    }
}

fn extend(target: &mut Map<String, Value>, source: &Map<String, Value>) {
    for (key, value) in source {
        target.insert(key.clone(), value.clone());
    }
}

/// Decodes `a=1&b=2&a=3` into `{"a": ["1", "3"], "b": "2"}`.
fn parse_urlencoded(input: &str) -> Result<Map<String, Value>, RequestParseError> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(input)?;
    let mut map = Map::new();
    for (key, value) in pairs {
        let value = Value::String(value);
        match map.get_mut(&key) {
            Some(Value::Array(values)) => values.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                map.insert(key, value);
            }
        }
    }
    Ok(map)
}

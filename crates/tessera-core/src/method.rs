//! HTTP methods and input sources.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A method an endpoint can be routed on.
///
/// `OPTIONS` is not listed: it is answered by the CORS responder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// DELETE
    Delete,
    /// PATCH
    Patch,
}

/// Error returned when parsing an unsupported method name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported method: {0}")]
pub struct UnknownMethod(pub String);

impl Method {
    /// All methods in canonical order.
    pub const ALL: [Self; 5] = [Self::Get, Self::Post, Self::Put, Self::Delete, Self::Patch];

    /// Returns the lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Post => "post",
            Self::Put => "put",
            Self::Delete => "delete",
            Self::Patch => "patch",
        }
    }

    /// Converts to an [`http::Method`].
    #[must_use]
    pub fn to_http(self) -> http::Method {
        match self {
            Self::Get => http::Method::GET,
            Self::Post => http::Method::POST,
            Self::Put => http::Method::PUT,
            Self::Delete => http::Method::DELETE,
            Self::Patch => http::Method::PATCH,
        }
    }

    /// Converts from an [`http::Method`], if supported.
    #[must_use]
    pub fn from_http(method: &http::Method) -> Option<Self> {
        match *method {
            http::Method::GET => Some(Self::Get),
            http::Method::POST => Some(Self::Post),
            http::Method::PUT => Some(Self::Put),
            http::Method::DELETE => Some(Self::Delete),
            http::Method::PATCH => Some(Self::Patch),
            _ => None,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_ascii_uppercase())
    }
}

impl FromStr for Method {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "get" => Ok(Self::Get),
            "post" => Ok(Self::Post),
            "put" => Ok(Self::Put),
            "delete" => Ok(Self::Delete),
            "patch" => Ok(Self::Patch),
            _ => Err(UnknownMethod(s.to_string())),
        }
    }
}

/// A part of the request that contributes to the endpoint input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputSource {
    /// URL query string.
    Query,
    /// Parsed request body.
    Body,
    /// Path parameters.
    Params,
    /// Uploaded files of a multipart request.
    Files,
    /// Custom `x-` prefixed headers.
    Headers,
}

const GET_SOURCES: &[InputSource] = &[InputSource::Query, InputSource::Params];
const POST_SOURCES: &[InputSource] = &[InputSource::Body, InputSource::Params, InputSource::Files];
const PUT_SOURCES: &[InputSource] = &[InputSource::Body, InputSource::Params];
const FALLBACK_SOURCES: &[InputSource] = &[InputSource::Body, InputSource::Query, InputSource::Params];

/// Ordered input sources per method; later sources override earlier ones.
///
/// | Method | Default |
/// |---|---|
/// | GET, DELETE | query, params |
/// | POST | body, params, files |
/// | PUT, PATCH | body, params |
/// | anything else | body, query, params |
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputSources {
    /// Override for GET.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<Vec<InputSource>>,
    /// Override for POST.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Vec<InputSource>>,
    /// Override for PUT.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put: Option<Vec<InputSource>>,
    /// Override for DELETE.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Vec<InputSource>>,
    /// Override for PATCH.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<Vec<InputSource>>,
}

impl InputSources {
    /// Sets the sources for one method.
    #[must_use]
    pub fn with(mut self, method: Method, sources: Vec<InputSource>) -> Self {
        let slot = match method {
            Method::Get => &mut self.get,
            Method::Post => &mut self.post,
            Method::Put => &mut self.put,
            Method::Delete => &mut self.delete,
            Method::Patch => &mut self.patch,
        };
        *slot = Some(sources);
        self
    }

    /// Returns the sources for a routed method.
    #[must_use]
    pub fn for_method(&self, method: Method) -> &[InputSource] {
        let (custom, default) = match method {
            Method::Get => (&self.get, GET_SOURCES),
            Method::Post => (&self.post, POST_SOURCES),
            Method::Put => (&self.put, PUT_SOURCES),
            Method::Delete => (&self.delete, GET_SOURCES),
            Method::Patch => (&self.patch, PUT_SOURCES),
        };
        custom.as_deref().unwrap_or(default)
    }

    /// Returns the sources for any request method.
    #[must_use]
    pub fn resolve(&self, method: &http::Method) -> &[InputSource] {
        Method::from_http(method).map_or(FALLBACK_SOURCES, |method| self.for_method(method))
    }
}

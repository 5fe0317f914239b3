//! Test request building.

use bytes::Bytes;
use http::{header, HeaderMap, HeaderName, HeaderValue, Method};
use serde::Serialize;
use serde_json::{Map, Value};
use tessera_core::IncomingRequest;

use crate::error::TestError;

/// Entry points for building test requests.
pub struct TestRequest;

impl TestRequest {
    /// Creates a GET request builder.
    pub fn get(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::GET, uri)
    }

    /// Creates a POST request builder.
    pub fn post(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::POST, uri)
    }

    /// Creates a PUT request builder.
    pub fn put(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::PUT, uri)
    }

    /// Creates a PATCH request builder.
    pub fn patch(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::PATCH, uri)
    }

    /// Creates a DELETE request builder.
    pub fn delete(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::DELETE, uri)
    }

    /// Creates an OPTIONS request builder.
    pub fn options(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::OPTIONS, uri)
    }
}

/// Builder for test requests.
///
/// Problems with headers or bodies are reported by [`build`](Self::build)
/// and [`into_http`](Self::into_http), so calls can be chained freely.
#[must_use]
#[derive(Debug)]
pub struct TestRequestBuilder {
    method: Method,
    uri: String,
    headers: HeaderMap,
    body: Bytes,
    params: Map<String, Value>,
    error: Option<TestError>,
}

impl TestRequestBuilder {
    /// Creates a request builder.
    pub fn new(method: Method, uri: impl AsRef<str>) -> Self {
        Self {
            method,
            uri: uri.as_ref().to_string(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
            params: Map::new(),
            error: None,
        }
    }

    /// Sets a header.
    ///
    /// ```ignore
    /// let request = TestRequest::get("/users")
    ///     .header("x-request-id", "12345")
    ///     .build()?;
    /// ```
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        let parsed = HeaderName::try_from(name.as_ref())
            .map_err(|e| TestError::InvalidHeader(format!("{}: {e}", name.as_ref())))
            .and_then(|name| {
                HeaderValue::try_from(value.as_ref())
                    .map(|value| (name, value))
                    .map_err(|e| TestError::InvalidHeader(format!("{}: {e}", value.as_ref())))
            });
        match parsed {
            Ok((name, value)) => {
                self.headers.insert(name, value);
            }
            Err(e) => self.fail(e),
        }
        self
    }

    /// Sets the `Content-Type` header.
    pub fn content_type(self, content_type: impl AsRef<str>) -> Self {
        self.header(header::CONTENT_TYPE.as_str(), content_type)
    }

    /// Sets the `Authorization` header with a bearer token.
    pub fn bearer_token(self, token: impl AsRef<str>) -> Self {
        self.header(
            header::AUTHORIZATION.as_str(),
            format!("Bearer {}", token.as_ref()),
        )
    }

    /// Sets a path parameter, as the router would after matching.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Sets the raw request body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets a JSON body and its content type.
    pub fn json<T: Serialize>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(bytes) => self.body = Bytes::from(bytes),
            Err(e) => self.fail(e.into()),
        }
        self.content_type("application/json")
    }

    /// Sets a form-urlencoded body and its content type.
    pub fn form<T: Serialize>(mut self, value: &T) -> Self {
        match serde_urlencoded::to_string(value) {
            Ok(encoded) => self.body = Bytes::from(encoded),
            Err(e) => self.fail(TestError::RequestBuild(format!("form encoding: {e}"))),
        }
        self.content_type("application/x-www-form-urlencoded")
    }

    fn fail(&mut self, error: TestError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// Returns the HTTP method.
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Converts into an [`http::Request`] as a transport would deliver it.
    ///
    /// Path parameters are not part of an HTTP request and are dropped.
    pub fn into_http(self) -> Result<http::Request<Bytes>, TestError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        let mut builder = http::Request::builder().method(self.method).uri(self.uri);
        if let Some(headers) = builder.headers_mut() {
            headers.extend(self.headers);
        }
        builder
            .body(self.body)
            .map_err(|e| TestError::RequestBuild(e.to_string()))
    }

    /// Builds a decoded request with its path parameters.
    pub fn build(mut self) -> Result<IncomingRequest, TestError> {
        let params = std::mem::take(&mut self.params);
        let request = IncomingRequest::from_http(self.into_http()?)?;
        Ok(request.with_params(params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tessera_core::InputSources;

    #[test]
    fn test_json_request() {
        let request = TestRequest::post("/user/7?verbose=true")
            .param("id", "7")
            .json(&json!({"name": "Jane"}))
            .build()
            .unwrap();

        assert_eq!(request.method(), http::Method::POST);
        assert_eq!(request.path(), "/user/7");
        let input = request.input(&InputSources::default());
        assert_eq!(input.get("name"), Some(&json!("Jane")));
        assert_eq!(input.get("id"), Some(&json!("7")));
    }

    #[test]
    fn test_form_request() {
        let request = TestRequest::post("/login")
            .form(&[("user", "jane"), ("password", "secret")])
            .build()
            .unwrap();
        let input = request.input(&InputSources::default());
        assert_eq!(input.get("user"), Some(&json!("jane")));
    }

    #[test]
    fn test_headers() {
        let request = TestRequest::get("/me").bearer_token("abc").build().unwrap();
        assert_eq!(
            request.headers().get("authorization").unwrap(),
            "Bearer abc"
        );
    }

    #[test]
    fn test_invalid_header_is_reported_on_build() {
        let err = TestRequest::get("/").header("bad name", "x").build().unwrap_err();
        assert!(matches!(err, TestError::InvalidHeader(_)));
    }

    #[test]
    fn test_non_object_json_fails_to_parse() {
        let err = TestRequest::post("/").json(&json!([1, 2])).build().unwrap_err();
        assert!(matches!(err, TestError::Parse(_)));
    }
}

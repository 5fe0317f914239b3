//! Test response wrapper.

use http::{header, HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tessera_core::OutgoingResponse;

use crate::error::TestError;

/// A response with helpers for assertions.
#[derive(Debug, Clone)]
pub struct TestResponse {
    inner: OutgoingResponse,
}

impl From<OutgoingResponse> for TestResponse {
    fn from(inner: OutgoingResponse) -> Self {
        Self { inner }
    }
}

impl TestResponse {
    /// Returns the status code.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.inner.status()
    }

    /// Returns the headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    /// Gets a header value as a string.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.inner.header(name)
    }

    /// Returns the `Content-Type` header.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header(header::CONTENT_TYPE.as_str())
    }

    /// Returns the body as a string.
    pub fn text(&self) -> Result<String, TestError> {
        String::from_utf8(self.inner.body().to_vec())
            .map_err(|e| TestError::BodyRead(format!("Invalid UTF-8: {e}")))
    }

    /// Deserializes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TestError> {
        serde_json::from_slice(self.inner.body()).map_err(TestError::Json)
    }

    /// Deserializes the body as a JSON value.
    pub fn json_value(&self) -> Result<Value, TestError> {
        self.json()
    }

    /// Returns the underlying response.
    #[must_use]
    pub fn into_inner(self) -> OutgoingResponse {
        self.inner
    }

    /// Asserts the status code.
    ///
    /// # Panics
    ///
    /// Panics if the status code doesn't match.
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status(),
            expected,
            "Expected status {}, got {}: {}",
            expected,
            self.status(),
            self.inner.text_body()
        );
        self
    }

    /// Asserts that a header exists with the expected value.
    ///
    /// # Panics
    ///
    /// Panics if the header is missing or different.
    pub fn assert_header(&self, name: &str, expected: &str) -> &Self {
        let actual = self
            .header(name)
            .unwrap_or_else(|| panic!("Header '{name}' not found"));
        assert_eq!(actual, expected, "Header '{name}'");
        self
    }

    /// Asserts the JSON body.
    ///
    /// # Panics
    ///
    /// Panics if the body is not JSON or differs from `expected`.
    pub fn assert_json(&self, expected: &Value) -> &Self {
        let actual = self
            .json_value()
            .unwrap_or_else(|e| panic!("Body is not JSON: {e}"));
        assert_eq!(&actual, expected, "Body mismatch");
        self
    }

    /// Asserts that the body contains a substring.
    ///
    /// # Panics
    ///
    /// Panics if the substring is absent.
    pub fn assert_body_contains(&self, expected: &str) -> &Self {
        let body = self.inner.text_body();
        assert!(
            body.contains(expected),
            "Body should contain '{expected}', got: {body}"
        );
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_helpers() {
        let response: TestResponse =
            OutgoingResponse::json(StatusCode::OK, &json!({"status": "success"})).into();
        response
            .assert_status(StatusCode::OK)
            .assert_header("content-type", "application/json")
            .assert_json(&json!({"status": "success"}));
        assert_eq!(response.content_type(), Some("application/json"));
    }

    #[test]
    fn test_text_helpers() {
        let response: TestResponse = OutgoingResponse::text(StatusCode::NOT_FOUND, "Can not GET /x").into();
        response.assert_body_contains("GET /x");
        assert_eq!(response.text().unwrap(), "Can not GET /x");
        assert!(response.json_value().is_err());
    }

    #[test]
    #[should_panic(expected = "Expected status 200 OK")]
    fn test_assert_status_panics() {
        let response: TestResponse = OutgoingResponse::empty(StatusCode::BAD_REQUEST).into();
        response.assert_status(StatusCode::OK);
    }
}

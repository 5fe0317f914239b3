//! The outgoing response model.

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use http_body_util::Full;
use serde::Serialize;
use serde_json::Value;

/// A fully buffered response produced by a result handler.
#[derive(Debug, Clone)]
pub struct OutgoingResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl OutgoingResponse {
    /// Creates a response with an empty body.
    #[must_use]
    pub fn empty(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Creates an `application/json` response.
    ///
    /// A value that fails to serialize produces an empty JSON object.
    pub fn json(status: StatusCode, value: &impl Serialize) -> Self {
        let body = serde_json::to_vec(value).unwrap_or_else(|_| b"{}".to_vec());
        Self::empty(status)
            .with_header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .with_body(body)
    }

    /// Creates a `text/plain` response.
    pub fn text(status: StatusCode, text: impl Into<String>) -> Self {
        Self::empty(status)
            .with_header(
                CONTENT_TYPE,
                HeaderValue::from_static("text/plain; charset=utf-8"),
            )
            .with_body(text.into())
    }

    /// Replaces the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets a header, replacing previous values.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Sets a header in place.
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    /// Returns the status code.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header value as a string.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Returns the raw body.
    #[must_use]
    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    /// Parses the body as JSON.
    #[must_use]
    pub fn json_body(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }

    /// Returns the body as UTF-8 text, replacing invalid sequences.
    #[must_use]
    pub fn text_body(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Converts into an [`http::Response`].
    #[must_use]
    pub fn into_http(self) -> http::Response<Full<Bytes>> {
        let mut response = http::Response::new(Full::new(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_response() {
        let response = OutgoingResponse::json(StatusCode::OK, &json!({"status": "success"}));
        assert_eq!(response.header("content-type"), Some("application/json"));
        assert_eq!(response.json_body(), Some(json!({"status": "success"})));
    }

    #[test]
    fn test_text_response() {
        let response = OutgoingResponse::text(StatusCode::NOT_FOUND, "Can not GET /x");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.text_body(), "Can not GET /x");
    }

    #[test]
    fn test_into_http_keeps_parts() {
        let response = OutgoingResponse::empty(StatusCode::NO_CONTENT)
            .with_header(HeaderName::from_static("x-a"), HeaderValue::from_static("1"))
            .into_http();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(response.headers()["x-a"], "1");
    }
}

//! In-memory client over a routed [`App`].

use tessera_server::App;

use crate::error::TestError;
use crate::request::{TestRequest, TestRequestBuilder};
use crate::response::TestResponse;

/// Sends test requests through an [`App`] without binding a port.
///
/// Requests go through routing, CORS, the not-found and parser-failure
/// handlers exactly as a transport would drive them.
///
/// ```ignore
/// let client = TestClient::new(App::from_routing(config, &routing)?);
/// let response = client.send(client.get("/v1/user/7")).await?;
/// response.assert_status(StatusCode::OK);
/// ```
#[derive(Debug)]
pub struct TestClient {
    app: App,
    default_headers: Vec<(String, String)>,
}

impl TestClient {
    /// Wraps an application.
    #[must_use]
    pub const fn new(app: App) -> Self {
        Self {
            app,
            default_headers: Vec::new(),
        }
    }

    /// Adds a header sent with every request.
    #[must_use]
    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Returns the application.
    #[must_use]
    pub const fn app(&self) -> &App {
        &self.app
    }

    /// Creates a GET request builder.
    pub fn get(&self, uri: impl AsRef<str>) -> TestRequestBuilder {
        self.prepare(TestRequest::get(uri))
    }

    /// Creates a POST request builder.
    pub fn post(&self, uri: impl AsRef<str>) -> TestRequestBuilder {
        self.prepare(TestRequest::post(uri))
    }

    /// Creates a PUT request builder.
    pub fn put(&self, uri: impl AsRef<str>) -> TestRequestBuilder {
        self.prepare(TestRequest::put(uri))
    }

    /// Creates a PATCH request builder.
    pub fn patch(&self, uri: impl AsRef<str>) -> TestRequestBuilder {
        self.prepare(TestRequest::patch(uri))
    }

    /// Creates a DELETE request builder.
    pub fn delete(&self, uri: impl AsRef<str>) -> TestRequestBuilder {
        self.prepare(TestRequest::delete(uri))
    }

    /// Creates an OPTIONS request builder.
    pub fn options(&self, uri: impl AsRef<str>) -> TestRequestBuilder {
        self.prepare(TestRequest::options(uri))
    }

    fn prepare(&self, request: TestRequestBuilder) -> TestRequestBuilder {
        self.default_headers
            .iter()
            .fold(request, |request, (name, value)| request.header(name, value))
    }

    /// Dispatches a request.
    pub async fn send(&self, request: TestRequestBuilder) -> Result<TestResponse, TestError> {
        let request = request.into_http()?;
        Ok(self.app.dispatch(request).await.into())
    }
}

//! Running a single endpoint without routing.

use serde_json::{Map, Value};
use tessera_config::TesseraConfig;
use tessera_core::{Method, Options, TesseraError};
use tessera_server::{Endpoint, Lifecycle, Stage};

use crate::error::TestError;
use crate::request::TestRequestBuilder;
use crate::response::TestResponse;

/// Outcome of one endpoint execution.
#[derive(Debug)]
pub struct TestResult {
    /// The response the endpoint produced.
    pub response: TestResponse,
    /// The lifecycle state the handler and result handler saw.
    pub lifecycle: Lifecycle,
}

impl TestResult {
    /// Returns the validated input, if validation passed.
    #[must_use]
    pub const fn input(&self) -> Option<&Map<String, Value>> {
        self.lifecycle.input.as_ref()
    }

    /// Returns the options accumulated by middlewares.
    #[must_use]
    pub const fn options(&self) -> &Options {
        &self.lifecycle.options
    }

    /// Returns the validated output, if the handler succeeded.
    #[must_use]
    pub const fn output(&self) -> Option<&Value> {
        self.lifecycle.output.as_ref()
    }

    /// Returns the error passed to the result handler, if any.
    #[must_use]
    pub const fn error(&self) -> Option<&TesseraError> {
        self.lifecycle.error.as_ref()
    }

    /// Returns the stage the lifecycle ended in.
    #[must_use]
    pub const fn stage(&self) -> Stage {
        self.lifecycle.stage()
    }
}

/// Executes `endpoint` once with the default configuration.
///
/// ```ignore
/// let result = test_endpoint(&endpoint, TestRequest::post("/").json(&json!({"test": 123}))).await?;
/// result.response.assert_status(StatusCode::OK);
/// assert_eq!(result.output(), Some(&json!({"result": true})));
/// ```
pub async fn test_endpoint(
    endpoint: &Endpoint,
    request: TestRequestBuilder,
) -> Result<TestResult, TestError> {
    EndpointTest::new(endpoint).run(request).await
}

/// Executes one endpoint with a chosen configuration.
#[must_use]
#[derive(Debug)]
pub struct EndpointTest<'a> {
    endpoint: &'a Endpoint,
    config: TesseraConfig,
    siblings: Option<Vec<Method>>,
}

impl<'a> EndpointTest<'a> {
    /// Prepares a run with the default configuration.
    pub fn new(endpoint: &'a Endpoint) -> Self {
        Self {
            endpoint,
            config: TesseraConfig::default(),
            siblings: None,
        }
    }

    /// Replaces the configuration.
    pub fn config(mut self, config: TesseraConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the methods reported in CORS headers.
    ///
    /// Defaults to the methods of the endpoint.
    pub fn siblings(mut self, siblings: impl IntoIterator<Item = Method>) -> Self {
        self.siblings = Some(siblings.into_iter().collect());
        self
    }

    /// Builds the request and runs it through the endpoint.
    pub async fn run(self, request: TestRequestBuilder) -> Result<TestResult, TestError> {
        let request = request.build()?;
        let siblings = self
            .siblings
            .unwrap_or_else(|| self.endpoint.methods().to_vec());
        let execution = self.endpoint.execute(&request, &self.config, &siblings).await;
        Ok(TestResult {
            response: execution.response.into(),
            lifecycle: execution.lifecycle,
        })
    }
}

//! # Tessera Test
//!
//! Test utilities for Tessera endpoints. Nothing here opens a socket.
//!
//! - [`test_endpoint`] runs one [`Endpoint`](tessera_server::Endpoint) and
//!   returns the response together with the lifecycle state (validated
//!   input, middleware options, output, error)
//! - [`TestClient`] drives a routed [`App`](tessera_server::App)
//! - [`TestRequest`] builds requests; [`TestResponse`] asserts on responses
//!
//! ## Example
//!
//! ```ignore
//! use serde_json::json;
//! use tessera_test::{test_endpoint, TestRequest};
//!
//! #[tokio::test]
//! async fn responds_with_result() {
//!     let result = test_endpoint(&endpoint, TestRequest::post("/").json(&json!({"test": 123})))
//!         .await
//!         .unwrap();
//!     result.response.assert_json(&json!({"status": "success", "data": {"result": true}}));
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/tessera-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod endpoint;
mod error;
mod request;
mod response;

pub use client::TestClient;
pub use endpoint::{test_endpoint, EndpointTest, TestResult};
pub use error::TestError;
pub use request::{TestRequest, TestRequestBuilder};
pub use response::TestResponse;

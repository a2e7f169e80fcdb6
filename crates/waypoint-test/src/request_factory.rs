//! Request factory for building [`http::Request`] values in tests.
//!
//! [`RequestFactory`] builds requests directly. Pass them to
//! [`HttpServer::handle`](waypoint_views::HttpServer::handle), or wrap them in a
//! [`Context`](waypoint_http::Context) to call a single handler in isolation.
//!
//! ## Example
//!
//! ```
//! use waypoint_test::request_factory::RequestFactory;
//!
//! let factory = RequestFactory::new();
//! let request = factory.get("/articles");
//! assert_eq!(request.method(), http::Method::GET);
//! assert_eq!(request.uri().path(), "/articles");
//! ```

use std::collections::HashMap;

use http::{Method, Request};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const JSON_CONTENT_TYPE: &str = "application/json";

/// A factory for [`http::Request`] values with a `Vec<u8>` body.
#[derive(Debug, Clone)]
pub struct RequestFactory {
    default_headers: HashMap<String, String>,
}

impl Default for RequestFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestFactory {
    /// Creates a factory that sets `host: testserver` on every request.
    pub fn new() -> Self {
        let mut default_headers = HashMap::new();
        default_headers.insert("host".to_string(), "testserver".to_string());
        Self { default_headers }
    }

    /// Adds a header included in every request built by this factory.
    #[must_use]
    pub fn with_default_header(mut self, name: &str, value: &str) -> Self {
        self.default_headers
            .insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    /// Builds a GET request.
    pub fn get(&self, path: &str) -> Request<Vec<u8>> {
        self.request(Method::GET, path, Vec::new(), None)
    }

    /// Builds a POST request with a url-encoded form body.
    pub fn post(&self, path: &str, form: &[(&str, &str)]) -> Request<Vec<u8>> {
        self.request(Method::POST, path, encode_form(form), Some(FORM_CONTENT_TYPE))
    }

    /// Builds a POST request with a JSON body.
    pub fn post_json(&self, path: &str, json: &serde_json::Value) -> Request<Vec<u8>> {
        let body = serde_json::to_vec(json).unwrap_or_default();
        self.request(Method::POST, path, body, Some(JSON_CONTENT_TYPE))
    }

    /// Builds a PUT request with a url-encoded form body.
    pub fn put(&self, path: &str, form: &[(&str, &str)]) -> Request<Vec<u8>> {
        self.request(Method::PUT, path, encode_form(form), Some(FORM_CONTENT_TYPE))
    }

    /// Builds a PATCH request with a url-encoded form body.
    pub fn patch(&self, path: &str, form: &[(&str, &str)]) -> Request<Vec<u8>> {
        self.request(Method::PATCH, path, encode_form(form), Some(FORM_CONTENT_TYPE))
    }

    /// Builds a DELETE request.
    pub fn delete(&self, path: &str) -> Request<Vec<u8>> {
        self.request(Method::DELETE, path, Vec::new(), None)
    }

    /// Builds a HEAD request.
    pub fn head(&self, path: &str) -> Request<Vec<u8>> {
        self.request(Method::HEAD, path, Vec::new(), None)
    }

    /// Builds an OPTIONS request.
    pub fn options(&self, path: &str) -> Request<Vec<u8>> {
        self.request(Method::OPTIONS, path, Vec::new(), None)
    }

    /// Builds a request with any method, body and content type.
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid URI or a default header is invalid.
    pub fn request(
        &self,
        method: Method,
        path: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
    ) -> Request<Vec<u8>> {
        let mut builder = Request::builder().method(method).uri(path);
        for (name, value) in &self.default_headers {
            builder = builder.header(name, value);
        }
        if let Some(ct) = content_type {
            builder = builder.header("content-type", ct);
        }
        builder
            .body(body)
            .expect("test request should be well formed")
    }
}

/// URL-encodes form pairs as `key=value&key=value`.
pub(crate) fn encode_form(form: &[(&str, &str)]) -> Vec<u8> {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(form)
        .finish()
        .into_bytes()
}

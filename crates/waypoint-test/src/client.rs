//! In-process test client for waypoint.
//!
//! [`TestClient`] sends requests straight into
//! [`HttpServer::handle`](waypoint_views::HttpServer::handle), with no socket in
//! between, and returns a [`TestResponse`] for inspection. Cookies set by
//! responses are sent back on later requests.
//!
//! ## Usage
//!
//! ```
//! use waypoint_core::Settings;
//! use waypoint_test::TestClient;
//! use waypoint_views::HttpServer;
//!
//! let mut server = HttpServer::new(Settings::default());
//! server
//!     .get("/hello", |ctx| ctx.respond(http::StatusCode::OK, "Hello, World!"))
//!     .unwrap();
//!
//! let mut client = TestClient::new(server);
//! let response = client.get("/hello");
//! assert_eq!(response.status_code(), 200);
//! assert_eq!(response.text(), "Hello, World!");
//! ```

use std::collections::HashMap;

use http::header::{COOKIE, SET_COOKIE};
use http::{HeaderMap, HeaderValue, Method, Request, StatusCode};
use serde::de::DeserializeOwned;
use waypoint_core::{WaypointError, WaypointResult};
use waypoint_views::HttpServer;

use crate::request_factory::RequestFactory;

/// A test client that drives an [`HttpServer`] in process.
#[derive(Debug)]
pub struct TestClient {
    server: HttpServer,
    factory: RequestFactory,
    cookies: HashMap<String, String>,
}

impl TestClient {
    /// Creates a client for `server`.
    pub fn new(server: HttpServer) -> Self {
        Self {
            server,
            factory: RequestFactory::new(),
            cookies: HashMap::new(),
        }
    }

    /// Returns the server under test.
    pub const fn server(&self) -> &HttpServer {
        &self.server
    }

    /// Returns the server under test for further registration.
    pub fn server_mut(&mut self) -> &mut HttpServer {
        &mut self.server
    }

    /// Sends a GET request.
    pub fn get(&mut self, path: &str) -> TestResponse {
        let request = self.factory.get(path);
        self.send(request)
    }

    /// Sends a POST request with a url-encoded form body.
    pub fn post(&mut self, path: &str, form: &[(&str, &str)]) -> TestResponse {
        let request = self.factory.post(path, form);
        self.send(request)
    }

    /// Sends a POST request with a JSON body.
    pub fn post_json(&mut self, path: &str, json: &serde_json::Value) -> TestResponse {
        let request = self.factory.post_json(path, json);
        self.send(request)
    }

    /// Sends a PUT request with a url-encoded form body.
    pub fn put(&mut self, path: &str, form: &[(&str, &str)]) -> TestResponse {
        let request = self.factory.put(path, form);
        self.send(request)
    }

    /// Sends a PATCH request with a url-encoded form body.
    pub fn patch(&mut self, path: &str, form: &[(&str, &str)]) -> TestResponse {
        let request = self.factory.patch(path, form);
        self.send(request)
    }

    /// Sends a DELETE request.
    pub fn delete(&mut self, path: &str) -> TestResponse {
        let request = self.factory.delete(path);
        self.send(request)
    }

    /// Sends a HEAD request.
    pub fn head(&mut self, path: &str) -> TestResponse {
        let request = self.factory.head(path);
        self.send(request)
    }

    /// Sends an OPTIONS request.
    pub fn options(&mut self, path: &str) -> TestResponse {
        let request = self.factory.options(path);
        self.send(request)
    }

    /// Sends a request with any method.
    pub fn request(&mut self, method: Method, path: &str) -> TestResponse {
        let request = self.factory.request(method, path, Vec::new(), None);
        self.send(request)
    }

    /// Sets a cookie included in subsequent requests.
    pub fn set_cookie(&mut self, name: &str, value: &str) {
        self.cookies.insert(name.to_string(), value.to_string());
    }

    /// Clears the cookie jar.
    pub fn clear_cookies(&mut self) {
        self.cookies.clear();
    }

    /// Returns the value of a cookie in the jar.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    /// Sends a prepared request through the server, adding the cookie jar.
    pub fn send(&mut self, mut request: Request<Vec<u8>>) -> TestResponse {
        if let Some(cookie) = self.cookie_header() {
            request.headers_mut().insert(COOKIE, cookie);
        }

        let response = self.server.handle(request);
        let (parts, body) = response.into_parts();

        let mut response_cookies = HashMap::new();
        for value in parts.headers.get_all(SET_COOKIE) {
            let Ok(cookie) = value.to_str() else {
                continue;
            };
            let pair = cookie.split(';').next().unwrap_or_default();
            if let Some((name, val)) = pair.split_once('=') {
                let name = name.trim().to_string();
                let val = val.trim().to_string();
                self.cookies.insert(name.clone(), val.clone());
                response_cookies.insert(name, val);
            }
        }

        TestResponse {
            status: parts.status,
            headers: parts.headers,
            body,
            cookies: response_cookies,
        }
    }

    fn cookie_header(&self) -> Option<HeaderValue> {
        if self.cookies.is_empty() {
            return None;
        }
        let mut pairs: Vec<_> = self
            .cookies
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        pairs.sort();
        HeaderValue::from_str(&pairs.join("; ")).ok()
    }
}

/// The response to a test request.
#[derive(Debug)]
pub struct TestResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The response headers.
    pub headers: HeaderMap,
    /// The response body.
    pub body: Vec<u8>,
    /// Cookies set by this response.
    pub cookies: HashMap<String, String>,
}

impl TestResponse {
    /// Returns the body as a UTF-8 string, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    /// Deserializes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> WaypointResult<T> {
        serde_json::from_slice(&self.body)
            .map_err(|e| WaypointError::SerializationError(e.to_string()))
    }

    /// Returns the numeric status code.
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Returns a header value by name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns `true` if the response has the header.
    pub fn has_header(&self, name: &str) -> bool {
        self.headers.contains_key(name)
    }

    /// Returns `true` if the body contains `text`.
    pub fn contains(&self, text: &str) -> bool {
        self.text().contains(text)
    }
}

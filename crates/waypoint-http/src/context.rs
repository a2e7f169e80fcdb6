//! The per-request context.
//!
//! A [`Context`] is created by the dispatcher for every incoming request and
//! passed by `&mut` reference through the global middleware, the routing stage,
//! the route middleware and finally the handler. It carries the request parts
//! together with the response state being accumulated; the dispatcher turns that
//! state into an [`http::Response`] exactly once after every stage has returned.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use http::header::{HeaderName, HeaderValue, CONTENT_TYPE, SET_COOKIE};
use http::{HeaderMap, Method, StatusCode, Uri};
use serde::de::DeserializeOwned;
use serde::Serialize;
use waypoint_core::{WaypointError, WaypointResult};

use crate::querydict::QueryDict;

const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Request state and accumulated response state for one request.
///
/// # Examples
///
/// ```
/// use waypoint_http::Context;
///
/// let request = http::Request::builder()
///     .uri("/search?q=rust")
///     .body(Vec::new())
///     .unwrap();
/// let ctx = Context::from_request(request);
/// assert_eq!(ctx.query_value("q").unwrap().as_str(), "rust");
/// ```
#[derive(Debug)]
pub struct Context {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Vec<u8>,
    params: HashMap<String, String>,
    matched_route: String,
    query: OnceLock<QueryDict>,
    form: OnceLock<QueryDict>,
    max_body_bytes: usize,
    resp_status: Option<StatusCode>,
    resp_headers: HeaderMap,
    resp_data: Vec<u8>,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            method: Method::GET,
            uri: Uri::default(),
            headers: HeaderMap::new(),
            body: Vec::new(),
            params: HashMap::new(),
            matched_route: String::new(),
            query: OnceLock::new(),
            form: OnceLock::new(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            resp_status: None,
            resp_headers: HeaderMap::new(),
            resp_data: Vec::new(),
        }
    }
}

impl Context {
    /// Creates a context from an incoming request.
    pub fn from_request(request: http::Request<Vec<u8>>) -> Self {
        let (parts, body) = request.into_parts();
        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
            ..Self::default()
        }
    }

    /// Sets the largest body the JSON and form helpers will decode.
    #[must_use]
    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    // ── Request accessors ────────────────────────────────────────────

    /// Returns the request method.
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the full request URI.
    pub const fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the path component of the request URI.
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Returns the request headers.
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a request header as a string, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the raw request body.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Returns the path parameters captured by the matcher.
    pub const fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    /// Returns the full path of the matched route, e.g. `/user/:id`.
    ///
    /// Empty until the routing stage has found a route.
    pub fn matched_route(&self) -> &str {
        &self.matched_route
    }

    /// Replaces the captured path parameters. Called by the routing stage.
    pub fn set_params(&mut self, params: HashMap<String, String>) {
        self.params = params;
    }

    /// Records the matched route. Called by the routing stage.
    pub fn set_matched_route(&mut self, route: impl Into<String>) {
        self.matched_route = route.into();
    }

    // ── Typed value helpers ──────────────────────────────────────────

    /// Returns a captured path parameter.
    ///
    /// # Errors
    ///
    /// Returns [`WaypointError::NotFound`] if the route captured no such parameter.
    pub fn path_value(&self, key: &str) -> WaypointResult<StringValue> {
        self.params
            .get(key)
            .map(|v| StringValue::new(v.clone()))
            .ok_or_else(|| WaypointError::NotFound(format!("path parameter '{key}'")))
    }

    /// Returns the first query string value for `key`.
    ///
    /// The query string is parsed on first use and cached for the rest of the
    /// request.
    ///
    /// # Errors
    ///
    /// Returns [`WaypointError::NotFound`] if the key is absent.
    pub fn query_value(&self, key: &str) -> WaypointResult<StringValue> {
        self.query()
            .get(key)
            .map(StringValue::from)
            .ok_or_else(|| WaypointError::NotFound(format!("query key '{key}'")))
    }

    /// Returns the parsed query string.
    pub fn query(&self) -> &QueryDict {
        self.query
            .get_or_init(|| QueryDict::parse(self.uri.query().unwrap_or("")))
    }

    /// Returns a form value for `key`.
    ///
    /// A url-encoded request body is consulted first, then the query string.
    ///
    /// # Errors
    ///
    /// Returns [`WaypointError::BadRequest`] if the body exceeds the configured
    /// limit, and [`WaypointError::NotFound`] if neither source has the key.
    pub fn form_value(&self, key: &str) -> WaypointResult<StringValue> {
        if self.has_form_body() {
            self.check_body_size()?;
            let form = self.form.get_or_init(|| QueryDict::parse_bytes(&self.body));
            if let Some(value) = form.get(key) {
                return Ok(StringValue::from(value));
            }
        }
        self.query()
            .get(key)
            .map(StringValue::from)
            .ok_or_else(|| WaypointError::NotFound(format!("form key '{key}'")))
    }

    /// Deserializes the request body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`WaypointError::BadRequest`] if the body is empty, too large,
    /// or not valid JSON for `T`.
    pub fn bind_json<T: DeserializeOwned>(&self) -> WaypointResult<T> {
        if self.body.is_empty() {
            return Err(WaypointError::BadRequest("empty request body".to_string()));
        }
        self.check_body_size()?;
        serde_json::from_slice(&self.body)
            .map_err(|e| WaypointError::BadRequest(format!("invalid JSON body: {e}")))
    }

    fn has_form_body(&self) -> bool {
        self.header(CONTENT_TYPE.as_str())
            .is_some_and(|ct| ct.starts_with(FORM_CONTENT_TYPE))
    }

    fn check_body_size(&self) -> WaypointResult<()> {
        if self.body.len() > self.max_body_bytes {
            return Err(WaypointError::BadRequest(format!(
                "request body of {} bytes exceeds the limit of {} bytes",
                self.body.len(),
                self.max_body_bytes
            )));
        }
        Ok(())
    }

    // ── Response state ───────────────────────────────────────────────

    /// Returns the response status set so far, if any.
    pub const fn status(&self) -> Option<StatusCode> {
        self.resp_status
    }

    /// Sets the response status.
    pub fn set_status(&mut self, status: StatusCode) {
        self.resp_status = Some(status);
    }

    /// Returns the response body accumulated so far.
    pub fn response_body(&self) -> &[u8] {
        &self.resp_data
    }

    /// Replaces the response body.
    pub fn set_body(&mut self, body: impl Into<Vec<u8>>) {
        self.resp_data = body.into();
    }

    /// Returns the response headers set so far.
    pub const fn response_headers(&self) -> &HeaderMap {
        &self.resp_headers
    }

    /// Sets the status and body in one call.
    pub fn respond(&mut self, status: StatusCode, body: impl Into<Vec<u8>>) {
        self.set_status(status);
        self.set_body(body);
    }

    /// Serializes `value` as the JSON response body.
    ///
    /// # Errors
    ///
    /// Returns [`WaypointError::SerializationError`] if `value` cannot be
    /// serialized; the response state is left untouched in that case.
    pub fn respond_json<T: Serialize + ?Sized>(
        &mut self,
        status: StatusCode,
        value: &T,
    ) -> WaypointResult<()> {
        let bytes = serde_json::to_vec(value)
            .map_err(|e| WaypointError::SerializationError(e.to_string()))?;
        self.resp_headers
            .insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        self.respond(status, bytes);
        Ok(())
    }

    /// Sets a response header, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`WaypointError::InvalidValue`] if the name or value is not a
    /// legal header.
    pub fn set_header(&mut self, name: &str, value: &str) -> WaypointResult<()> {
        let name = HeaderName::from_str(name)
            .map_err(|e| WaypointError::InvalidValue(format!("header name '{name}': {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| WaypointError::InvalidValue(format!("header value: {e}")))?;
        self.resp_headers.insert(name, value);
        Ok(())
    }

    /// Appends a `Set-Cookie` header with `name=value; Path=/`.
    ///
    /// # Errors
    ///
    /// Returns [`WaypointError::InvalidValue`] if the name is empty or the
    /// cookie contains characters that cannot appear in a header.
    pub fn set_cookie(&mut self, name: &str, value: &str) -> WaypointResult<()> {
        if name.is_empty() || name.contains(['=', ';', ' ']) {
            return Err(WaypointError::InvalidValue(format!(
                "cookie name '{name}'"
            )));
        }
        let cookie = HeaderValue::from_str(&format!("{name}={value}; Path=/"))
            .map_err(|e| WaypointError::InvalidValue(format!("cookie '{name}': {e}")))?;
        self.resp_headers.append(SET_COOKIE, cookie);
        Ok(())
    }

    /// Converts the accumulated response state into the outgoing response.
    ///
    /// A context whose status was never set flushes as `200 OK`.
    pub fn into_response(self) -> http::Response<Vec<u8>> {
        let mut response = http::Response::new(self.resp_data);
        *response.status_mut() = self.resp_status.unwrap_or(StatusCode::OK);
        *response.headers_mut() = self.resp_headers;
        response
    }
}

/// A string pulled from the request, with typed conversions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringValue(String);

impl StringValue {
    /// Wraps a string.
    pub const fn new(value: String) -> Self {
        Self(value)
    }

    /// Returns the value as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the wrapper and returns the owned string.
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Parses the value as a signed 64-bit integer.
    ///
    /// # Errors
    ///
    /// Returns [`WaypointError::InvalidValue`] if the value is not an integer.
    pub fn as_i64(&self) -> WaypointResult<i64> {
        self.parse()
    }

    /// Parses the value into any [`FromStr`] type.
    ///
    /// # Errors
    ///
    /// Returns [`WaypointError::InvalidValue`] if parsing fails.
    pub fn parse<T>(&self) -> WaypointResult<T>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        self.0
            .parse()
            .map_err(|e| WaypointError::InvalidValue(format!("'{}': {e}", self.0)))
    }
}

impl From<&str> for StringValue {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for StringValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

//! Built-in middleware for waypoint.
//!
//! - [`AccessLog`] - One structured log record per request
//! - [`Recovery`] - Turns a panicking handler into an error response
//! - [`ErrorPages`] - Replaces the body of responses with selected status codes
//!
//! Each is configured through builder methods and turned into a [`Middleware`]
//! with `build()`.

use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use http::StatusCode;
use serde::Serialize;
use tracing::{error, info};
use waypoint_core::logging::request_span;
use waypoint_core::Settings;
use waypoint_http::Context;

use super::{handler, middleware, Middleware};

// ============================================================================
// AccessLog
// ============================================================================

/// A callback that receives each access record serialized as JSON.
pub type AccessLogSink = Arc<dyn Fn(&str) + Send + Sync>;

/// One line of the access log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessRecord {
    /// The `Host` header, if any.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub host: String,
    /// The matched route pattern, empty when no route matched.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub route: String,
    /// The request method.
    pub method: String,
    /// The request path.
    pub path: String,
    /// The response status.
    pub status: u16,
    /// The request id, taken from the request or generated.
    pub request_id: String,
}

/// Logs every request after the inner chain has returned.
///
/// The request id is read from the configured header, or generated as a UUID v4
/// when absent, and echoed on the response. The inner chain runs inside a
/// [`request_span`] carrying that id.
///
/// Installed as global middleware, the record includes the route the request
/// matched, since routing happens inside the wrapped chain.
///
/// # Examples
///
/// ```
/// use waypoint_views::middleware::builtin::AccessLog;
///
/// let access_log = AccessLog::default()
///     .with_sink(|line| println!("{line}"))
///     .build();
/// ```
#[derive(Clone)]
pub struct AccessLog {
    request_id_header: String,
    sink: Option<AccessLogSink>,
}

impl Default for AccessLog {
    fn default() -> Self {
        Self {
            request_id_header: "x-request-id".to_string(),
            sink: None,
        }
    }
}

impl AccessLog {
    /// Creates an access log that uses the request id header from `settings`.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::default().with_request_id_header(&settings.request_id_header)
    }

    /// Sets the header the request id is read from and written to.
    #[must_use]
    pub fn with_request_id_header(mut self, header: &str) -> Self {
        self.request_id_header = header.to_ascii_lowercase();
        self
    }

    /// Sends every access record, serialized as JSON, to `sink` in addition
    /// to the tracing event.
    #[must_use]
    pub fn with_sink<F>(mut self, sink: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.sink = Some(Arc::new(sink));
        self
    }

    /// Builds the middleware.
    pub fn build(self) -> Middleware {
        let config = Arc::new(self);
        middleware(move |next| {
            let config = Arc::clone(&config);
            handler(move |ctx| {
                let request_id = ctx
                    .header(&config.request_id_header)
                    .map_or_else(|| uuid::Uuid::new_v4().to_string(), str::to_string);

                {
                    let span = request_span(&request_id);
                    let _guard = span.enter();
                    next(ctx);
                }

                if let Err(e) = ctx.set_header(&config.request_id_header, &request_id) {
                    error!(error = %e, "could not echo request id");
                }
                config.record(ctx, request_id);
            })
        })
    }

    fn record(&self, ctx: &Context, request_id: String) {
        let record = AccessRecord {
            host: ctx.header("host").unwrap_or_default().to_string(),
            route: ctx.matched_route().to_string(),
            method: ctx.method().to_string(),
            path: ctx.path().to_string(),
            status: ctx.status().unwrap_or(StatusCode::OK).as_u16(),
            request_id,
        };
        info!(
            host = %record.host,
            route = %record.route,
            method = %record.method,
            path = %record.path,
            status = record.status,
            request_id = %record.request_id,
            "access"
        );
        if let Some(sink) = &self.sink {
            match serde_json::to_string(&record) {
                Ok(line) => sink(&line),
                Err(e) => error!(error = %e, "could not serialize access record"),
            }
        }
    }
}

impl fmt::Debug for AccessLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessLog")
            .field("request_id_header", &self.request_id_header)
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}

// ============================================================================
// Recovery
// ============================================================================

/// A callback that receives the panic message and the context of the failed
/// request.
pub type PanicLogger = Arc<dyn Fn(&str, &Context) + Send + Sync>;

/// Catches panics from the inner chain and answers with a fixed response.
///
/// Without a logger the panic is reported through `tracing` at error level.
#[derive(Clone)]
pub struct Recovery {
    status: StatusCode,
    body: Vec<u8>,
    logger: Option<PanicLogger>,
}

impl Default for Recovery {
    fn default() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: b"Internal Server Error".to_vec(),
            logger: None,
        }
    }
}

impl Recovery {
    /// Sets the status written after a panic.
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Sets the body written after a panic.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Calls `logger` for every recovered panic.
    #[must_use]
    pub fn with_logger<F>(mut self, logger: F) -> Self
    where
        F: Fn(&str, &Context) + Send + Sync + 'static,
    {
        self.logger = Some(Arc::new(logger));
        self
    }

    /// Builds the middleware.
    pub fn build(self) -> Middleware {
        let config = Arc::new(self);
        middleware(move |next| {
            let config = Arc::clone(&config);
            handler(move |ctx| {
                let Err(payload) = catch_unwind(AssertUnwindSafe(|| next(ctx))) else {
                    return;
                };
                let message = panic_message(payload.as_ref());
                match &config.logger {
                    Some(logger) => logger(&message, ctx),
                    None => error!(
                        panic = %message,
                        method = %ctx.method(),
                        path = %ctx.path(),
                        "recovered from panic"
                    ),
                }
                ctx.respond(config.status, config.body.clone());
            })
        })
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl fmt::Debug for Recovery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recovery")
            .field("status", &self.status)
            .field("body_len", &self.body.len())
            .field("has_logger", &self.logger.is_some())
            .finish()
    }
}

// ============================================================================
// ErrorPages
// ============================================================================

/// Replaces the response body for selected status codes.
///
/// # Examples
///
/// ```
/// use http::StatusCode;
/// use waypoint_views::middleware::builtin::ErrorPages;
///
/// let pages = ErrorPages::default()
///     .with_page(StatusCode::NOT_FOUND, "<h1>Lost?</h1>")
///     .build();
/// ```
#[derive(Debug, Clone, Default)]
pub struct ErrorPages {
    pages: HashMap<StatusCode, Vec<u8>>,
}

impl ErrorPages {
    /// Registers `body` for `status`, replacing any earlier page.
    #[must_use]
    pub fn with_page(mut self, status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        self.pages.insert(status, body.into());
        self
    }

    /// Returns the number of registered pages.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Returns `true` if no page is registered.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Builds the middleware.
    pub fn build(self) -> Middleware {
        let pages = Arc::new(self.pages);
        middleware(move |next| {
            let pages = Arc::clone(&pages);
            handler(move |ctx| {
                next(ctx);
                if let Some(page) = ctx.status().and_then(|status| pages.get(&status)) {
                    ctx.set_body(page.clone());
                }
            })
        })
    }
}

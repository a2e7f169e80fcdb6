//! Core error types for waypoint.
//!
//! [`WaypointError`] covers two very different classes of failure:
//!
//! - Configuration defects detected while routes and middleware are being
//!   registered (bad paths, conflicting routes, malformed regex constraints).
//!   These are programming mistakes and should abort startup.
//! - Per-request failures raised by the request context helpers (missing query
//!   keys, malformed JSON bodies). These map to 4xx responses.
//!
//! A route that simply does not exist is *not* an error: lookups return
//! `Option` and the dispatcher turns `None` into a 404 response.

use thiserror::Error;

/// The primary error type for waypoint.
///
/// Each variant maps to an HTTP status code via [`WaypointError::status_code`].
#[derive(Error, Debug)]
pub enum WaypointError {
    // ── Registration ─────────────────────────────────────────────────

    /// A route path failed syntax validation.
    #[error("Invalid route path '{path}': {reason}")]
    InvalidPath {
        /// The path as passed to the registrar.
        path: String,
        /// Which rule the path broke.
        reason: String,
    },

    /// A registration collides with the existing route tree.
    #[error("Route conflict: {0}")]
    RouteConflict(String),

    /// The regex inside a `:name(<regex>)` segment did not compile.
    #[error("Invalid regex constraint in segment '{segment}': {source}")]
    RegexCompile {
        /// The full parameter segment, e.g. `:id([0-9+)`.
        segment: String,
        /// The underlying compile error.
        #[source]
        source: regex::Error,
    },

    /// Middleware was attached to a route that was never registered.
    #[error("Cannot attach middleware: route [{method}] '{path}' does not exist")]
    MiddlewareTargetNotFound {
        /// The HTTP method of the missing route.
        method: String,
        /// The path of the missing route.
        path: String,
    },

    // ── Configuration ────────────────────────────────────────────────

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    // ── Request handling ─────────────────────────────────────────────

    /// HTTP 400 Bad Request.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// HTTP 404 Not Found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A request value could not be converted to the requested type.
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// An error occurred during serialization or deserialization.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl WaypointError {
    /// Returns the HTTP status code associated with this error.
    ///
    /// - `BadRequest`, `InvalidValue` -> 400
    /// - `NotFound` -> 404
    /// - Everything else -> 500
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest(_) | Self::InvalidValue(_) => 400,
            Self::NotFound(_) => 404,
            Self::InvalidPath { .. }
            | Self::RouteConflict(_)
            | Self::RegexCompile { .. }
            | Self::MiddlewareTargetNotFound { .. }
            | Self::ConfigurationError(_)
            | Self::SerializationError(_)
            | Self::IoError(_) => 500,
        }
    }

    /// Returns `true` for errors that indicate a broken route or server
    /// configuration rather than a bad request.
    pub const fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidPath { .. }
                | Self::RouteConflict(_)
                | Self::RegexCompile { .. }
                | Self::MiddlewareTargetNotFound { .. }
                | Self::ConfigurationError(_)
        )
    }
}

/// A convenience type alias for `Result<T, WaypointError>`.
pub type WaypointResult<T> = Result<T, WaypointError>;

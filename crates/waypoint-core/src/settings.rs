//! Server settings.
//!
//! [`Settings`] holds the knobs a waypoint server reads at startup. Every field
//! has a default so a settings file only needs to name what it changes. Settings
//! are owned by the server that uses them; there is no process-global instance.

use serde::{Deserialize, Serialize};

/// The complete set of server settings.
///
/// # Examples
///
/// ```
/// use waypoint_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert!(settings.debug);
/// assert_eq!(settings.not_found_body, "Not Found");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    // ── Core ─────────────────────────────────────────────────────────

    /// Whether debug mode is enabled. Controls the log output format.
    pub debug: bool,

    // ── Logging ──────────────────────────────────────────────────────

    /// The log filter directive (e.g. "info", "waypoint_http=debug").
    pub log_level: String,

    // ── Dispatch ─────────────────────────────────────────────────────

    /// Body written for requests that match no route.
    pub not_found_body: String,
    /// Header carrying the request id, read and generated by the access log.
    pub request_id_header: String,
    /// Upper bound for bodies decoded by the context's JSON and form helpers.
    pub max_body_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: true,
            log_level: "info".to_string(),
            not_found_body: "Not Found".to_string(),
            request_id_header: "x-request-id".to_string(),
            max_body_bytes: 2 * 1024 * 1024,
        }
    }
}

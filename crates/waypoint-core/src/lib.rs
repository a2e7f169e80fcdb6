//! # waypoint-core
//!
//! Core types shared by every waypoint crate. This crate knows nothing about
//! routing; it provides the error taxonomy, settings and logging setup.
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases
//! - [`settings`] - Server settings with defaults
//! - [`settings_loader`] - Loading settings from TOML, JSON and the environment
//! - [`logging`] - Tracing-based logging integration

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;

// Re-export the most commonly used types at the crate root.
pub use error::{WaypointError, WaypointResult};
pub use settings::Settings;

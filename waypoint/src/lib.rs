//! # waypoint
//!
//! An in-process HTTP router: a per-method segment trie with literal, `:param`,
//! `:param(<regex>)` and `*` segments, middleware attached to any node of the
//! tree, and a dispatcher that layers global middleware around route
//! middleware around the handler.
//!
//! This is the meta-crate that re-exports the sub-crates. Depend on the
//! individual crates for finer-grained control.
//!
//! # Examples
//!
//! ```
//! use waypoint::prelude::*;
//!
//! let mut server = HttpServer::new(Settings::default())
//!     .with_middleware([Recovery::default().build()]);
//! server
//!     .get("/user/:id(^[0-9]+$)", |ctx| {
//!         let id = ctx.path_value("id").and_then(|v| v.as_i64()).unwrap_or_default();
//!         ctx.respond(StatusCode::OK, format!("user {id}"));
//!     })
//!     .unwrap();
//!
//! let request = waypoint::http::Request::get("/user/7").body(Vec::new()).unwrap();
//! let response = server.handle(request);
//! assert_eq!(response.body(), b"user 7");
//! ```

/// Error types, settings, settings loading and logging setup.
pub use waypoint_core as core;

/// Request context, handler types and the route tree.
pub use waypoint_http as routing;

/// The dispatcher and built-in middleware.
#[cfg(feature = "views")]
pub use waypoint_views as views;

/// Request factory and in-process test client.
#[cfg(feature = "testing")]
pub use waypoint_test as test;

pub use http;
pub use serde;
pub use serde_json;
pub use tracing;
pub use tracing_subscriber;

/// The types most applications need.
pub mod prelude {
    pub use http::{Method, StatusCode};
    pub use waypoint_core::{Settings, WaypointError, WaypointResult};
    pub use waypoint_http::{Context, HandleFunc, Middleware, Router, StringValue};

    #[cfg(feature = "views")]
    pub use waypoint_views::middleware::builtin::{AccessLog, ErrorPages, Recovery};
    #[cfg(feature = "views")]
    pub use waypoint_views::middleware::{from_fn, handler, middleware};
    #[cfg(feature = "views")]
    pub use waypoint_views::HttpServer;
}

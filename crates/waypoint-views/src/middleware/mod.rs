//! Middleware helpers for waypoint.
//!
//! A waypoint middleware is a plain function from the next stage to a new stage
//! (see [`Middleware`]). That shape is the most flexible but also the most
//! verbose to write, so this module offers [`from_fn`] for the common "around"
//! case, where the middleware receives the context and a `next` callback.
//!
//! ## Execution order
//!
//! Middleware runs in the order it was added on the way in and in reverse
//! order on the way out. Global middleware (added with
//! [`HttpServer::use_middleware`](crate::server::HttpServer::use_middleware))
//! always wraps route middleware, and route middleware on a shallower node
//! wraps route middleware on a deeper one.

pub mod builtin;

use std::sync::Arc;

pub use waypoint_http::handler::{handler, middleware};
pub use waypoint_http::{HandleFunc, Middleware};

use waypoint_http::Context;

/// Builds a middleware from a closure that receives the context and the next
/// stage.
///
/// The closure decides whether, when and how often to call `next`.
///
/// # Examples
///
/// ```
/// use waypoint_views::middleware::from_fn;
///
/// let timing = from_fn(|ctx, next| {
///     let start = std::time::Instant::now();
///     next(ctx);
///     tracing::debug!(elapsed = ?start.elapsed(), "request finished");
/// });
/// ```
pub fn from_fn<F>(f: F) -> Middleware
where
    F: Fn(&mut Context, &HandleFunc) + Send + Sync + 'static,
{
    let f = Arc::new(f);
    middleware(move |next| {
        let f = Arc::clone(&f);
        handler(move |ctx| f(ctx, &next))
    })
}

//! Handler and middleware function types.
//!
//! A [`HandleFunc`] is the innermost unit of work for a request: it receives the
//! mutable [`Context`] and records its response on it. A [`Middleware`] takes the
//! next stage and returns a new stage wrapping it, so it can run code before and
//! after the inner stage, skip it, or call it several times.
//!
//! Both are `Arc`-wrapped trait objects: one configured instance serves every
//! concurrent request, so they must be `Send + Sync`.

use std::sync::Arc;

use crate::context::Context;

/// The type for route handlers and composed middleware chains.
pub type HandleFunc = Arc<dyn Fn(&mut Context) + Send + Sync>;

/// The type for middleware: a function from the next stage to a wrapping stage.
pub type Middleware = Arc<dyn Fn(HandleFunc) -> HandleFunc + Send + Sync>;

/// Wraps a closure as a [`HandleFunc`].
///
/// Saves spelling out the `Arc` and the `&mut Context` parameter type at call sites.
///
/// # Examples
///
/// ```
/// use waypoint_http::handler::handler;
///
/// let hello = handler(|ctx| ctx.respond(http::StatusCode::OK, "hello"));
/// ```
pub fn handler<F>(f: F) -> HandleFunc
where
    F: Fn(&mut Context) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wraps a closure as a [`Middleware`].
pub fn middleware<F>(f: F) -> Middleware
where
    F: Fn(HandleFunc) -> HandleFunc + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Folds `middlewares` around `inner`.
///
/// The first middleware in the slice ends up outermost and `inner` innermost,
/// so calling the result runs the middleware in slice order on the way in and
/// in reverse order on the way out.
pub fn compose(middlewares: &[Middleware], inner: HandleFunc) -> HandleFunc {
    middlewares
        .iter()
        .rev()
        .fold(inner, |next, middleware| middleware(next))
}

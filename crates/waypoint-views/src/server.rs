//! The request dispatcher.
//!
//! [`HttpServer`] owns the route tree and the global middleware. It does not
//! listen on a socket: a transport (or the test client) hands it an
//! [`http::Request`] and receives the finished [`http::Response`].
//!
//! For every request the server
//!
//! 1. runs the global middleware, outermost first,
//! 2. routes inside the innermost global stage, answering 404 when no route
//!    with a handler matches,
//! 3. wraps the handler in the route middleware resolved for the request,
//! 4. converts the context into the response once everything has returned.
//!
//! # Examples
//!
//! ```
//! use waypoint_core::Settings;
//! use waypoint_views::server::HttpServer;
//!
//! let mut server = HttpServer::new(Settings::default());
//! server
//!     .get("/hello/:name", |ctx| {
//!         let name = ctx.path_value("name").map(|v| v.into_inner()).unwrap_or_default();
//!         ctx.respond(http::StatusCode::OK, format!("Hello, {name}!"));
//!     })
//!     .unwrap();
//!
//! let request = http::Request::get("/hello/world").body(Vec::new()).unwrap();
//! let response = server.handle(request);
//! assert_eq!(response.body(), b"Hello, world!");
//! ```

use std::fmt;
use std::sync::{Arc, OnceLock};

use http::{Method, StatusCode};
use tracing::{debug, warn};
use waypoint_core::{Settings, WaypointResult};
use waypoint_http::handler::handler;
use waypoint_http::{compose, Context, HandleFunc, Middleware, Router};

/// An in-process HTTP dispatcher.
pub struct HttpServer {
    router: Arc<Router>,
    middlewares: Vec<Middleware>,
    settings: Arc<Settings>,
    chain: OnceLock<HandleFunc>,
}

impl HttpServer {
    /// Creates a server with no routes and no middleware.
    pub fn new(settings: Settings) -> Self {
        Self {
            router: Arc::new(Router::new()),
            middlewares: Vec::new(),
            settings: Arc::new(settings),
            chain: OnceLock::new(),
        }
    }

    /// Appends global middleware, builder style.
    #[must_use]
    pub fn with_middleware(mut self, middlewares: impl IntoIterator<Item = Middleware>) -> Self {
        self.use_middleware(middlewares);
        self
    }

    /// Appends global middleware. It wraps every request, routed or not.
    pub fn use_middleware(&mut self, middlewares: impl IntoIterator<Item = Middleware>) {
        self.chain.take();
        self.middlewares.extend(middlewares);
    }

    /// Attaches middleware to the route node that serves `method` and `path`.
    ///
    /// The target is resolved as [`Router::add_middleware`] does, so a concrete
    /// request path such as `/user/42` reaches `/user/:id`.
    ///
    /// # Errors
    ///
    /// Returns [`WaypointError::MiddlewareTargetNotFound`](waypoint_core::WaypointError::MiddlewareTargetNotFound)
    /// if no registered node serves the path.
    pub fn use_route_middleware(
        &mut self,
        method: Method,
        path: &str,
        middlewares: impl IntoIterator<Item = Middleware>,
    ) -> WaypointResult<()> {
        self.router_mut().add_middleware(&method, path, middlewares)
    }

    /// Registers `f` for `method` and `path`.
    ///
    /// # Errors
    ///
    /// Returns the registration errors of [`Router::add_route`].
    pub fn route<F>(&mut self, method: Method, path: &str, f: F) -> WaypointResult<()>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.router_mut().add_route(method, path, handler(f))
    }

    /// Registers a handler that is already a [`HandleFunc`].
    ///
    /// # Errors
    ///
    /// Returns the registration errors of [`Router::add_route`].
    pub fn route_handler(
        &mut self,
        method: Method,
        path: &str,
        handle: HandleFunc,
    ) -> WaypointResult<()> {
        self.router_mut().add_route(method, path, handle)
    }

    /// Registers a `GET` route.
    pub fn get<F>(&mut self, path: &str, f: F) -> WaypointResult<()>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.route(Method::GET, path, f)
    }

    /// Registers a `POST` route.
    pub fn post<F>(&mut self, path: &str, f: F) -> WaypointResult<()>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.route(Method::POST, path, f)
    }

    /// Registers a `PUT` route.
    pub fn put<F>(&mut self, path: &str, f: F) -> WaypointResult<()>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.route(Method::PUT, path, f)
    }

    /// Registers a `PATCH` route.
    pub fn patch<F>(&mut self, path: &str, f: F) -> WaypointResult<()>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.route(Method::PATCH, path, f)
    }

    /// Registers a `DELETE` route.
    pub fn delete<F>(&mut self, path: &str, f: F) -> WaypointResult<()>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.route(Method::DELETE, path, f)
    }

    /// Registers an `OPTIONS` route.
    pub fn options<F>(&mut self, path: &str, f: F) -> WaypointResult<()>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.route(Method::OPTIONS, path, f)
    }

    /// Registers a `HEAD` route.
    pub fn head<F>(&mut self, path: &str, f: F) -> WaypointResult<()>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.route(Method::HEAD, path, f)
    }

    /// Registers a `TRACE` route.
    pub fn trace<F>(&mut self, path: &str, f: F) -> WaypointResult<()>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.route(Method::TRACE, path, f)
    }

    /// Registers a `CONNECT` route.
    pub fn connect<F>(&mut self, path: &str, f: F) -> WaypointResult<()>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.route(Method::CONNECT, path, f)
    }

    /// Returns the route tree.
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Returns the server settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Returns the number of global middleware.
    pub fn middleware_count(&self) -> usize {
        self.middlewares.len()
    }

    /// Checks whether `pattern`, registered alone as a `GET` route, would match
    /// `path`. This server's own routes are not consulted.
    ///
    /// A malformed pattern never matches. A path that only reaches an
    /// intermediate node of the pattern counts as a match, so `/a/b/*` matches
    /// `/a/b`.
    pub fn match_route(&self, pattern: &str, path: &str) -> bool {
        let mut router = Router::new();
        if router
            .add_route(Method::GET, pattern, handler(|_| {}))
            .is_err()
        {
            return false;
        }
        router.find_route(&Method::GET, path).is_some()
    }

    /// Dispatches one request and returns the response.
    ///
    /// The global chain is composed on the first request and reused until the
    /// next registration.
    pub fn handle(&self, request: http::Request<Vec<u8>>) -> http::Response<Vec<u8>> {
        let mut ctx = Context::from_request(request).with_max_body_bytes(self.settings.max_body_bytes);

        let chain = self.chain.get_or_init(|| {
            let routing = routing_stage(Arc::clone(&self.router), Arc::clone(&self.settings));
            compose(&self.middlewares, routing)
        });
        chain(&mut ctx);

        flush(ctx)
    }

    fn router_mut(&mut self) -> &mut Router {
        // The cached chain holds the only other clone of the Arc. Dropping it
        // first keeps `make_mut` from copying the tree.
        self.chain.take();
        Arc::make_mut(&mut self.router)
    }
}

/// The innermost global stage: match the route and run its chain.
fn routing_stage(router: Arc<Router>, settings: Arc<Settings>) -> HandleFunc {
    handler(move |ctx| {
        let Some(matched) = router.find_route(ctx.method(), ctx.path()) else {
            not_found(ctx, &settings);
            return;
        };
        let Some(route_handler) = matched.node.handler() else {
            not_found(ctx, &settings);
            return;
        };

        let chain = compose(&matched.middlewares, Arc::clone(route_handler));
        let route = matched.node.full_path().to_string();
        ctx.set_params(matched.params);
        ctx.set_matched_route(route);
        chain(ctx);
    })
}

fn not_found(ctx: &mut Context, settings: &Settings) {
    warn!(method = %ctx.method(), path = %ctx.path(), "no route matched");
    ctx.respond(StatusCode::NOT_FOUND, settings.not_found_body.clone());
}

fn flush(ctx: Context) -> http::Response<Vec<u8>> {
    let response = ctx.into_response();
    debug!(
        status = response.status().as_u16(),
        bytes = response.body().len(),
        "response flushed"
    );
    response
}

impl fmt::Debug for HttpServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpServer")
            .field("router", &self.router)
            .field("middleware_count", &self.middlewares.len())
            .field("debug", &self.settings.debug)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::from_fn;

    fn get(server: &HttpServer, uri: &str) -> http::Response<Vec<u8>> {
        server.handle(http::Request::get(uri).body(Vec::new()).unwrap())
    }

    #[test]
    fn test_server_new() {
        let server = HttpServer::new(Settings::default());
        assert_eq!(server.middleware_count(), 0);
        assert!(server.settings().debug);
        assert!(server.router().root(&Method::GET).is_none());
    }

    #[test]
    fn test_with_middleware_chains() {
        let server = HttpServer::new(Settings::default())
            .with_middleware([from_fn(|ctx, next| next(ctx))])
            .with_middleware([from_fn(|ctx, next| next(ctx))]);
        assert_eq!(server.middleware_count(), 2);
    }

    #[test]
    fn test_method_shortcuts_register_under_their_method() {
        let mut server = HttpServer::new(Settings::default());
        server.get("/r", |_| {}).unwrap();
        server.post("/r", |_| {}).unwrap();
        server.put("/r", |_| {}).unwrap();
        server.patch("/r", |_| {}).unwrap();
        server.delete("/r", |_| {}).unwrap();
        server.options("/r", |_| {}).unwrap();
        server.head("/r", |_| {}).unwrap();
        server.trace("/r", |_| {}).unwrap();
        server.connect("/r", |_| {}).unwrap();

        for method in [
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
            Method::HEAD,
            Method::TRACE,
            Method::CONNECT,
        ] {
            let matched = server.router().find_route(&method, "/r").unwrap();
            assert!(matched.has_handler(), "{method}");
        }
    }

    #[test]
    fn test_handle_sets_params_and_route() {
        let mut server = HttpServer::new(Settings::default());
        server
            .get("/user/:id(^[0-9]+$)", |ctx| {
                let body = format!(
                    "{} {}",
                    ctx.matched_route(),
                    ctx.path_value("id").unwrap()
                );
                ctx.respond(StatusCode::OK, body);
            })
            .unwrap();

        let resp = get(&server, "/user/42");
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.body(), b"/user/:id(^[0-9]+$) 42");
    }

    #[test]
    fn test_not_found_uses_settings_body() {
        let settings = Settings {
            not_found_body: "nothing here".to_string(),
            ..Settings::default()
        };
        let mut server = HttpServer::new(settings);
        server.get("/a/b", |_| {}).unwrap();

        for uri in ["/missing", "/a"] {
            let resp = get(&server, uri);
            assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");
            assert_eq!(resp.body(), b"nothing here");
        }
    }

    #[test]
    fn test_registration_after_handle() {
        let mut server = HttpServer::new(Settings::default());
        server.get("/one", |ctx| ctx.set_body("1")).unwrap();
        assert_eq!(get(&server, "/one").body(), b"1");

        server.get("/two", |ctx| ctx.set_body("2")).unwrap();
        assert_eq!(get(&server, "/two").body(), b"2");
    }

    #[test]
    fn test_match_route() {
        let server = HttpServer::new(Settings::default());
        assert!(server.match_route("/a/b/*", "/a/b"));
        assert!(server.match_route("/a/b/*", "/a/b/c/d/e"));
        assert!(server.match_route("/a/*/b", "/a/x/b"));
        assert!(!server.match_route("/a/*/b", "/a/x/y/b"));
        assert!(server.match_route("/user/:id(^[0-9]+$)", "/user/123"));
        assert!(!server.match_route("/user/:id(^[0-9]+$)", "/user/abc"));
        assert!(!server.match_route("bad", "/bad"));
    }

    #[test]
    fn test_global_chain_built_once_and_rebuilt_after_registration() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        use waypoint_http::handler::middleware;

        let built = Arc::new(AtomicUsize::new(0));
        let built_in = Arc::clone(&built);
        let mut server = HttpServer::new(Settings::default()).with_middleware([middleware(
            move |next| {
                built_in.fetch_add(1, Ordering::SeqCst);
                next
            },
        )]);
        server.get("/a", |ctx| ctx.set_body("a")).unwrap();

        for _ in 0..3 {
            assert_eq!(get(&server, "/a").body(), b"a");
        }
        assert_eq!(built.load(Ordering::SeqCst), 1);

        server.get("/b", |ctx| ctx.set_body("b")).unwrap();
        assert_eq!(get(&server, "/b").body(), b"b");
        assert_eq!(get(&server, "/a").body(), b"a");
        assert_eq!(built.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_use_route_middleware_unknown_route() {
        let mut server = HttpServer::new(Settings::default());
        server.get("/a", |_| {}).unwrap();
        let err = server
            .use_route_middleware(Method::GET, "/b", [from_fn(|ctx, next| next(ctx))])
            .unwrap_err();
        assert!(err.is_configuration_error());
    }
}

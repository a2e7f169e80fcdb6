//! The route registrar.
//!
//! [`Router`] owns one route tree per HTTP method. Routes and route-level
//! middleware are registered through `&mut self` methods before serving
//! starts; lookups take `&self` and never modify the tree.

use std::collections::HashMap;

use http::Method;
use tracing::{debug, error};
use waypoint_core::{WaypointError, WaypointResult};

use super::node::Node;
use super::segment::{parse_segment, validate_path, Segment};
use crate::handler::{HandleFunc, Middleware};

/// A set of per-method route trees.
///
/// # Examples
///
/// ```
/// use http::Method;
/// use waypoint_http::handler::handler;
/// use waypoint_http::Router;
///
/// let mut router = Router::new();
/// router.add_route(Method::GET, "/user/:id", handler(|_ctx| {})).unwrap();
///
/// let matched = router.find_route(&Method::GET, "/user/42").unwrap();
/// assert_eq!(matched.params["id"], "42");
/// assert!(router.find_route(&Method::POST, "/user/42").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Router {
    trees: HashMap<Method, Node>,
}

impl Router {
    /// Creates an empty router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the root node for `method`, if any route uses that method.
    pub fn root(&self, method: &Method) -> Option<&Node> {
        self.trees.get(method)
    }

    pub(crate) fn root_mut(&mut self, method: &Method) -> Option<&mut Node> {
        self.trees.get_mut(method)
    }

    /// Registers `handler` for `method` and `path`.
    ///
    /// # Errors
    ///
    /// - [`WaypointError::InvalidPath`] if the path is malformed.
    /// - [`WaypointError::RegexCompile`] if a parameter constraint does not compile.
    /// - [`WaypointError::RouteConflict`] if the path is already registered, or a
    ///   parameter or wildcard collides with the existing tree.
    pub fn add_route(
        &mut self,
        method: Method,
        path: &str,
        handler: HandleFunc,
    ) -> WaypointResult<()> {
        match self.insert(&method, path, handler) {
            Ok(full_path) => {
                debug!(%method, route = %full_path, "registered route");
                Ok(())
            }
            Err(e) => {
                error!(%method, path, error = %e, "failed to register route");
                Err(e)
            }
        }
    }

    fn insert(&mut self, method: &Method, path: &str, handler: HandleFunc) -> WaypointResult<String> {
        let segments = parse_path(path)?;
        let mut cur = self
            .trees
            .entry(method.clone())
            .or_insert_with(Node::root);
        for segment in segments {
            cur = cur.child_or_create(segment)?;
        }
        cur.bind(handler)?;
        Ok(cur.full_path().to_string())
    }

    /// Appends `middlewares` to the node that serves `method` and `path`.
    ///
    /// The target is located with the same walk as [`Router::find_route`], so a
    /// concrete request path such as `/user/42` reaches `/user/:id`, and any path
    /// below a terminal wildcard reaches the wildcard. The target may be any
    /// node on a registered path, not only one that ends in a handler.
    ///
    /// When the walk fails, `path` is read as a registered pattern instead:
    /// `/x/:id([0-9]+)` or `/x/:id` names the constrained parameter node even
    /// though neither literal satisfies the constraint.
    ///
    /// # Errors
    ///
    /// Returns [`WaypointError::MiddlewareTargetNotFound`] if neither lookup
    /// finds a node, or the path errors of [`Router::add_route`] if `path` is
    /// malformed.
    pub fn add_middleware(
        &mut self,
        method: &Method,
        path: &str,
        middlewares: impl IntoIterator<Item = Middleware>,
    ) -> WaypointResult<()> {
        let segments = parse_path(path)?;
        let not_found = || WaypointError::MiddlewareTargetNotFound {
            method: method.to_string(),
            path: path.to_string(),
        };

        let cur = match self.find_node_mut(method, path) {
            Some(node) => node,
            None => self
                .pattern_node_mut(method, &segments)
                .ok_or_else(not_found)?,
        };
        let before = cur.middlewares().len();
        cur.attach(middlewares);
        debug!(
            %method,
            route = %cur.full_path(),
            added = cur.middlewares().len() - before,
            "attached route middleware"
        );
        Ok(())
    }

    fn pattern_node_mut(&mut self, method: &Method, segments: &[Segment<'_>]) -> Option<&mut Node> {
        let mut cur = self.root_mut(method)?;
        for segment in segments {
            cur = cur.existing_child_mut(segment)?;
        }
        Some(cur)
    }
}

/// Validates `path` and parses its segments. The root path has none.
fn parse_path(path: &str) -> WaypointResult<Vec<Segment<'_>>> {
    validate_path(path)?;
    if path == "/" {
        return Ok(Vec::new());
    }
    path[1..]
        .split('/')
        .map(|segment| parse_segment(segment, path))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{handler, middleware};

    fn noop() -> HandleFunc {
        handler(|_| {})
    }

    fn noop_middleware() -> Middleware {
        middleware(|next| next)
    }

    #[test]
    fn test_add_route_builds_tree() {
        let mut router = Router::new();
        router.add_route(Method::GET, "/user/home", noop()).unwrap();
        router.add_route(Method::GET, "/user/:id", noop()).unwrap();
        router.add_route(Method::POST, "/", noop()).unwrap();

        let root = router.root(&Method::GET).unwrap();
        let user = root.literal_child("user").unwrap();
        assert!(user.handler().is_none());
        assert!(user.literal_child("home").unwrap().handler().is_some());
        assert_eq!(user.param_child().unwrap().full_path(), "/user/:id");

        assert!(router.root(&Method::POST).unwrap().handler().is_some());
        assert!(router.root(&Method::PUT).is_none());
    }

    #[test]
    fn test_duplicate_route_conflicts() {
        let mut router = Router::new();
        router.add_route(Method::GET, "/a/b", noop()).unwrap();
        let err = router.add_route(Method::GET, "/a/b", noop()).unwrap_err();
        assert!(matches!(err, WaypointError::RouteConflict(_)));
        assert!(err.is_configuration_error());

        router.add_route(Method::GET, "/", noop()).unwrap();
        assert!(router.add_route(Method::GET, "/", noop()).is_err());

        // The same path under another method is a different route.
        assert!(router.add_route(Method::POST, "/a/b", noop()).is_ok());
    }

    #[test]
    fn test_param_name_conflict() {
        let mut router = Router::new();
        router.add_route(Method::GET, "/user/:id", noop()).unwrap();
        assert!(router.add_route(Method::GET, "/user/:id/detail", noop()).is_ok());
        assert!(matches!(
            router.add_route(Method::GET, "/user/:name/x", noop()),
            Err(WaypointError::RouteConflict(_))
        ));
    }

    #[test]
    fn test_param_wildcard_conflict_either_order() {
        let mut router = Router::new();
        router.add_route(Method::GET, "/a/:id", noop()).unwrap();
        assert!(router.add_route(Method::GET, "/a/*", noop()).is_err());

        let mut router = Router::new();
        router.add_route(Method::GET, "/a/*", noop()).unwrap();
        assert!(router.add_route(Method::GET, "/a/:id", noop()).is_err());
    }

    #[test]
    fn test_invalid_paths() {
        let mut router = Router::new();
        for path in ["", "a", "/a/", "/a//b"] {
            assert!(
                matches!(
                    router.add_route(Method::GET, path, noop()),
                    Err(WaypointError::InvalidPath { .. })
                ),
                "{path}"
            );
        }
        assert!(matches!(
            router.add_route(Method::GET, "/u/:id([0-9+)", noop()),
            Err(WaypointError::RegexCompile { .. })
        ));
        assert!(router.root(&Method::GET).is_none());
    }

    #[test]
    fn test_add_middleware_targets() {
        let mut router = Router::new();
        router.add_route(Method::GET, "/a/b/c", noop()).unwrap();
        router.add_route(Method::GET, "/x/:id([0-9]+)", noop()).unwrap();

        router
            .add_middleware(&Method::GET, "/", [noop_middleware()])
            .unwrap();
        // Intermediate nodes without a handler are valid targets.
        router
            .add_middleware(&Method::GET, "/a/b", [noop_middleware(), noop_middleware()])
            .unwrap();
        router
            .add_middleware(&Method::GET, "/x/:id", [noop_middleware()])
            .unwrap();
        router
            .add_middleware(&Method::GET, "/x/:id([0-9]+)", [noop_middleware()])
            .unwrap();

        let root = router.root(&Method::GET).unwrap();
        assert_eq!(root.middlewares().len(), 1);
        let ab = root.literal_child("a").unwrap().literal_child("b").unwrap();
        assert_eq!(ab.middlewares().len(), 2);
        let id = root.literal_child("x").unwrap().param_child().unwrap();
        assert_eq!(id.middlewares().len(), 2);
    }

    #[test]
    fn test_add_middleware_through_request_paths() {
        let mut router = Router::new();
        router.add_route(Method::GET, "/user/:id", noop()).unwrap();
        router.add_route(Method::GET, "/static/*", noop()).unwrap();

        router
            .add_middleware(&Method::GET, "/user/42", [noop_middleware()])
            .unwrap();
        router
            .add_middleware(&Method::GET, "/static/css/app.css", [noop_middleware()])
            .unwrap();
        // Any name reaches the parameter node, as a request would.
        router
            .add_middleware(&Method::GET, "/user/:name", [noop_middleware()])
            .unwrap();

        let root = router.root(&Method::GET).unwrap();
        let id = root.literal_child("user").unwrap().param_child().unwrap();
        assert_eq!(id.middlewares().len(), 2);
        let wildcard = root.literal_child("static").unwrap().wildcard_child().unwrap();
        assert_eq!(wildcard.middlewares().len(), 1);
    }

    #[test]
    fn test_add_middleware_missing_target() {
        let mut router = Router::new();
        router.add_route(Method::GET, "/a/:id", noop()).unwrap();
        router.add_route(Method::GET, "/n/:id([0-9]+)", noop()).unwrap();

        for (method, path) in [
            (Method::POST, "/a/:id"),
            (Method::GET, "/b"),
            (Method::GET, "/a/:id/c"),
            (Method::GET, "/a/1/c"),
            (Method::GET, "/n/abc"),
            (Method::GET, "/n/:id([a-z]+)"),
        ] {
            let err = router
                .add_middleware(&method, path, [noop_middleware()])
                .unwrap_err();
            assert!(
                matches!(err, WaypointError::MiddlewareTargetNotFound { .. }),
                "{method} {path}: {err}"
            );
        }
    }
}

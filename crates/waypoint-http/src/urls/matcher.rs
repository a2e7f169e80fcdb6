//! Request path matching.
//!
//! The matcher walks the method tree one request segment at a time, always
//! preferring a literal child over the parameter child and the parameter child
//! over the wildcard. There is no backtracking: once a level picks a child, a
//! failure further down fails the whole lookup.

use std::collections::HashMap;
use std::fmt;

use http::Method;

use super::node::Node;
use super::resolver::matched_middlewares;
use super::router::Router;
use crate::handler::Middleware;

/// The outcome of a successful route lookup.
pub struct MatchInfo<'r> {
    /// The matched node. Its handler may be absent if the path only reaches an
    /// intermediate node.
    pub node: &'r Node,
    /// Captured path parameters. A name captured at several depths keeps the
    /// deepest value.
    pub params: HashMap<String, String>,
    /// Route middleware to wrap the handler with, outermost first.
    pub middlewares: Vec<Middleware>,
}

impl MatchInfo<'_> {
    /// Returns `true` if the matched node has a handler.
    pub const fn has_handler(&self) -> bool {
        self.node.handler().is_some()
    }
}

impl fmt::Debug for MatchInfo<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatchInfo")
            .field("route", &self.node.full_path())
            .field("has_handler", &self.has_handler())
            .field("params", &self.params)
            .field("middlewares", &self.middlewares.len())
            .finish()
    }
}

/// How the matcher advanced one level.
enum Step<'r> {
    Literal(&'r Node),
    Param(&'r Node),
    Wildcard(&'r Node),
}

impl<'r> Step<'r> {
    fn pick(node: &'r Node, segment: &str) -> Option<Self> {
        if let Some(child) = node.literal_child(segment) {
            return Some(Self::Literal(child));
        }
        if let Some(child) = node.param_child() {
            return Some(Self::Param(child));
        }
        node.wildcard_child().map(Self::Wildcard)
    }
}

impl Router {
    /// Finds the route for `method` and the request `path`.
    ///
    /// Returns `None` if no node matches. A returned [`MatchInfo`] may still
    /// lack a handler; callers treat that as not found too.
    pub fn find_route(&self, method: &Method, path: &str) -> Option<MatchInfo<'_>> {
        let root = self.root(method)?;
        if path == "/" {
            return Some(MatchInfo {
                node: root,
                params: HashMap::new(),
                middlewares: root.middlewares().to_vec(),
            });
        }

        let segments = request_segments(path);
        let (node, params) = walk(root, &segments, |_| {})?;
        Some(MatchInfo {
            node,
            params,
            middlewares: matched_middlewares(root, &segments),
        })
    }

    /// Finds the node the request `path` would be served by, for mutation.
    ///
    /// Performs the same walk as [`Router::find_route`], discarding captured
    /// parameters and skipping middleware collection. An intermediate node is
    /// returned like any other.
    pub(crate) fn find_node_mut(&mut self, method: &Method, path: &str) -> Option<&mut Node> {
        let segments = request_segments(path);
        let mut hops = Vec::with_capacity(segments.len());
        walk(self.root(method)?, &segments, |hop| hops.push(hop))?;

        let mut cur = self.root_mut(method)?;
        for hop in hops {
            cur = match hop {
                Hop::Literal(segment) => cur.literal_child_mut(segment)?,
                Hop::Special => cur.special_child_mut()?,
            };
        }
        Some(cur)
    }
}

/// One level the matcher descended, replayable against a mutable tree.
enum Hop<'s> {
    Literal(&'s str),
    Special,
}

fn walk<'r, 's>(
    root: &'r Node,
    segments: &[&'s str],
    mut on_hop: impl FnMut(Hop<'s>),
) -> Option<(&'r Node, HashMap<String, String>)> {
    let mut params = HashMap::new();
    let mut cur = root;
    for &segment in segments {
        cur = match Step::pick(cur, segment)? {
            Step::Literal(child) => {
                on_hop(Hop::Literal(segment));
                child
            }
            Step::Param(child) => {
                if let Some(re) = child.regex() {
                    if !re.is_match(segment) {
                        return None;
                    }
                }
                if let Some(name) = child.param_name() {
                    params.insert(name.to_string(), segment.to_string());
                }
                on_hop(Hop::Special);
                child
            }
            Step::Wildcard(child) => {
                on_hop(Hop::Special);
                if child.is_terminal_wildcard() {
                    return Some((child, params));
                }
                child
            }
        };
    }
    Some((cur, params))
}

fn request_segments(path: &str) -> Vec<&str> {
    if path == "/" {
        return Vec::new();
    }
    path.trim_matches('/').split('/').collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{handler, HandleFunc};

    fn noop() -> HandleFunc {
        handler(|_| {})
    }

    fn router(routes: &[(Method, &str)]) -> Router {
        let mut router = Router::new();
        for (method, path) in routes {
            router.add_route(method.clone(), path, noop()).unwrap();
        }
        router
    }

    fn matched_route(router: &Router, method: &Method, path: &str) -> Option<String> {
        router
            .find_route(method, path)
            .filter(MatchInfo::has_handler)
            .map(|m| m.node.full_path().to_string())
    }

    #[test]
    fn test_registered_routes_found() {
        let routes = [
            (Method::GET, "/"),
            (Method::GET, "/user"),
            (Method::GET, "/user/home"),
            (Method::GET, "/order/detail"),
            (Method::POST, "/order/create"),
            (Method::POST, "/login"),
            (Method::GET, "/index/*"),
            (Method::DELETE, "/"),
        ];
        let r = router(&routes);
        for (method, path) in &routes {
            assert_eq!(
                matched_route(&r, method, path).as_deref(),
                Some(*path),
                "{method} {path}"
            );
        }
    }

    #[test]
    fn test_missing_routes() {
        let r = router(&[
            (Method::GET, "/user/home"),
            (Method::GET, "/order/detail"),
        ]);
        // Unknown method.
        assert!(r.find_route(&Method::OPTIONS, "/user/home").is_none());
        // Unknown path.
        assert!(r.find_route(&Method::GET, "/nope").is_none());
        assert!(r.find_route(&Method::GET, "/user/home/extra").is_none());
        // Intermediate node: found structurally, but no handler.
        let m = r.find_route(&Method::GET, "/order").unwrap();
        assert!(!m.has_handler());
        assert_eq!(m.node.full_path(), "/order");
        // The root of a method that has no root route.
        assert!(!r.find_route(&Method::GET, "/").unwrap().has_handler());
    }

    #[test]
    fn test_trailing_slash_in_request_is_trimmed() {
        let r = router(&[(Method::GET, "/user/home")]);
        assert_eq!(
            matched_route(&r, &Method::GET, "/user/home/").as_deref(),
            Some("/user/home")
        );
    }

    #[test]
    fn test_literal_preferred_over_param() {
        let r = router(&[(Method::GET, "/user/home"), (Method::GET, "/user/:id")]);
        assert_eq!(
            matched_route(&r, &Method::GET, "/user/home").as_deref(),
            Some("/user/home")
        );
        let m = r.find_route(&Method::GET, "/user/123").unwrap();
        assert_eq!(m.node.full_path(), "/user/:id");
        assert_eq!(m.params["id"], "123");
    }

    #[test]
    fn test_no_backtracking() {
        // "/user/home/x" picks the literal "home" and fails there, even though
        // "/user/:id/x" would match.
        let r = router(&[
            (Method::GET, "/user/home"),
            (Method::GET, "/user/:id/x"),
        ]);
        assert!(r.find_route(&Method::GET, "/user/home/x").is_none());
        assert!(r.find_route(&Method::GET, "/user/7/x").is_some());
    }

    #[test]
    fn test_terminal_wildcard_consumes_rest() {
        let r = router(&[(Method::GET, "/a/b/*")]);
        for path in ["/a/b/c", "/a/b/c/d/e"] {
            assert_eq!(
                matched_route(&r, &Method::GET, path).as_deref(),
                Some("/a/b/*"),
                "{path}"
            );
        }
        // "/a/b" reaches the intermediate node, which has no handler of its own.
        assert!(!r.find_route(&Method::GET, "/a/b").unwrap().has_handler());
    }

    #[test]
    fn test_trailing_wildcard_matches_parent_when_bound() {
        let r = router(&[(Method::GET, "/a/b"), (Method::GET, "/a/b/*")]);
        assert_eq!(
            matched_route(&r, &Method::GET, "/a/b").as_deref(),
            Some("/a/b")
        );
        assert_eq!(
            matched_route(&r, &Method::GET, "/a/b/c/d").as_deref(),
            Some("/a/b/*")
        );
    }

    #[test]
    fn test_inner_wildcard_consumes_one_segment() {
        let r = router(&[(Method::GET, "/a/*/b")]);
        assert_eq!(
            matched_route(&r, &Method::GET, "/a/x/b").as_deref(),
            Some("/a/*/b")
        );
        assert!(r.find_route(&Method::GET, "/a/x/y/b").is_none());
    }

    #[test]
    fn test_regex_constraint() {
        let r = router(&[(Method::GET, "/user/:id(^[0-9]+$)")]);
        let m = r.find_route(&Method::GET, "/user/123").unwrap();
        assert_eq!(m.params["id"], "123");
        assert_eq!(m.node.full_path(), "/user/:id(^[0-9]+$)");
        assert!(r.find_route(&Method::GET, "/user/abc").is_none());
    }

    #[test]
    fn test_regex_failure_does_not_fall_back_to_wildcard() {
        let r = router(&[(Method::GET, "/n/:id([0-9]+)/x")]);
        assert!(r.find_route(&Method::GET, "/n/abc/x").is_none());
    }

    #[test]
    fn test_repeated_param_name_keeps_deepest() {
        let r = router(&[(Method::GET, "/a/:id/b/:id")]);
        let m = r.find_route(&Method::GET, "/a/1/b/2").unwrap();
        assert_eq!(m.params.len(), 1);
        assert_eq!(m.params["id"], "2");
    }

    #[test]
    fn test_multiple_params() {
        let r = router(&[(Method::GET, "/post/:year/:slug")]);
        let m = r.find_route(&Method::GET, "/post/2024/hello-world").unwrap();
        assert_eq!(m.params["year"], "2024");
        assert_eq!(m.params["slug"], "hello-world");
    }

    #[test]
    fn test_lookup_is_deterministic() {
        let r = router(&[
            (Method::GET, "/a/:id/c"),
            (Method::GET, "/a/b/c"),
            (Method::GET, "/*/b"),
        ]);
        let first = format!("{:?}", r.find_route(&Method::GET, "/a/x/c"));
        for _ in 0..10 {
            assert_eq!(format!("{:?}", r.find_route(&Method::GET, "/a/x/c")), first);
        }
    }
}

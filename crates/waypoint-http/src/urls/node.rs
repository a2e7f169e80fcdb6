//! The route tree node.
//!
//! Every registered path is stored as a chain of [`Node`]s, one per segment,
//! hanging off a per-method root. A node owns its literal children by segment
//! text and at most one special child, which is either a parameter or a
//! wildcard, never both.

use std::collections::HashMap;
use std::fmt;

use regex::Regex;
use waypoint_core::{WaypointError, WaypointResult};

use super::segment::Segment;
use crate::handler::{HandleFunc, Middleware};

/// The single non-literal child a node may have.
#[derive(Clone)]
pub enum SpecialChild {
    /// A `:name` or `:name(<regex>)` child.
    Param(Box<Node>),
    /// A `*` child.
    Wildcard(Box<Node>),
}

impl SpecialChild {
    /// Returns the child node regardless of its kind.
    pub fn node(&self) -> &Node {
        match self {
            Self::Param(node) | Self::Wildcard(node) => node,
        }
    }

    fn node_mut(&mut self) -> &mut Node {
        match self {
            Self::Param(node) | Self::Wildcard(node) => node,
        }
    }
}

impl fmt::Debug for SpecialChild {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Param(node) => f.debug_tuple("Param").field(node).finish(),
            Self::Wildcard(node) => f.debug_tuple("Wildcard").field(node).finish(),
        }
    }
}

/// One segment of the route tree.
#[derive(Clone)]
pub struct Node {
    segment: String,
    full_path: String,
    handler: Option<HandleFunc>,
    children: HashMap<String, Node>,
    special: Option<SpecialChild>,
    regex: Option<Regex>,
    middlewares: Vec<Middleware>,
}

impl Node {
    /// Creates the root node of a method tree.
    pub(crate) fn root() -> Self {
        Self::new("/".to_string(), "/".to_string(), None)
    }

    fn new(segment: String, full_path: String, regex: Option<Regex>) -> Self {
        Self {
            segment,
            full_path,
            handler: None,
            children: HashMap::new(),
            special: None,
            regex,
            middlewares: Vec::new(),
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    /// The segment label, e.g. `users`, `:id`, `:id([0-9]+)` or `*`.
    pub fn segment(&self) -> &str {
        &self.segment
    }

    /// The path from the root to this node, e.g. `/user/:id`.
    pub fn full_path(&self) -> &str {
        &self.full_path
    }

    /// The handler bound to this node, if a route ends here.
    pub const fn handler(&self) -> Option<&HandleFunc> {
        self.handler.as_ref()
    }

    /// Middleware attached directly to this node, in attachment order.
    pub fn middlewares(&self) -> &[Middleware] {
        &self.middlewares
    }

    /// The compiled constraint of a parameter node.
    pub const fn regex(&self) -> Option<&Regex> {
        self.regex.as_ref()
    }

    /// The parameter name of a parameter node, without the leading `:`.
    pub fn param_name(&self) -> Option<&str> {
        let param = self.segment.strip_prefix(':')?;
        Some(param.split_once('(').map_or(param, |(name, _)| name))
    }

    /// The literal child for `segment`.
    pub fn literal_child(&self, segment: &str) -> Option<&Self> {
        self.children.get(segment)
    }

    /// The special child, if any.
    pub const fn special_child(&self) -> Option<&SpecialChild> {
        self.special.as_ref()
    }

    /// The parameter child, if the special child is a parameter.
    pub fn param_child(&self) -> Option<&Self> {
        match &self.special {
            Some(SpecialChild::Param(node)) => Some(&**node),
            _ => None,
        }
    }

    /// The wildcard child, if the special child is a wildcard.
    pub fn wildcard_child(&self) -> Option<&Self> {
        match &self.special {
            Some(SpecialChild::Wildcard(node)) => Some(&**node),
            _ => None,
        }
    }

    /// Returns `true` if the node has no children of any kind.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty() && self.special.is_none()
    }

    /// Returns `true` for a `*` node with a handler and no children, which
    /// consumes every remaining request segment.
    pub fn is_terminal_wildcard(&self) -> bool {
        self.segment == "*" && self.is_leaf() && self.handler.is_some()
    }

    // ── Registration ─────────────────────────────────────────────────

    /// Binds `handler` to this node.
    pub(crate) fn bind(&mut self, handler: HandleFunc) -> WaypointResult<()> {
        if self.handler.is_some() {
            return Err(conflict(format!(
                "'{}' is already registered",
                self.full_path
            )));
        }
        self.handler = Some(handler);
        Ok(())
    }

    /// Appends middleware to this node.
    pub(crate) fn attach(&mut self, middlewares: impl IntoIterator<Item = Middleware>) {
        self.middlewares.extend(middlewares);
    }

    /// Returns the child for `segment`, creating it if needed.
    pub(crate) fn child_or_create(&mut self, segment: Segment<'_>) -> WaypointResult<&mut Self> {
        let label = segment.label();
        let full_path = self.child_full_path(&label);
        match segment {
            Segment::Literal(text) => Ok(self
                .children
                .entry(text.to_string())
                .or_insert_with(|| Self::new(label, full_path, None))),
            Segment::Param { name, regex } => {
                match &self.special {
                    Some(SpecialChild::Wildcard(wildcard)) => {
                        return Err(conflict(format!(
                            "parameter '{full_path}' conflicts with wildcard '{}'",
                            wildcard.full_path
                        )));
                    }
                    Some(SpecialChild::Param(existing)) => {
                        existing.check_param_compatible(name, regex.as_ref(), &full_path)?;
                    }
                    None => {}
                }
                let special = self.special.get_or_insert_with(|| {
                    SpecialChild::Param(Box::new(Self::new(label, full_path, regex)))
                });
                Ok(special.node_mut())
            }
            Segment::Wildcard => {
                if let Some(SpecialChild::Param(param)) = &self.special {
                    return Err(conflict(format!(
                        "wildcard '{full_path}' conflicts with parameter '{}'",
                        param.full_path
                    )));
                }
                let special = self.special.get_or_insert_with(|| {
                    SpecialChild::Wildcard(Box::new(Self::new(label, full_path, None)))
                });
                Ok(special.node_mut())
            }
        }
    }

    /// Returns the existing child that `segment` names exactly, without creating
    /// anything. A parameter segment must carry the same name and, if it has a
    /// constraint, the same constraint source.
    pub(crate) fn existing_child_mut(&mut self, segment: &Segment<'_>) -> Option<&mut Self> {
        match segment {
            Segment::Literal(text) => self.children.get_mut(*text),
            Segment::Param { name, regex } => match self.special.as_mut()? {
                SpecialChild::Param(node) if node.param_matches(name, regex.as_ref()) => {
                    Some(&mut **node)
                }
                _ => None,
            },
            Segment::Wildcard => match self.special.as_mut()? {
                SpecialChild::Wildcard(node) => Some(&mut **node),
                SpecialChild::Param(_) => None,
            },
        }
    }

    pub(crate) fn literal_child_mut(&mut self, segment: &str) -> Option<&mut Self> {
        self.children.get_mut(segment)
    }

    pub(crate) fn special_child_mut(&mut self) -> Option<&mut Self> {
        self.special.as_mut().map(SpecialChild::node_mut)
    }

    /// A parameter segment without a constraint reuses the existing parameter
    /// of the same name. A constraint cannot be added to an unconstrained
    /// parameter later; only a repeat of the registered constraint matches.
    fn param_matches(&self, name: &str, regex: Option<&Regex>) -> bool {
        self.param_name() == Some(name)
            && regex.map_or(true, |new| {
                self.regex.as_ref().map(Regex::as_str) == Some(new.as_str())
            })
    }

    fn check_param_compatible(
        &self,
        name: &str,
        regex: Option<&Regex>,
        full_path: &str,
    ) -> WaypointResult<()> {
        if self.param_matches(name, regex) {
            return Ok(());
        }
        Err(conflict(format!(
            "parameter '{full_path}' conflicts with existing parameter '{}'",
            self.full_path
        )))
    }

    fn child_full_path(&self, label: &str) -> String {
        if self.full_path == "/" {
            format!("/{label}")
        } else {
            format!("{}/{label}", self.full_path)
        }
    }
}

const fn conflict(message: String) -> WaypointError {
    WaypointError::RouteConflict(message)
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut children: Vec<_> = self.children.keys().collect();
        children.sort();
        f.debug_struct("Node")
            .field("full_path", &self.full_path)
            .field("has_handler", &self.handler.is_some())
            .field("middlewares", &self.middlewares.len())
            .field("children", &children)
            .field("special", &self.special)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::handler;
    use crate::urls::segment::parse_segment;

    fn child<'n>(node: &'n mut Node, seg: &str) -> WaypointResult<&'n mut Node> {
        node.child_or_create(parse_segment(seg, "/test")?)
    }

    #[test]
    fn test_literal_child_reused() {
        let mut root = Node::root();
        child(&mut root, "users").unwrap();
        child(&mut root, "users").unwrap();
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.literal_child("users").unwrap().full_path(), "/users");
    }

    #[test]
    fn test_full_path_includes_regex() {
        let mut root = Node::root();
        let user = child(&mut root, "user").unwrap();
        let id = child(user, ":id(^[0-9]+$)").unwrap();
        assert_eq!(id.full_path(), "/user/:id(^[0-9]+$)");
        assert_eq!(id.param_name(), Some("id"));
        assert_eq!(id.regex().unwrap().as_str(), "^[0-9]+$");
    }

    #[test]
    fn test_param_and_wildcard_exclusive() {
        let mut root = Node::root();
        child(&mut root, ":id").unwrap();
        assert!(matches!(
            child(&mut root, "*"),
            Err(WaypointError::RouteConflict(_))
        ));

        let mut root = Node::root();
        child(&mut root, "*").unwrap();
        assert!(matches!(
            child(&mut root, ":id"),
            Err(WaypointError::RouteConflict(_))
        ));
        assert!(root.wildcard_child().is_some());
        assert!(root.param_child().is_none());
    }

    #[test]
    fn test_param_compatibility() {
        let mut root = Node::root();
        child(&mut root, ":id([0-9]+)").unwrap();
        // Same name, no constraint on the repeat: reuse.
        assert!(child(&mut root, ":id").is_ok());
        // Same name and constraint: reuse.
        assert!(child(&mut root, ":id([0-9]+)").is_ok());
        // Different constraint or name: conflict.
        assert!(child(&mut root, ":id([a-z]+)").is_err());
        assert!(child(&mut root, ":name").is_err());

        // A constraint cannot be added to an unconstrained parameter later.
        let mut root = Node::root();
        child(&mut root, ":id").unwrap();
        assert!(child(&mut root, ":id([0-9]+)").is_err());
    }

    #[test]
    fn test_bind_twice_conflicts() {
        let mut root = Node::root();
        root.bind(handler(|_| {})).unwrap();
        assert!(matches!(
            root.bind(handler(|_| {})),
            Err(WaypointError::RouteConflict(_))
        ));
    }

    #[test]
    fn test_terminal_wildcard() {
        let mut root = Node::root();
        let star = child(&mut root, "*").unwrap();
        assert!(!star.is_terminal_wildcard());
        star.bind(handler(|_| {})).unwrap();
        assert!(star.is_terminal_wildcard());
        child(star, "more").unwrap();
        assert!(!root.wildcard_child().unwrap().is_terminal_wildcard());
    }

    #[test]
    fn test_existing_child_is_exact() {
        let mut root = Node::root();
        child(&mut root, ":id([0-9]+)").unwrap();
        let by_name = parse_segment(":id", "/x").unwrap();
        let by_regex = parse_segment(":id([0-9]+)", "/x").unwrap();
        let other = parse_segment(":name", "/x").unwrap();
        assert!(root.existing_child_mut(&by_name).is_some());
        assert!(root.existing_child_mut(&by_regex).is_some());
        assert!(root.existing_child_mut(&other).is_none());
        assert!(root.existing_child_mut(&Segment::Wildcard).is_none());
        assert!(root.existing_child_mut(&Segment::Literal("123")).is_none());
    }
}

//! Route middleware resolution.
//!
//! Middleware attached to tree nodes is collected breadth-first, one level per
//! request segment. Every branch that could apply at a level contributes,
//! including sibling branches the matcher did not take, so middleware on
//! `/a/*` still wraps a request for `/a/b`. Within a level the wildcard child
//! comes first, then the parameter child, then the literal child, so coarser
//! middleware wraps finer middleware.

use super::node::Node;
use crate::handler::Middleware;

/// Collects the middleware that applies to a request for `segments`, outermost
/// first. The root's own middleware always leads.
pub fn matched_middlewares(root: &Node, segments: &[&str]) -> Vec<Middleware> {
    let mut resolved = root.middlewares().to_vec();
    let mut frontier = vec![root];

    for segment in segments {
        if frontier.is_empty() {
            break;
        }
        let mut next = Vec::new();
        for node in frontier {
            let children = [
                node.wildcard_child(),
                node.param_child(),
                node.literal_child(segment),
            ];
            for child in children.into_iter().flatten() {
                resolved.extend_from_slice(child.middlewares());
                next.push(child);
            }
        }
        frontier = next;
    }

    resolved
}

//! Route tree, registration, matching and middleware resolution.
//!
//! ## Path grammar
//!
//! | Segment            | Matches                                          |
//! |--------------------|--------------------------------------------------|
//! | `users`            | exactly `users`                                  |
//! | `:id`              | any one segment, captured as `id`                |
//! | `:id(^[0-9]+$)`    | one segment matching the regex, captured as `id` |
//! | `*`                | any one segment; every remaining segment when it is the last segment of a route |
//!
//! At each level a literal child wins over the parameter child, which wins over
//! the wildcard. A node may have a parameter child or a wildcard child but not
//! both.
//!
//! ## Modules
//!
//! - [`segment`] - Path validation and segment parsing
//! - [`node`] - The tree node
//! - [`router`] - Route and middleware registration
//! - [`matcher`] - Request path lookup
//! - [`resolver`] - Route middleware collection

pub mod matcher;
pub mod node;
pub mod resolver;
pub mod router;
pub mod segment;

pub use matcher::MatchInfo;
pub use node::{Node, SpecialChild};
pub use resolver::matched_middlewares;
pub use router::Router;

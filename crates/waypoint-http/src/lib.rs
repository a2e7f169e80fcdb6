//! # waypoint-http
//!
//! The routing core of waypoint: the per-request [`Context`], the handler and
//! middleware function types, and the [`urls`] module containing the route
//! tree, registrar, matcher and middleware resolver.

pub mod context;
pub mod handler;
pub mod querydict;
pub mod urls;

pub use context::{Context, StringValue};
pub use handler::{compose, HandleFunc, Middleware};
pub use querydict::QueryDict;
pub use urls::{MatchInfo, Node, Router, SpecialChild};

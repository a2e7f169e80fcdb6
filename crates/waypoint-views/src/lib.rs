//! # waypoint-views
//!
//! The serving side of waypoint: the [`HttpServer`](server::HttpServer)
//! dispatcher that drives requests through global middleware, the route tree
//! and route middleware, plus a set of built-in middleware.
//!
//! ## Modules
//!
//! - [`server`] - The dispatcher and route registration surface
//! - [`middleware`] - Middleware helpers and built-in middleware

pub mod middleware;
pub mod server;

pub use server::HttpServer;

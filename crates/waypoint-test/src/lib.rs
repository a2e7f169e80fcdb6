//! # waypoint-test
//!
//! Testing tools for waypoint. [`RequestFactory`] builds requests for driving
//! handlers or a server by hand; [`TestClient`] sends requests through an
//! [`HttpServer`](waypoint_views::HttpServer) in process and keeps a cookie jar
//! across requests.
//!
//! ## Modules
//!
//! - [`request_factory`] - Building `http::Request<Vec<u8>>` values
//! - [`client`] - The in-process test client and its response type

pub mod client;
pub mod request_factory;

pub use client::{TestClient, TestResponse};
pub use request_factory::RequestFactory;

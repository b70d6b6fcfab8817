//! Server module for building the grid backend's HTTP server
//!
//! `ServerBuilder` wires a product store into:
//! - the product grid routes (create, read, update, destroy, names)
//! - health check routes
//! - request tracing and optional CORS

pub mod builder;
pub mod router;

pub use builder::ServerBuilder;
pub use router::{build_product_routes, health_routes};

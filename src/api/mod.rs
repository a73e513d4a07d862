//! API routes module.

pub mod covered_calls;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod portfolios;
pub mod routes;
pub mod stocks;

pub use routes::create_router;

//! Campus Events Backend Library
//!
//! Exposes the router and its building blocks for the binary and the
//! integration tests.

pub mod auth;
pub mod config;
pub mod events;
pub mod extract;
pub mod middleware;
pub mod routes;

pub use config::AppConfig;
pub use routes::{build_router, AppState};

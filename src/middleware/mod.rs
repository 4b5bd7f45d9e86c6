//! HTTP middleware shared by every router
//!
//! - Request logging with latency
//! - Per-IP throttling on the credential endpoints

pub mod logging;
pub mod rate_limit;

pub use logging::request_logging;
pub use rate_limit::{rate_limit_middleware, RateLimitConfig, RateLimiter};

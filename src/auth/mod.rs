//! Authentication Module
//! Mission: Secure API access with hashed credentials, JWT tokens and role guards

pub mod api;
pub mod error;
pub mod guard;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod service;
pub mod user_store;

pub use api::AuthState;
pub use error::AuthError;
pub use guard::{require_role, role_guard, EVENT_MANAGERS};
pub use jwt::JwtHandler;
pub use middleware::auth_middleware;
pub use models::{Identity, Role};
pub use password::PasswordHasher;
pub use service::AuthService;
pub use user_store::{CredentialStore, MemoryUserStore, UserStore};

//! Runtime configuration
//! Mission: Read every tunable once at startup; a missing secret is fatal

use crate::{auth::jwt::DEFAULT_TTL_HOURS, middleware::RateLimitConfig};
use anyhow::{bail, Context, Result};
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database_path: String,
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
    pub bcrypt_cost: u32,
    pub auth_rate_limit: RateLimitConfig,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("database_path", &self.database_path)
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_hours", &self.token_ttl.num_hours())
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("auth_rate_limit", &self.auth_rate_limit.max_requests)
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key/value source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let jwt_secret = match get("JWT_SECRET") {
            Some(secret) => secret,
            None => bail!("JWT_SECRET must be set"),
        };

        let host: IpAddr = parse_or(&get, "HOST", IpAddr::from([0, 0, 0, 0]))?;
        let port: u16 = parse_or(&get, "PORT", 5000)?;

        let ttl_hours: i64 = parse_or(&get, "TOKEN_TTL_HOURS", DEFAULT_TTL_HOURS)?;
        if ttl_hours <= 0 {
            bail!("TOKEN_TTL_HOURS must be positive");
        }

        let max_requests: u32 = parse_or(&get, "AUTH_RATE_LIMIT_PER_MINUTE", 20)?;
        let burst: u32 = parse_or(&get, "AUTH_RATE_LIMIT_BURST", 5)?;

        Ok(Self {
            bind_addr: SocketAddr::new(host, port),
            database_path: get("DATABASE_PATH").unwrap_or_else(|| "./campus_events.db".to_string()),
            jwt_secret,
            token_ttl: chrono::Duration::hours(ttl_hours),
            bcrypt_cost: parse_or(&get, "BCRYPT_COST", 10)?,
            auth_rate_limit: RateLimitConfig {
                max_requests,
                window: Duration::from_secs(60),
                burst,
            },
        })
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Invalid {}: {:?}", key, raw)),
        None => Ok(default),
    }
}

//! JWT Token Handler
//! Mission: Issue and validate signed, time-bound identity tokens

use crate::auth::{
    error::AuthError,
    models::{Identity, Role},
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Shortest HS256 secret accepted at startup
pub const MIN_SECRET_BYTES: usize = 32;

/// Default token lifetime
pub const DEFAULT_TTL_HOURS: i64 = 24 * 7;

/// Source of "now" for issuing and expiring tokens
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually advanced clock for tests and replay
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// JWT claims payload. Only this module reads or writes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
    sub: String, // identity id
    role: Role,
    iat: i64,
    exp: i64,
}

/// A freshly minted token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub expires_in: i64, // seconds
}

/// JWT Handler for token operations
pub struct JwtHandler {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl JwtHandler {
    /// Create a handler from the server secret. A weak secret is a fatal
    /// configuration fault.
    pub fn new(secret: &str, ttl: Duration) -> Result<Self, AuthError> {
        if secret.trim().is_empty() {
            return Err(AuthError::Signing("JWT secret is empty".to_string()));
        }
        if secret.len() < MIN_SECRET_BYTES {
            return Err(AuthError::Signing(format!(
                "JWT secret must be at least {} bytes",
                MIN_SECRET_BYTES
            )));
        }
        if ttl <= Duration::zero() {
            return Err(AuthError::Signing("token TTL must be positive".to_string()));
        }

        // Expiry is checked against the injected clock below
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
            clock: Arc::new(SystemClock),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Generate a token for an identity
    pub fn issue(&self, identity_id: Uuid, role: Role) -> Result<IssuedToken, AuthError> {
        let now = self.clock.now();
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AuthError::Signing("token expiry overflows".to_string()))?;

        let claims = Claims {
            sub: identity_id.to_string(),
            role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Signing(e.to_string()))?;

        debug!(
            "Issued token for {} ({}), expires {}",
            identity_id,
            role,
            expires_at.to_rfc3339()
        );

        Ok(IssuedToken {
            token,
            expires_at,
            expires_in: self.ttl.num_seconds(),
        })
    }

    /// Validate a token and recover the identity it asserts
    pub fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let decoded = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::TokenInvalid,
            },
        )?;
        let claims = decoded.claims;

        if self.clock.now().timestamp() >= claims.exp {
            return Err(AuthError::TokenExpired);
        }

        let id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::TokenInvalid)?;

        debug!("Validated token for {} ({})", id, claims.role);

        Ok(Identity {
            id,
            role: claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-0123456789abcdef-xyz";

    fn handler() -> JwtHandler {
        JwtHandler::new(SECRET, Duration::hours(DEFAULT_TTL_HOURS)).unwrap()
    }

    fn flip_signature_byte(token: &str) -> String {
        let (head, signature) = token.rsplit_once('.').unwrap();
        let mut sig: Vec<char> = signature.chars().collect();
        sig[0] = if sig[0] == 'A' { 'B' } else { 'A' };
        format!("{}.{}", head, sig.into_iter().collect::<String>())
    }

    #[test]
    fn test_issue_and_verify_round_trip() {
        let handler = handler();
        let id = Uuid::new_v4();

        let issued = handler.issue(id, Role::ClubAdmin).unwrap();
        assert!(!issued.token.is_empty());
        assert_eq!(issued.expires_in, 7 * 24 * 3600);

        let identity = handler.verify(&issued.token).unwrap();
        assert_eq!(identity, Identity { id, role: Role::ClubAdmin });
    }

    #[test]
    fn test_expired_token_rejected_as_expired() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let handler = handler().with_clock(clock.clone());
        let id = Uuid::new_v4();

        let issued = handler.issue(id, Role::Student).unwrap();

        clock.advance(Duration::days(6));
        assert!(handler.verify(&issued.token).is_ok());

        clock.advance(Duration::days(1));
        assert!(matches!(
            handler.verify(&issued.token),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn test_tampered_signature_rejected_as_invalid() {
        let handler = handler();
        let issued = handler.issue(Uuid::new_v4(), Role::Student).unwrap();

        let tampered = flip_signature_byte(&issued.token);
        assert_ne!(tampered, issued.token);
        assert!(matches!(
            handler.verify(&tampered),
            Err(AuthError::TokenInvalid)
        ));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let handler = handler();
        assert!(matches!(
            handler.verify("invalid.token.here"),
            Err(AuthError::TokenInvalid)
        ));
        assert!(matches!(handler.verify(""), Err(AuthError::TokenInvalid)));
    }

    #[test]
    fn test_different_secrets_reject() {
        let handler1 = handler();
        let handler2 =
            JwtHandler::new("another-secret-key-0123456789abcdef", Duration::hours(1)).unwrap();

        let issued = handler1.issue(Uuid::new_v4(), Role::SuperAdmin).unwrap();
        assert!(matches!(
            handler2.verify(&issued.token),
            Err(AuthError::TokenInvalid)
        ));
    }

    #[test]
    fn test_weak_secret_is_signing_error() {
        assert!(matches!(
            JwtHandler::new("", Duration::hours(1)),
            Err(AuthError::Signing(_))
        ));
        assert!(matches!(
            JwtHandler::new("short", Duration::hours(1)),
            Err(AuthError::Signing(_))
        ));
        assert!(matches!(
            JwtHandler::new(SECRET, Duration::zero()),
            Err(AuthError::Signing(_))
        ));
    }
}

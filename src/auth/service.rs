//! Authentication Service
//! Mission: Registration and login on top of the credential store

use crate::auth::{
    error::AuthError,
    jwt::{IssuedToken, JwtHandler},
    models::{Profile, User},
    password::PasswordHasher,
    user_store::{CredentialStore, StoreError},
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

pub const MIN_PASSWORD_CHARS: usize = 8;
const MAX_EMAIL_CHARS: usize = 254;
const MAX_NAME_CHARS: usize = 100;

/// Successful login result
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    pub token: IssuedToken,
}

pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    hasher: PasswordHasher,
    jwt: Arc<JwtHandler>,
    // Verified against when the email is unknown so both failure paths cost one bcrypt check
    dummy_digest: String,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: PasswordHasher,
        jwt: Arc<JwtHandler>,
    ) -> Result<Self, AuthError> {
        let dummy_digest = hasher.hash(&Uuid::new_v4().to_string())?;
        Ok(Self {
            store,
            hasher,
            jwt,
            dummy_digest,
        })
    }

    pub fn jwt(&self) -> &Arc<JwtHandler> {
        &self.jwt
    }

    /// Create a new identity. The stored record never holds the plaintext.
    pub fn register(
        &self,
        email: &str,
        password: &str,
        profile: Profile,
    ) -> Result<User, AuthError> {
        let email = normalize_email(email)?;
        if password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(AuthError::InvalidInput(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_CHARS
            )));
        }
        let role = profile.role.unwrap_or_default();
        if !role.is_self_assignable() {
            warn!("Refusing self-registration as {}: {}", role, email);
            return Err(AuthError::Forbidden);
        }
        let name = match profile.name.map(|n| n.trim().to_string()) {
            Some(n) if n.chars().count() > MAX_NAME_CHARS => {
                return Err(AuthError::InvalidInput(format!(
                    "Name cannot be more than {} characters",
                    MAX_NAME_CHARS
                )));
            }
            Some(n) if n.is_empty() => None,
            other => other,
        };

        // Fast path only; the store's unique constraint is what guarantees it
        if self.store.find_by_email(&email).map_err(storage_error)?.is_some() {
            return Err(AuthError::DuplicateIdentity);
        }

        let user = User {
            id: Uuid::new_v4(),
            email,
            name,
            password_hash: self.hasher.hash(password)?,
            role,
            created_at: Utc::now().to_rfc3339(),
        };

        match self.store.insert_unique(&user) {
            Ok(()) => {}
            Err(StoreError::DuplicateKey) => return Err(AuthError::DuplicateIdentity),
            Err(e) => return Err(storage_error(e)),
        }

        info!("✅ Registered user: {} ({})", user.email, user.role);
        Ok(user)
    }

    /// Verify credentials and mint a token.
    ///
    /// Unknown email and wrong password produce the same error.
    pub fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let email = match normalize_email(email) {
            Ok(email) => email,
            Err(_) => {
                self.hasher.verify(password, &self.dummy_digest);
                return Err(AuthError::InvalidCredentials);
            }
        };

        let user = match self.store.find_by_email(&email).map_err(storage_error)? {
            Some(user) => user,
            None => {
                self.hasher.verify(password, &self.dummy_digest);
                warn!("❌ Failed login attempt: {} (unknown email)", email);
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !self.hasher.verify(password, &user.password_hash) {
            warn!("❌ Failed login attempt: {} (bad password)", email);
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.jwt.issue(user.id, user.role)?;

        info!("✅ Login successful: {} ({})", user.email, user.role);
        Ok(LoginOutcome { user, token })
    }

    /// Load the full record behind a verified identity
    pub fn current_user(&self, id: &Uuid) -> Result<User, AuthError> {
        self.store
            .find_by_id(id)
            .map_err(storage_error)?
            .ok_or(AuthError::Unauthorized)
    }
}

/// Trim and lower-case an email, rejecting obviously malformed addresses
pub fn normalize_email(raw: &str) -> Result<String, AuthError> {
    let email = raw.trim().to_lowercase();
    let invalid = || AuthError::InvalidInput("A valid email address is required".to_string());

    if email.is_empty() || email.chars().count() > MAX_EMAIL_CHARS {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.is_empty()
        || domain.contains('@')
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
        || email.chars().any(char::is_whitespace)
    {
        return Err(invalid());
    }
    Ok(email)
}

fn storage_error(err: StoreError) -> AuthError {
    match err {
        StoreError::DuplicateKey => AuthError::DuplicateIdentity,
        StoreError::Backend(e) => AuthError::Internal(e),
    }
}

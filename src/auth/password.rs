//! Password Hashing
//! Mission: Salted, adaptive one-way hashing for stored credentials

use crate::auth::error::AuthError;
use tracing::debug;

/// bcrypt only consumes the first 72 bytes of input
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Work factor range bcrypt accepts
pub const MIN_BCRYPT_COST: u32 = 4;
pub const MAX_BCRYPT_COST: u32 = 31;

/// bcrypt-backed password hasher with a configurable work factor
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Result<Self, AuthError> {
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&cost) {
            return Err(AuthError::InvalidInput(format!(
                "bcrypt cost must be between {} and {}",
                MIN_BCRYPT_COST, MAX_BCRYPT_COST
            )));
        }
        Ok(Self { cost })
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a plaintext password. Empty or over-long input is rejected.
    pub fn hash(&self, plaintext: &str) -> Result<String, AuthError> {
        if plaintext.is_empty() {
            return Err(AuthError::InvalidInput(
                "Password must not be empty".to_string(),
            ));
        }
        if plaintext.len() > MAX_PASSWORD_BYTES {
            return Err(AuthError::InvalidInput(format!(
                "Password must be at most {} bytes",
                MAX_PASSWORD_BYTES
            )));
        }

        bcrypt::hash(plaintext, self.cost)
            .map_err(|e| AuthError::Internal(anyhow::anyhow!("bcrypt hashing failed: {}", e)))
    }

    /// Check a plaintext password against a stored digest.
    ///
    /// Never fails: a malformed digest simply does not match.
    pub fn verify(&self, plaintext: &str, digest: &str) -> bool {
        if plaintext.is_empty() {
            return false;
        }
        match bcrypt::verify(plaintext, digest) {
            Ok(matches) => matches,
            Err(e) => {
                debug!("Rejecting malformed password digest: {}", e);
                false
            }
        }
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            cost: bcrypt::DEFAULT_COST,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_hasher() -> PasswordHasher {
        PasswordHasher::new(MIN_BCRYPT_COST).unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = fast_hasher();
        let digest = hasher.hash("Passw0rd!").unwrap();

        assert_ne!(digest, "Passw0rd!");
        assert!(hasher.verify("Passw0rd!", &digest));
        assert!(!hasher.verify("Passw0rd?", &digest));
        assert!(!hasher.verify("", &digest));
    }

    #[test]
    fn test_hashes_are_salted() {
        let hasher = fast_hasher();
        let first = hasher.hash("same-password").unwrap();
        let second = hasher.hash("same-password").unwrap();

        assert_ne!(first, second);
        assert!(hasher.verify("same-password", &first));
        assert!(hasher.verify("same-password", &second));
    }

    #[test]
    fn test_distinct_passwords_do_not_cross_verify() {
        let hasher = fast_hasher();
        let longest = "x".repeat(MAX_PASSWORD_BYTES);
        let passwords = ["a", "correct horse", "Passw0rd!", "päss wörd", longest.as_str()];

        for (i, p) in passwords.iter().enumerate() {
            let digest = hasher.hash(p).unwrap();
            for (j, other) in passwords.iter().enumerate() {
                assert_eq!(hasher.verify(other, &digest), i == j, "{} vs {}", p, other);
            }
        }
    }

    #[test]
    fn test_rejects_empty_and_oversized_input() {
        let hasher = fast_hasher();

        assert!(matches!(hasher.hash(""), Err(AuthError::InvalidInput(_))));
        let long = "x".repeat(MAX_PASSWORD_BYTES + 1);
        assert!(matches!(hasher.hash(&long), Err(AuthError::InvalidInput(_))));
    }

    #[test]
    fn test_malformed_digest_is_false_not_error() {
        let hasher = fast_hasher();

        assert!(!hasher.verify("Passw0rd!", "not-a-bcrypt-hash"));
        assert!(!hasher.verify("Passw0rd!", ""));
        assert!(!hasher.verify("Passw0rd!", "$2b$04$tooshort"));
    }

    #[test]
    fn test_cost_bounds() {
        assert!(PasswordHasher::new(MIN_BCRYPT_COST - 1).is_err());
        assert!(PasswordHasher::new(MAX_BCRYPT_COST + 1).is_err());
        assert_eq!(PasswordHasher::new(10).unwrap().cost(), 10);
        assert!(PasswordHasher::new(MIN_BCRYPT_COST).is_ok());
        assert!(PasswordHasher::new(MAX_BCRYPT_COST).is_ok());
        assert_eq!(PasswordHasher::default().cost(), bcrypt::DEFAULT_COST);
    }
}

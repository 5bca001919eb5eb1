//! Admin API credentials.

use argon2::{Argon2, PasswordHash, PasswordVerifier};

/// Admin authentication settings.
///
/// Only the argon2 hash of the secret is kept in memory.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    secret_hash: String,
}

impl AdminConfig {
    pub fn new(secret_hash: String) -> Self {
        Self { secret_hash }
    }

    pub fn secret_hash(&self) -> &str {
        &self.secret_hash
    }

    /// Check a plaintext secret against the stored hash.
    ///
    /// A malformed stored hash verifies nothing.
    pub fn verify_secret(&self, plaintext: &str) -> bool {
        let Ok(hash) = PasswordHash::new(&self.secret_hash) else {
            tracing::error!("Admin secret hash is not a valid PHC string");
            return false;
        };
        Argon2::default()
            .verify_password(plaintext.as_bytes(), &hash)
            .is_ok()
    }
}

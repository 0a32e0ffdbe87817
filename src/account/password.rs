//! Password hashing and verification (Argon2id, PHC string format).

use anyhow::{anyhow, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, SaltString},
    Algorithm, Argon2, Params, PasswordHasher as _, PasswordVerifier, Version,
};

/// One-way salted hashing of credentials.
///
/// Every call to [`hash`](Self::hash) draws a fresh random salt, so equal
/// passwords never produce equal hashes. The PHC string embeds algorithm,
/// parameters and salt, so verification needs no side table.
#[derive(Clone, Default)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl PasswordHasher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tune the Argon2id cost (memory in KiB, iterations, parallelism).
    ///
    /// # Errors
    ///
    /// Returns an error if the parameters are out of range for Argon2.
    pub fn with_params(m_cost: u32, t_cost: u32, p_cost: u32) -> Result<Self> {
        let params = Params::new(m_cost, t_cost, p_cost, None)
            .map_err(|err| anyhow!("invalid argon2 parameters: {err}"))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hash a plaintext password with a fresh per-call salt.
    ///
    /// # Errors
    ///
    /// Returns an error when hashing itself fails; callers must treat that as
    /// an internal failure, never as a reason to store the plaintext.
    pub fn hash(&self, plaintext: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|err| anyhow!("password hashing failed: {err}"))?;
        Ok(hash.to_string())
    }

    /// Verify a plaintext password against a stored PHC string.
    ///
    /// Hash comparison inside argon2 is constant-time. A stored value that
    /// does not parse as a PHC string verifies as `false`.
    #[must_use]
    pub fn verify(&self, plaintext: &str, stored: &str) -> bool {
        PasswordHash::new(stored).is_ok_and(|parsed| {
            self.argon2
                .verify_password(plaintext.as_bytes(), &parsed)
                .is_ok()
        })
    }
}

//! # Password Hashing
//!
//! Argon2id hashing behind a small trait so the auth tests can swap in a
//! fast hasher. Hashes are stored in PHC string format, which embeds the
//! algorithm, parameters and salt, so parameter upgrades only affect new
//! hashes.

use argon2::password_hash::{rand_core::OsRng, PasswordHasher as _, SaltString};
use argon2::{Argon2, PasswordHash, PasswordVerifier};

use panaderia_core::{CoreError, CoreResult};

/// Hashing and verification of passwords.
pub trait PasswordHasher: Send + Sync {
    /// Hashes a plaintext password into a PHC string.
    fn hash(&self, password: &str) -> CoreResult<String>;

    /// Verifies a plaintext password against a stored PHC string.
    ///
    /// `Ok(false)` is a mismatch; `Err` means the stored hash itself is
    /// malformed, which is an operational problem, not a bad credential.
    fn verify(&self, password: &str, stored_hash: &str) -> CoreResult<bool>;
}

/// Argon2id with the library defaults (19 MiB, 2 iterations).
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2Hasher;

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> CoreResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| CoreError::Credential(e.to_string()))?;
        Ok(hash.to_string())
    }

    fn verify(&self, password: &str, stored_hash: &str) -> CoreResult<bool> {
        let parsed =
            PasswordHash::new(stored_hash).map_err(|e| CoreError::Credential(e.to_string()))?;
        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(CoreError::Credential(e.to_string())),
        }
    }
}

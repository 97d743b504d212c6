// ABOUTME: Salted password hashing and verification using Argon2id
// ABOUTME: Work factor comes from configuration; hashing runs on the blocking thread pool

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use crate::error::{AppError, Result};

/// Argon2id policy shared by registration, password changes, and login.
#[derive(Clone, Debug)]
pub struct Passwords {
    params: Params,
    /// Hash of a throwaway secret with the same work factor as real accounts.
    dummy_hash: Arc<str>,
    verifications: Arc<AtomicU64>,
}

impl Passwords {
    pub fn new(memory_kib: u32, iterations: u32) -> anyhow::Result<Self> {
        let params = Params::new(memory_kib, iterations, 1, None)
            .map_err(|e| anyhow::anyhow!("Invalid Argon2 parameters: {}", e))?;

        let salt = SaltString::generate(&mut OsRng);
        let dummy_hash = Argon2::new(Algorithm::Argon2id, Version::V0x13, params.clone())
            .hash_password(b"reelmark-unknown-account", &salt)
            .map_err(|e| anyhow::anyhow!("Failed to prepare dummy password hash: {}", e))?
            .to_string();

        Ok(Self {
            params,
            dummy_hash: dummy_hash.into(),
            verifications: Arc::new(AtomicU64::new(0)),
        })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Spends one full verification on the dummy hash so a login for an unknown
    /// username costs the same as a wrong password.
    pub async fn verify_unknown(&self, password: String) -> Result<()> {
        self.verify(password, self.dummy_hash.to_string()).await?;
        Ok(())
    }

    #[cfg(test)]
    pub fn verifications(&self) -> u64 {
        self.verifications.load(Ordering::Relaxed)
    }

    /// Hashes `password` into a PHC string with a fresh random salt.
    pub async fn hash(&self, password: String) -> Result<String> {
        let argon2 = self.argon2();
        tokio::task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            argon2
                .hash_password(password.as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
        })
        .await?
    }

    /// Returns `false` for a wrong password and for a stored hash that cannot be parsed.
    pub async fn verify(&self, password: String, stored_hash: String) -> Result<bool> {
        self.verifications.fetch_add(1, Ordering::Relaxed);
        let argon2 = self.argon2();
        let matches = tokio::task::spawn_blocking(move || {
            let Ok(parsed) = PasswordHash::new(&stored_hash) else {
                tracing::warn!("Stored password hash is not a valid PHC string");
                return false;
            };
            argon2.verify_password(password.as_bytes(), &parsed).is_ok()
        })
        .await?;
        Ok(matches)
    }
}

use std::sync::Arc;

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand_core::OsRng;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password must not be empty")]
    Empty,
    #[error("failed to hash password: {0}")]
    Hash(String),
    #[error("stored password hash is malformed: {0}")]
    MalformedHash(String),
    #[error("password task failed: {0}")]
    Join(String),
}

/// Argon2id hashing with a per-password random salt and an optional
/// server-side pepper mixed in as the Argon2 secret.
#[derive(Clone, Default)]
pub struct PasswordService {
    pepper: Option<Arc<[u8]>>,
}

impl PasswordService {
    pub fn new(pepper: Option<&str>) -> Self {
        Self {
            pepper: pepper.map(|value| Arc::from(value.as_bytes())),
        }
    }

    fn argon2(&self) -> Result<Argon2<'_>, PasswordError> {
        match &self.pepper {
            Some(secret) => Argon2::new_with_secret(secret, Algorithm::Argon2id, Version::V0x13, Params::default())
                .map_err(|err| PasswordError::Hash(err.to_string())),
            None => Ok(Argon2::default()),
        }
    }

    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        if password.trim().is_empty() {
            return Err(PasswordError::Empty);
        }
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()?
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| PasswordError::Hash(err.to_string()))
    }

    pub fn verify(&self, password: &str, stored_hash: &str) -> Result<bool, PasswordError> {
        let parsed = PasswordHash::new(stored_hash)
            .map_err(|err| PasswordError::MalformedHash(err.to_string()))?;
        Ok(self
            .argon2()?
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    /// [`Self::hash`] on the blocking pool; Argon2 is deliberately slow.
    pub async fn hash_blocking(&self, password: String) -> Result<String, PasswordError> {
        let service = self.clone();
        tokio::task::spawn_blocking(move || service.hash(&password))
            .await
            .map_err(|err| PasswordError::Join(err.to_string()))?
    }

    pub async fn verify_blocking(&self, password: String, stored_hash: String) -> Result<bool, PasswordError> {
        let service = self.clone();
        tokio::task::spawn_blocking(move || service.verify(&password, &stored_hash))
            .await
            .map_err(|err| PasswordError::Join(err.to_string()))?
    }
}

use jsonwebtoken::{decode, DecodingKey};
use serde_json::Value;
use tracing::debug;

use crate::claims::Claims;
use crate::config::JwtConfig;
use crate::error::{AuthError, AuthResult};

/// Shortest HS256 secret accepted at startup.
pub const MIN_SECRET_LEN: usize = 16;

/// Verifies HS256 session tokens against the shared signing secret.
#[derive(Clone)]
pub struct JwtVerifier {
    config: JwtConfig,
    key: DecodingKey,
}

impl JwtVerifier {
    pub fn from_secret(config: JwtConfig, secret: &[u8]) -> AuthResult<Self> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(AuthError::WeakSecret(MIN_SECRET_LEN));
        }
        Ok(Self {
            config,
            key: DecodingKey::from_secret(secret),
        })
    }

    pub fn verify(&self, token: &str) -> AuthResult<Claims> {
        let token_data = decode::<Value>(token, &self.key, &self.config.validation())?;
        let claims = Claims::try_from(token_data.claims)?;
        debug!(user_id = claims.subject, role = %claims.role, "verified JWT successfully");
        Ok(claims)
    }
}

impl std::fmt::Debug for JwtVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtVerifier")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

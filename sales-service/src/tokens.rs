use chrono::{DateTime, Duration, Utc};
use common_auth::{AuthError, JwtConfig, Role, MIN_SECRET_LEN};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;

/// Session lifetime; tokens are not refreshable.
pub const SESSION_TTL_SECONDS: i64 = 3600;

pub struct TokenSigner {
    config: JwtConfig,
    encoding_key: EncodingKey,
    ttl: Duration,
}

#[derive(Serialize)]
struct AccessClaims<'a> {
    sub: String,
    role: &'a str,
    iss: &'a str,
    aud: &'a str,
    exp: i64,
    iat: i64,
}

pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl TokenSigner {
    pub fn from_secret(config: JwtConfig, secret: &[u8]) -> Result<Self, AuthError> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(AuthError::WeakSecret(MIN_SECRET_LEN));
        }
        Ok(Self {
            config,
            encoding_key: EncodingKey::from_secret(secret),
            ttl: Duration::seconds(SESSION_TTL_SECONDS),
        })
    }

    pub fn issue(&self, user_id: i64, role: Role) -> Result<IssuedToken, AuthError> {
        let now = Utc::now();
        let expires_at = now + self.ttl;
        let claims = AccessClaims {
            sub: user_id.to_string(),
            role: role.as_str(),
            iss: &self.config.issuer,
            aud: &self.config.audience,
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|err| AuthError::Signing(err.to_string()))?;
        Ok(IssuedToken { token, expires_at })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common_auth::JwtVerifier;

    const SECRET: &[u8] = b"token-signer-test-secret";

    #[test]
    fn issued_token_verifies_with_same_secret() {
        let config = JwtConfig::new("sales-service", "sales-dashboard");
        let signer = TokenSigner::from_secret(config.clone(), SECRET).unwrap();
        let verifier = JwtVerifier::from_secret(config, SECRET).unwrap();

        let issued = signer.issue(42, Role::Admin).unwrap();
        let claims = verifier.verify(&issued.token).unwrap();
        assert_eq!(claims.subject, 42);
        assert_eq!(claims.role, Role::Admin);
        let issued_at = claims.issued_at.unwrap();
        assert_eq!((claims.expires_at - issued_at).num_seconds(), SESSION_TTL_SECONDS);
        assert_eq!(claims.expires_at.timestamp(), issued.expires_at.timestamp());
    }

    #[test]
    fn rejects_weak_secret() {
        let config = JwtConfig::new("sales-service", "sales-dashboard");
        assert!(matches!(
            TokenSigner::from_secret(config, b"tiny"),
            Err(AuthError::WeakSecret(_))
        ));
    }
}

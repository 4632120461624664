use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::{header::AUTHORIZATION, request::Parts, HeaderValue};

use crate::claims::Claims;
use crate::error::{AuthError, AuthResult};
use crate::roles::Role;
use crate::verifier::JwtVerifier;

/// Caller identity taken from a verified `Authorization: Bearer` session token.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub claims: Claims,
    pub token: String,
}

impl AuthContext {
    pub fn has_role(&self, role: Role) -> bool {
        self.claims.has_role(role)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    Arc<JwtVerifier>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingAuthorization)?;
        let token = bearer_token(header)?;
        let claims = Arc::<JwtVerifier>::from_ref(state).verify(token)?;
        Ok(Self { claims, token: token.to_owned() })
    }
}

// The scheme name is case-insensitive (RFC 7235); the token itself is not.
fn bearer_token(value: &HeaderValue) -> AuthResult<&str> {
    let raw = value.to_str().map_err(|_| AuthError::InvalidAuthorization)?;
    match raw.trim().split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Ok(token.trim())
        }
        _ => Err(AuthError::InvalidAuthorization),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JwtConfig;
    use axum::http::Request;
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    const SECRET: &[u8] = b"extractor-test-secret-0123456789";

    fn parts(authorization: Option<String>) -> Parts {
        let mut builder = Request::builder();
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).expect("request").into_parts().0
    }

    fn state() -> Arc<JwtVerifier> {
        Arc::new(JwtVerifier::from_secret(JwtConfig::new("issuer", "audience"), SECRET).expect("verifier"))
    }

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        for raw in ["Bearer abc.def.ghi", "bearer abc.def.ghi", "  BEARER   abc.def.ghi "] {
            let value = HeaderValue::from_str(raw).expect("header");
            assert_eq!(bearer_token(&value).expect("token"), "abc.def.ghi", "raw={raw:?}");
        }
    }

    #[test]
    fn other_schemes_and_blank_tokens_are_malformed() {
        for raw in ["Basic dXNlcjpwdw==", "Bearer", "Bearer    ", "abc.def.ghi"] {
            let value = HeaderValue::from_str(raw).expect("header");
            assert!(matches!(bearer_token(&value), Err(AuthError::InvalidAuthorization)), "raw={raw:?}");
        }
    }

    #[tokio::test]
    async fn verified_token_yields_claims() {
        let now = Utc::now().timestamp();
        let token = encode(
            &Header::default(),
            &json!({"sub": "9", "role": "2", "iss": "issuer", "aud": "audience", "iat": now, "exp": now + 60}),
            &EncodingKey::from_secret(SECRET),
        )
        .expect("token");

        let ctx = AuthContext::from_request_parts(&mut parts(Some(format!("Bearer {token}"))), &state())
            .await
            .expect("context");
        assert_eq!(ctx.claims.subject, 9);
        assert!(ctx.has_role(Role::Employee));
        assert_eq!(ctx.token, token);
    }

    #[tokio::test]
    async fn absent_header_is_reported_as_missing() {
        let err = AuthContext::from_request_parts(&mut parts(None), &state())
            .await
            .expect_err("missing header");
        assert!(matches!(err, AuthError::MissingAuthorization));
    }
}

use axum::response::{IntoResponse, Response};
use common_http_errors::ApiError;
use jsonwebtoken::errors::ErrorKind;
use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authorization header missing")]
    MissingAuthorization,
    #[error("authorization header malformed")]
    InvalidAuthorization,
    #[error("token expired")]
    TokenExpired,
    #[error("token verification failed: {0}")]
    TokenInvalid(String),
    #[error("invalid claim '{0}' with value '{1}'")]
    InvalidClaim(&'static str, String),
    #[error("malformed claim payload: {0}")]
    InvalidJson(String),
    #[error("unknown role '{0}'")]
    UnknownRole(String),
    #[error("signing secret must be at least {0} bytes")]
    WeakSecret(usize),
    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(value: jsonwebtoken::errors::Error) -> Self {
        match value.kind() {
            ErrorKind::ExpiredSignature => Self::TokenExpired,
            _ => Self::TokenInvalid(value.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(value: AuthError) -> Self {
        match value {
            AuthError::MissingAuthorization => {
                ApiError::unauthorized("missing_authorization", "Authentication required", None)
            }
            AuthError::InvalidAuthorization => ApiError::unauthorized(
                "invalid_authorization",
                "Authorization header must be 'Bearer <token>'",
                None,
            ),
            AuthError::TokenExpired => {
                ApiError::unauthorized("token_expired", "Session expired, please log in again", None)
            }
            AuthError::TokenInvalid(_)
            | AuthError::InvalidClaim(_, _)
            | AuthError::InvalidJson(_) => {
                ApiError::unauthorized("invalid_token", "Invalid token", None)
            }
            AuthError::UnknownRole(role) => {
                ApiError::validation("invalid_role", format!("Unknown role '{role}'"), None)
            }
            err @ (AuthError::WeakSecret(_) | AuthError::Signing(_)) => ApiError::internal(err, None),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        tracing::debug!(error = %self, "authentication rejected");
        ApiError::from(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn token_failures_are_unauthorized() {
        for err in [
            AuthError::MissingAuthorization,
            AuthError::InvalidAuthorization,
            AuthError::TokenExpired,
            AuthError::TokenInvalid("bad signature".into()),
            AuthError::InvalidClaim("sub", "x".into()),
        ] {
            assert_eq!(ApiError::from(err).status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn unknown_role_is_validation_error() {
        let resp = AuthError::UnknownRole("boss".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(resp.headers().get("X-Error-Code").expect("code"), "invalid_role");
    }
}

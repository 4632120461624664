use common_http_errors::ApiError;

use crate::roles::Role;
use crate::AuthContext;

#[derive(Debug, Clone)]
pub enum GuardError {
    Forbidden { required: Vec<Role> },
}

impl From<GuardError> for ApiError {
    fn from(value: GuardError) -> Self {
        match value {
            GuardError::Forbidden { required } => match required.as_slice() {
                [only] => ApiError::ForbiddenMissingRole {
                    role: only.as_str(),
                    trace_id: None,
                },
                _ => ApiError::Forbidden { trace_id: None },
            },
        }
    }
}

/// Succeeds when the caller holds one of `allowed`; an empty set admits any authenticated caller.
pub fn ensure_role(auth: &AuthContext, allowed: &[Role]) -> Result<(), GuardError> {
    if allowed.is_empty() || allowed.contains(&auth.claims.role) {
        return Ok(());
    }
    Err(GuardError::Forbidden {
        required: allowed.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::Claims;
    use axum::http::StatusCode;
    use chrono::Utc;

    fn ctx(role: Role) -> AuthContext {
        AuthContext {
            claims: Claims {
                subject: 1,
                role,
                expires_at: Utc::now(),
                issued_at: None,
                issuer: "issuer".into(),
                audience: vec!["audience".into()],
            },
            token: "token".into(),
        }
    }

    #[test]
    fn admits_listed_role() {
        assert!(ensure_role(&ctx(Role::Employee), &[Role::Employee, Role::Admin]).is_ok());
        assert!(ensure_role(&ctx(Role::Admin), &[]).is_ok());
    }

    #[test]
    fn rejects_unlisted_role_with_missing_role() {
        let err = ensure_role(&ctx(Role::Employee), &[Role::Admin]).expect_err("forbidden");
        let api: ApiError = err.into();
        assert_eq!(api.status(), StatusCode::FORBIDDEN);
        assert!(matches!(api, ApiError::ForbiddenMissingRole { role: "admin", .. }));
    }
}

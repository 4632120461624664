use std::marker::PhantomData;
use std::sync::Arc;

use axum::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::{request::Parts, HeaderMap};
use chrono::{DateTime, Utc};
use common_auth::{ensure_role, AuthContext, JwtVerifier, Role};
use common_http_errors::ApiError;
use serde::Serialize;
use tracing::{warn, Span};
use uuid::Uuid;

use crate::policy::Gate;

/// Verified caller identity, attached to request extensions once resolved.
#[derive(Debug, Clone, Serialize)]
pub struct SecurityContext {
    pub user_id: i64,
    pub role: Role,
    pub trace_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Any authenticated caller, whatever the role.
pub struct SecurityCtxExtractor(pub SecurityContext);

/// Request trace id for unauthenticated routes: `X-Trace-ID` when valid, otherwise fresh.
#[derive(Debug, Clone, Copy)]
pub struct TraceId(pub Uuid);

/// Authenticated caller whose role holds `G`'s capability. Taken as a handler's
/// first argument, it rejects before the body is read or the database touched.
pub struct Authorized<G: Gate>(pub SecurityContext, pub PhantomData<G>);

fn trace_id_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    headers.get("X-Trace-ID")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s.trim()).ok())
}

async fn authenticate<S>(parts: &mut Parts, state: &S) -> Result<(AuthContext, Uuid), ApiError>
where
    Arc<JwtVerifier>: FromRef<S>,
    S: Send + Sync,
{
    let trace_id = trace_id_from_headers(&parts.headers).unwrap_or_else(Uuid::new_v4);
    Span::current().record("trace_id", tracing::field::display(trace_id));

    let auth = AuthContext::from_request_parts(parts, state)
        .await
        .map_err(|err| {
            tracing::debug!(%trace_id, error = %err, "authentication failed");
            ApiError::from(err).with_trace_id(trace_id)
        })?;
    Span::current().record("user_id", auth.claims.subject);
    Ok((auth, trace_id))
}

fn attach(parts: &mut Parts, auth: &AuthContext, trace_id: Uuid) -> SecurityContext {
    let ctx = SecurityContext {
        user_id: auth.claims.subject,
        role: auth.claims.role,
        trace_id,
        expires_at: auth.claims.expires_at,
    };
    parts.extensions.insert(ctx.clone());
    ctx
}

#[async_trait]
impl<S> FromRequestParts<S> for TraceId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let trace_id = trace_id_from_headers(&parts.headers).unwrap_or_else(Uuid::new_v4);
        Span::current().record("trace_id", tracing::field::display(trace_id));
        Ok(TraceId(trace_id))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for SecurityCtxExtractor
where
    Arc<JwtVerifier>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let (auth, trace_id) = authenticate(parts, state).await?;
        Ok(SecurityCtxExtractor(attach(parts, &auth, trace_id)))
    }
}

#[async_trait]
impl<S, G> FromRequestParts<S> for Authorized<G>
where
    Arc<JwtVerifier>: FromRef<S>,
    S: Send + Sync,
    G: Gate,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let (auth, trace_id) = authenticate(parts, state).await?;
        let capability = G::CAPABILITY;
        ensure_role(&auth, capability.allowed_roles()).map_err(|err| {
            warn!(
                user_id = auth.claims.subject,
                role = %auth.claims.role,
                capability = capability.as_str(),
                "capability_check_failed"
            );
            ApiError::from(err).with_trace_id(trace_id)
        })?;
        Ok(Authorized(attach(parts, &auth, trace_id), PhantomData))
    }
}

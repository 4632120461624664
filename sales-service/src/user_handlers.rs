use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use common_auth::{Role, RoleRepr};
use common_http_errors::ApiError;
use common_security::{SecurityCtxExtractor, TraceId};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::json::ValidJson;
use crate::passwords::PasswordError;
use crate::users::{self, NewUser};

#[derive(Deserialize)]
pub struct SignupRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<RoleRepr>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub role: Role,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user_id: i64,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

fn required(value: Option<String>, field: &'static str, trace_id: Uuid) -> Result<String, ApiError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ApiError::validation(
            "missing_field",
            format!("Field '{field}' is required"),
            Some(trace_id),
        )),
    }
}

fn password_error(err: PasswordError, trace_id: Uuid) -> ApiError {
    match err {
        PasswordError::Empty => ApiError::validation("missing_field", "Field 'password' is required", Some(trace_id)),
        other => ApiError::internal(other, Some(trace_id)),
    }
}

fn invalid_credentials(trace_id: Uuid) -> ApiError {
    ApiError::unauthorized("invalid_credentials", "Invalid email or password", Some(trace_id))
}

pub async fn signup(
    TraceId(trace_id): TraceId,
    State(state): State<AppState>,
    ValidJson(request): ValidJson<SignupRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let name = required(request.name, "name", trace_id)?;
    let email = required(request.email, "email", trace_id)?;
    let password = required(request.password, "password", trace_id)?;
    let role_repr = request.role.ok_or_else(|| {
        ApiError::validation("missing_field", "Field 'role' is required", Some(trace_id))
    })?;
    let role = Role::try_from(role_repr).map_err(|err| ApiError::from(err).with_trace_id(trace_id))?;

    if !email.contains('@') {
        return Err(ApiError::validation("invalid_email", "Email address is not valid", Some(trace_id)));
    }

    if users::email_exists(&state.db, &email)
        .await
        .map_err(|err| err.into_api(trace_id))?
    {
        return Err(ApiError::conflict("duplicate_email", "Email already exists", Some(trace_id)));
    }

    let password_hash = state
        .passwords
        .hash_blocking(password)
        .await
        .map_err(|err| password_error(err, trace_id))?;

    // The unique index closes the race between the existence check and the insert.
    let user = users::insert(
        &state.db,
        NewUser { name: &name, email: &email, password_hash: &password_hash, role },
    )
    .await
    .map_err(|err| err.into_api(trace_id))?;

    info!(user_id = user.id, role = %user.role, %trace_id, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse { message: "User registered successfully" }),
    ))
}

pub async fn login(
    TraceId(trace_id): TraceId,
    State(state): State<AppState>,
    ValidJson(request): ValidJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let email = required(request.email, "email", trace_id)?;
    let password = required(request.password, "password", trace_id)?;

    let user = match users::find_by_email(&state.db, &email)
        .await
        .map_err(|err| err.into_api(trace_id))?
    {
        Some(user) => user,
        None => {
            state.metrics.login_attempt("unknown_user");
            return Err(invalid_credentials(trace_id));
        }
    };

    let valid = state
        .passwords
        .verify_blocking(password, user.password_hash.clone())
        .await
        .map_err(|err| {
            state.metrics.login_attempt("error");
            password_error(err, trace_id)
        })?;
    if !valid {
        warn!(user_id = user.id, %trace_id, "login rejected: bad password");
        state.metrics.login_attempt("invalid_password");
        return Err(invalid_credentials(trace_id));
    }

    let issued = state
        .token_signer
        .issue(user.id, user.role)
        .map_err(|err| ApiError::from(err).with_trace_id(trace_id))?;

    state.metrics.login_attempt("success");
    info!(user_id = user.id, role = %user.role, %trace_id, "login succeeded");
    Ok(Json(LoginResponse {
        token: issued.token,
        role: user.role,
        name: user.name,
        email: user.email,
    }))
}

pub async fn me(SecurityCtxExtractor(ctx): SecurityCtxExtractor) -> Json<MeResponse> {
    Json(MeResponse {
        user_id: ctx.user_id,
        role: ctx.role,
        expires_at: ctx.expires_at,
    })
}

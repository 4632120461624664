use axum::{http::{StatusCode, HeaderValue}, response::{IntoResponse, Response}, Json};
use serde::Serialize;
use tracing::error;
use uuid::Uuid;

mod metrics;

pub use metrics::http_error_metrics_layer;

const INTERNAL_MESSAGE: &str = "Internal server error";

/// Uniform JSON error body. `error` is the human readable message every client reads.
#[derive(Serialize, Debug)]
pub struct ErrorBody {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")] pub missing_role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")] pub trace_id: Option<Uuid>,
}

#[derive(Debug)]
pub enum ApiError {
    Unauthorized { code: &'static str, trace_id: Option<Uuid>, message: Option<String> },
    ForbiddenMissingRole { role: &'static str, trace_id: Option<Uuid> },
    Forbidden { trace_id: Option<Uuid> },
    BadRequest { code: &'static str, trace_id: Option<Uuid>, message: Option<String> },
    NotFound { code: &'static str, trace_id: Option<Uuid>, message: Option<String> },
    Conflict { code: &'static str, trace_id: Option<Uuid>, message: Option<String> },
    /// `message` is logged server side and never rendered.
    Internal { trace_id: Option<Uuid>, message: Option<String> },
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(e: E, trace_id: Option<Uuid>) -> Self { Self::Internal { trace_id, message: Some(e.to_string()) } }

    pub fn validation(code: &'static str, message: impl Into<String>, trace_id: Option<Uuid>) -> Self {
        Self::BadRequest { code, trace_id, message: Some(message.into()) }
    }

    pub fn unauthorized(code: &'static str, message: impl Into<String>, trace_id: Option<Uuid>) -> Self {
        Self::Unauthorized { code, trace_id, message: Some(message.into()) }
    }

    pub fn not_found(code: &'static str, message: impl Into<String>, trace_id: Option<Uuid>) -> Self {
        Self::NotFound { code, trace_id, message: Some(message.into()) }
    }

    pub fn conflict(code: &'static str, message: impl Into<String>, trace_id: Option<Uuid>) -> Self {
        Self::Conflict { code, trace_id, message: Some(message.into()) }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            ApiError::ForbiddenMissingRole { .. } | ApiError::Forbidden { .. } => StatusCode::FORBIDDEN,
            // Conflicts share 400 with validation failures; the code field tells them apart.
            ApiError::BadRequest { .. } | ApiError::Conflict { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Attach a trace id when the error was raised before one was known.
    pub fn with_trace_id(mut self, id: Uuid) -> Self {
        match &mut self {
            ApiError::Unauthorized { trace_id, .. }
            | ApiError::ForbiddenMissingRole { trace_id, .. }
            | ApiError::Forbidden { trace_id }
            | ApiError::BadRequest { trace_id, .. }
            | ApiError::NotFound { trace_id, .. }
            | ApiError::Conflict { trace_id, .. }
            | ApiError::Internal { trace_id, .. } => {
                if trace_id.is_none() {
                    *trace_id = Some(id);
                }
            }
        }
        self
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Unauthorized { code, message, .. }
            | ApiError::BadRequest { code, message, .. }
            | ApiError::NotFound { code, message, .. }
            | ApiError::Conflict { code, message, .. } => match message {
                Some(message) => write!(f, "{code}: {message}"),
                None => f.write_str(code),
            },
            ApiError::ForbiddenMissingRole { role, .. } => write!(f, "missing_role: {role}"),
            ApiError::Forbidden { .. } => f.write_str("forbidden"),
            ApiError::Internal { .. } => f.write_str("internal_error"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (body, error_code) = match self {
            ApiError::Unauthorized { code, trace_id, message } => (
                ErrorBody { error: message.unwrap_or_else(|| "Authentication required".into()), code: code.into(), missing_role: None, trace_id },
                code
            ),
            ApiError::ForbiddenMissingRole { role, trace_id } => (
                ErrorBody { error: format!("Access denied: requires {role}"), code: "missing_role".into(), missing_role: Some(role.into()), trace_id },
                "missing_role"
            ),
            ApiError::Forbidden { trace_id } => (
                ErrorBody { error: "Access denied".into(), code: "forbidden".into(), missing_role: None, trace_id },
                "forbidden"
            ),
            ApiError::BadRequest { code, trace_id, message } => (
                ErrorBody { error: message.unwrap_or_else(|| code.into()), code: code.into(), missing_role: None, trace_id },
                code
            ),
            ApiError::NotFound { code, trace_id, message } => (
                ErrorBody { error: message.unwrap_or_else(|| "Not found".into()), code: code.into(), missing_role: None, trace_id },
                code
            ),
            ApiError::Conflict { code, trace_id, message } => (
                ErrorBody { error: message.unwrap_or_else(|| code.into()), code: code.into(), missing_role: None, trace_id },
                code
            ),
            ApiError::Internal { trace_id, message } => {
                error!(trace_id = ?trace_id, cause = message.as_deref().unwrap_or("unknown"), "request failed with internal error");
                (
                    ErrorBody { error: INTERNAL_MESSAGE.into(), code: "internal_error".into(), missing_role: None, trace_id },
                    "internal_error"
                )
            }
        };
        let mut resp = (status, Json(body)).into_response();
        if let Ok(val) = HeaderValue::from_str(error_code) {
            resp.headers_mut().insert("X-Error-Code", val);
        }
        resp
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

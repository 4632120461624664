use axum::async_trait;
use axum::extract::{FromRequest, Request};
use axum::Json;
use common_http_errors::ApiError;
use common_security::SecurityContext;
use serde::de::DeserializeOwned;
use uuid::Uuid;

/// `Json<T>` whose rejection renders as the uniform error body instead of axum's plain text.
pub struct ValidJson<T>(pub T);

/// The id the gate already resolved, else `X-Trace-ID`, else a fresh one.
fn request_trace_id(req: &Request) -> Uuid {
    if let Some(ctx) = req.extensions().get::<SecurityContext>() {
        return ctx.trace_id;
    }
    req.headers()
        .get("X-Trace-ID")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s.trim()).ok())
        .unwrap_or_else(Uuid::new_v4)
}

#[async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let trace_id = request_trace_id(&req);
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ValidJson(value)),
            Err(rejection) => Err(ApiError::validation("invalid_json", rejection.body_text(), Some(trace_id))),
        }
    }
}

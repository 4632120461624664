use common_http_errors::{ApiError, http_error_metrics_layer};
use axum::{Router, routing::get, http::StatusCode};
use axum::middleware;
use std::sync::atomic::{AtomicUsize, Ordering};
use tower::ServiceExt; // for oneshot

static DYNAMIC_COUNTER: AtomicUsize = AtomicUsize::new(0);

// Emits a different error code each time until the guard threshold is passed.
async fn dyn_error() -> Result<&'static str, ApiError> {
    let n = DYNAMIC_COUNTER.fetch_add(1, Ordering::Relaxed);
    let code = format!("dyn_code_{}", n);
    Err(ApiError::BadRequest { code: Box::leak(code.into_boxed_str()), trace_id: None, message: None })
}

#[tokio::test]
async fn error_code_cardinality_guard_caps_labels() {
    let app = Router::new()
        .route("/err", get(dyn_error))
        .layer(middleware::from_fn(http_error_metrics_layer("test-svc")));

    for _ in 0..50 {
        let resp = app.clone().oneshot(axum::http::Request::builder().uri("/err").body(axum::body::Body::empty()).unwrap()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    let families = prometheus::gather();
    let errors = families
        .iter()
        .find(|family| family.get_name() == "http_errors_total")
        .expect("http_errors_total registered");
    let codes: std::collections::HashSet<String> = errors
        .get_metric()
        .iter()
        .flat_map(|metric| metric.get_label().iter())
        .filter(|label| label.get_name() == "code")
        .map(|label| label.get_value().to_string())
        .collect();
    assert!(codes.len() <= 41, "code labels should be capped, got {}", codes.len());
    assert!(codes.contains("overflow"));
}

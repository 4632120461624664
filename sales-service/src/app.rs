use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{FromRef, Request, State};
use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderName, HeaderValue, Method,
};
use axum::response::{IntoResponse, Response};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use common_auth::JwtVerifier;
use common_http_errors::{http_error_metrics_layer, ApiError};
use sqlx::PgPool;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{field, info_span, warn};

use crate::analytics_handlers;
use crate::config::ServiceConfig;
use crate::customer_handlers::{create_customer, delete_customer, get_customer, list_customers, update_customer};
use crate::metrics::SalesMetrics;
use crate::passwords::PasswordService;
use crate::product_handlers::{create_product, delete_product, get_product, list_products, update_product};
use crate::sale_handlers::{create_sale, delete_sale, get_sale, list_sales};
use crate::tokens::TokenSigner;
use crate::user_handlers::{login, me, signup};

pub const SERVICE_NAME: &str = "sales-service";

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub jwt_verifier: Arc<JwtVerifier>,
    pub token_signer: Arc<TokenSigner>,
    pub passwords: PasswordService,
    pub config: Arc<ServiceConfig>,
    pub metrics: Arc<SalesMetrics>,
}

impl FromRef<AppState> for Arc<JwtVerifier> {
    fn from_ref(state: &AppState) -> Self {
        state.jwt_verifier.clone()
    }
}

impl FromRef<AppState> for Arc<ServiceConfig> {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

/// Verifier and signer share one HMAC secret and one issuer/audience pair.
pub fn build_state(config: ServiceConfig, db: PgPool) -> Result<AppState> {
    let secret = config.jwt_secret.as_bytes();
    let jwt_verifier = JwtVerifier::from_secret(config.jwt.clone(), secret)
        .context("failed to initialise JWT verifier")?;
    let token_signer = TokenSigner::from_secret(config.jwt.clone(), secret)
        .context("failed to initialise token signer")?;
    let passwords = PasswordService::new(config.password_pepper.as_deref());
    let metrics = SalesMetrics::new().context("failed to register service metrics")?;

    Ok(AppState {
        db,
        jwt_verifier: Arc::new(jwt_verifier),
        token_signer: Arc::new(token_signer),
        passwords,
        config: Arc::new(config),
        metrics: Arc::new(metrics),
    })
}

pub async fn health() -> &'static str {
    "ok"
}

async fn metrics(State(state): State<AppState>) -> Response {
    match state.metrics.render() {
        Ok(response) => response,
        Err(err) => ApiError::internal(err, None).into_response(),
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring unparseable CORS origin");
                None
            }
        })
        .collect::<Vec<_>>();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            ACCEPT,
            CONTENT_TYPE,
            AUTHORIZATION,
            HeaderName::from_static("x-trace-id"),
        ])
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
        .route("/customers", get(list_customers).post(create_customer))
        .route(
            "/customers/:id",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/sales", get(list_sales).post(create_sale))
        .route("/sales/:id", get(get_sale).delete(delete_sale))
        .route("/stats/monthly-revenue", get(analytics_handlers::monthly_revenue))
        .route("/stats/top-products", get(analytics_handlers::top_products))
        .route("/stats/top-customers", get(analytics_handlers::top_customers))
        .route("/stats/sales-growth", get(analytics_handlers::sales_growth))
        .route("/stats/sales-by-category", get(analytics_handlers::sales_by_category))
        .route("/stats/sales-by-region", get(analytics_handlers::sales_by_region))
        .route("/stats/daily-sales", get(analytics_handlers::daily_sales))
        .route("/stats/customer-acquisition", get(analytics_handlers::customer_acquisition))
}

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_allowed_origins);

    // Extractors fill in trace_id and user_id once the caller is known.
    let trace = TraceLayer::new_for_http().make_span_with(|req: &Request| {
        info_span!(
            "http_request",
            method = %req.method(),
            path = %req.uri().path(),
            trace_id = field::Empty,
            user_id = field::Empty,
        )
    });

    Router::new()
        .route("/healthz", get(health))
        .route("/metrics", get(metrics))
        .nest("/api", api_routes())
        .with_state(state)
        .layer(middleware::from_fn(http_error_metrics_layer(SERVICE_NAME)))
        .layer(cors)
        .layer(trace)
}

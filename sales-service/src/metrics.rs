use anyhow::Result;
use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct SalesMetrics {
    registry: Registry,
    login_attempts: IntCounterVec,
    sales_created: IntCounterVec,
}

impl SalesMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let login_attempts = IntCounterVec::new(
            Opts::new(
                "sales_login_attempts_total",
                "Count of login attempts grouped by outcome",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(login_attempts.clone()))?;

        let sales_created = IntCounterVec::new(
            Opts::new(
                "sales_created_total",
                "Count of sale creation attempts grouped by outcome",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(sales_created.clone()))?;

        Ok(Self {
            registry,
            login_attempts,
            sales_created,
        })
    }

    pub fn login_attempt(&self, outcome: &str) {
        self.login_attempts.with_label_values(&[outcome]).inc();
    }

    pub fn sale_created(&self, outcome: &str) {
        self.sales_created.with_label_values(&[outcome]).inc();
    }

    /// Service counters plus the process-wide registry holding `http_errors_total`.
    pub fn render(&self) -> Result<Response> {
        let encoder = TextEncoder::new();
        let mut metric_families = self.registry.gather();
        metric_families.extend(prometheus::gather());
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        let response = Response::builder()
            .status(StatusCode::OK)
            .header(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; version=0.0.4"),
            )
            .body(Body::from(buffer))?;
        Ok(response)
    }
}

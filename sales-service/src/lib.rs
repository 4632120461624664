pub mod analytics;
pub mod analytics_handlers;
pub mod app;
pub mod config;
pub mod customer_handlers;
pub mod customers;
pub mod error;
pub mod json;
pub mod metrics;
pub mod passwords;
pub mod product_handlers;
pub mod products;
pub mod sale_handlers;
pub mod sales;
pub mod tokens;
pub mod user_handlers;
pub mod users;

pub use app::{build_router, build_state, AppState};
pub use config::{load_service_config, ServiceConfig};

/// Schema migrations embedded at compile time.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

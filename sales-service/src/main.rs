use anyhow::Context;
use sales_service::{build_router, build_state, load_service_config, MIGRATOR};
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = load_service_config()?;
    let db = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(config.db_acquire_timeout)
        .connect(&config.database_url)
        .await
        .context("failed to connect to DATABASE_URL")?;

    if config.run_migrations {
        MIGRATOR.run(&db).await.context("failed to run migrations")?;
        info!("database migrations applied");
    }

    let addr = config.bind_addr();
    let state = build_state(config, db)?;
    let app = build_router(state);

    info!(%addr, "starting sales-service");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

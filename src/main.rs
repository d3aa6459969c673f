use anyhow::{Context, Result};
use dotenvy::dotenv;
use log::{info, warn};
use std::sync::Arc;

use okrserver::config::AppConfig;
use okrserver::core::shared::state::AppState;
use okrserver::core::shared::utils::{create_conn, run_migrations};
use okrserver::goals::PgRepository;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .write_style(env_logger::WriteStyle::Always)
        .init();

    let config = AppConfig::from_env();
    if config.auth.jwt_secret.is_none() {
        warn!("JWT_SECRET is not set; every request will be rejected as unauthenticated");
    }

    let pool = create_conn(&config.database_url()).context("Failed to create database pool")?;
    run_migrations(&pool).map_err(|e| anyhow::anyhow!("Failed to run migrations: {e}"))?;

    let state = Arc::new(AppState::new(Arc::new(PgRepository::new(pool)), &config));
    let app = okrserver::build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("okrserver listening on {addr}");
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

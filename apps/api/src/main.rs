//! Domaris API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod api_services;
mod auth;
mod cli;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use std::net::SocketAddr;

use domaris_core::AppError;
use tracing::info;

use crate::api_config::{ApiConfig, init_tracing};
use crate::api_services::{build_app_state, build_postgres_session_layer, connect_and_migrate};
use crate::cli::ApiCommand;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let command = ApiCommand::parse(std::env::args().skip(1))?;
    let config = ApiConfig::load()?;
    let pool = connect_and_migrate(&config.database_url).await?;

    match command {
        ApiCommand::Migrate => {
            info!("database migrations applied successfully");
            Ok(())
        }
        ApiCommand::Serve => serve(config, pool).await,
        command => {
            let app_state = build_app_state(pool, config.activity_log_settings());
            cli::run_operator_command(&app_state, command).await
        }
    }
}

async fn serve(config: ApiConfig, pool: sqlx::PgPool) -> Result<(), AppError> {
    config.require_session_secret()?;

    let session_layer = build_postgres_session_layer(pool.clone(), config.cookie_secure).await?;
    let app_state = build_app_state(pool, config.activity_log_settings());
    let app = api_router::build_router(app_state, &config.frontend_url, session_layer)?;

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind API listener: {error}")))?;

    info!(%address, "domaris api listening");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .map_err(|error| AppError::Internal(format!("api server failed: {error}")))
}

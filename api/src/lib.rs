//! HTTP surface for the code-history question answering service.

use std::env;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::signal;
use tracing::info;

mod core;
mod error_handler;
mod routes;

pub use error_handler::{AppError, AppResult};

use crate::core::app_state::AppState;
use crate::routes::{
    chat::chat_route::{chat, chat_cached},
    health::health_route::health,
};

/// Builds the state from the environment and serves until Ctrl+C.
pub async fn start() -> AppResult<()> {
    let host_url = env::var("API_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".into());
    let state = AppState::from_env()?;

    let app = Router::new()
        .route("/chat", post(chat))
        .route("/chat/cached", post(chat_cached))
        .route("/health", get(health))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&host_url)
        .await
        .map_err(AppError::Bind)?;
    info!(address = %host_url, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    Ok(())
}

/// Returns a future that resolves when Ctrl+C is pressed.
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}

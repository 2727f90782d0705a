//! GET /health — liveness plus a few in-memory counters.

use axum::{Json, extract::State};
use serde::Serialize;

use crate::core::app_state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub active_sessions: usize,
    pub session_capacity: usize,
    pub cached_contexts: usize,
    /// Display labels of the cached context renderings.
    pub cached_labels: Vec<String>,
}

/// Handler: GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let stats = state.agent.memory().stats();
    Json(HealthResponse {
        status: "ok",
        active_sessions: stats.active,
        session_capacity: stats.capacity,
        cached_contexts: state.agent.cache().active_len(),
        cached_labels: state.agent.cache().active_labels(),
    })
}

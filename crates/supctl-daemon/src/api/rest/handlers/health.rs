//! Health and status handlers

use crate::api::rest::state::AppState;
use axum::{extract::State, Json};
use serde::Serialize;
use supctl_core::{GateResetPolicy, GateSnapshot, SeriesRole};

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub version: String,
    pub uptime: String,
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime: state.uptime(),
    })
}

/// Daemon status response
#[derive(Debug, Serialize)]
pub struct DaemonStatusResponse {
    pub status: String,
    pub version: String,
    pub uptime: String,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub gate: GateSnapshot,
    pub reset_policy: GateResetPolicy,
    pub next_sequence: u64,
    pub cached_roles: Vec<SeriesRole>,
}

/// Daemon status endpoint
pub async fn daemon_status(State(state): State<AppState>) -> Json<DaemonStatusResponse> {
    let emitter = state.pipeline.emitter();

    Json(DaemonStatusResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime: state.uptime(),
        started_at: state.started_at,
        gate: emitter.gate().snapshot(),
        reset_policy: emitter.gate().policy(),
        next_sequence: emitter.next_sequence(),
        cached_roles: state.pipeline.store().cached_roles(),
    })
}

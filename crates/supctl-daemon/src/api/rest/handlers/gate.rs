//! Emission gate handlers

use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiResult};
use axum::{body::Bytes, extract::State, Json};
use serde::{Deserialize, Serialize};
use supctl_core::{GateSnapshot, GateState, LimitKind};

/// Gate reset request; an absent kind re-arms both tracks
#[derive(Debug, Default, Deserialize)]
pub struct ResetGateRequest {
    #[serde(default)]
    pub kind: Option<LimitKind>,
}

/// Gate reset response
#[derive(Debug, Serialize)]
pub struct ResetGateResponse {
    /// Tracks that were fired before the reset
    pub rearmed: Vec<LimitKind>,
    pub gate: GateSnapshot,
}

/// Re-arm one or both gate tracks. An empty body resets both.
pub async fn reset_gate(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<ResetGateResponse>> {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        ResetGateRequest::default()
    } else {
        serde_json::from_slice::<ResetGateRequest>(&body)
            .map_err(|e| ApiError::BadRequest(format!("Invalid reset request: {e}")))?
    };

    let kinds = match request.kind {
        Some(kind) => vec![kind],
        None => LimitKind::ALL.to_vec(),
    };

    let gate = state.pipeline.emitter().gate();
    let rearmed: Vec<LimitKind> = kinds
        .into_iter()
        .filter(|kind| gate.reset(*kind) == GateState::Fired)
        .collect();

    tracing::info!(rearmed = ?rearmed, "Gate reset by operator");

    Ok(Json(ResetGateResponse {
        rearmed,
        gate: gate.snapshot(),
    }))
}

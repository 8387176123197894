//! Platform notification webhook

use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiResult};
use crate::pipeline::PipelineOutcome;
use axum::{
    body::Bytes,
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use supctl_core::Emission;

/// JSON pointer of the file identifier inside a notification
const FILE_ID_POINTER: &str = "/query/fileID";

/// Acknowledgement returned for every accepted notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationAck {
    pub received: bool,
}

impl NotificationAck {
    fn received() -> Json<Self> {
        Json(Self { received: true })
    }
}

/// Receive a `file_created` notification from the platform.
///
/// Anything other than a non-JSON request, a malformed body or a scan that
/// fails on local data is acknowledged, whatever the pipeline decided.
pub async fn receive_notification(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<NotificationAck>> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !content_type.contains("application/json") {
        tracing::warn!(content_type, "Received notification with unsupported content type");
        return Err(ApiError::UnsupportedContentType);
    }

    let data: Value = serde_json::from_slice(&body).map_err(|e| {
        tracing::warn!(error = %e, "Received malformed notification body");
        ApiError::BadRequest(format!("Malformed JSON body: {e}"))
    })?;
    tracing::info!(notification = %data, "Received notification");

    let Some(file_id) = file_id(&data) else {
        tracing::info!("Notification carries no file reference, nothing to do");
        return Ok(NotificationAck::received());
    };

    match state.pipeline.process(&file_id).await {
        Ok(outcome) => log_outcome(&file_id, &outcome),
        Err(e) if e.is_collaborator_failure() => {
            tracing::warn!(file_id = %file_id, error = %e, "Platform call failed, dropping notification");
        }
        Err(e) => {
            tracing::error!(file_id = %file_id, error = %e, "Processing failed");
            return Err(e.into());
        }
    }

    Ok(NotificationAck::received())
}

/// File identifier of a notification, as text
fn file_id(data: &Value) -> Option<String> {
    match data.pointer(FILE_ID_POINTER)? {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

fn log_outcome(file_id: &str, outcome: &PipelineOutcome) {
    match outcome {
        PipelineOutcome::UnsupportedExtension { .. } | PipelineOutcome::Unrecognized { .. } => {}
        PipelineOutcome::Scanned { role, scan, emission, .. } => match emission {
            Emission::Nothing => {
                tracing::info!(file_id, role = %role, "No limit violated");
            }
            Emission::Suppressed(kind) => {
                tracing::info!(file_id, role = %role, kind = %kind, "Violation suppressed, control request already sent");
            }
            Emission::Fired(fired) => {
                tracing::info!(
                    file_id,
                    role = %role,
                    kind = %fired.kind,
                    sensor = %fired.request.primary_text,
                    upper_met = scan.upper_met,
                    lower_met = scan.lower_met,
                    submitted = fired.submitted,
                    "Control request emitted"
                );
            }
        },
    }
}

//! Event subscription registration
//!
//! Subscribes the daemon's webhook to `file_created` events on the configured
//! data sources. Data sources may not exist yet when the daemon starts, so
//! registration is retried on a fixed interval.

use crate::client::PlatformApi;
use crate::types::{DataSource, EventAction};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Event type the daemon subscribes to
pub const FILE_CREATED_EVENT: &str = "file_created";

/// Action type asking the platform to POST event data
pub const SEND_DATA_ACTION: &str = "send_data";

/// Registration settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationSettings {
    /// Data source names to subscribe to
    pub data_sources: Vec<String>,

    /// Webhook URL the platform should call
    pub callback_url: String,

    /// Pause between attempts
    pub wait: Duration,

    /// Maximum number of attempts
    pub iterations: u32,
}

/// Register the webhook on every configured data source.
///
/// Returns `true` once every data source has a matching event action,
/// `false` when attempts run out.
pub async fn register_for_events(api: &dyn PlatformApi, settings: &RegistrationSettings) -> bool {
    let mut pending = settings.data_sources.clone();

    for attempt in 1..=settings.iterations {
        match api.list_data_sources().await {
            Ok(sources) => {
                let matching: Vec<&DataSource> = sources
                    .iter()
                    .filter(|s| pending.contains(&s.name))
                    .collect();
                for source in matching {
                    if register_source(api, source, &settings.callback_url).await {
                        pending.retain(|name| name != &source.name);
                    }
                }
            }
            Err(e) => {
                tracing::warn!(attempt, error = %e, "Failed to list data sources");
            }
        }

        if pending.is_empty() {
            tracing::info!("Successful registration on all data sources");
            return true;
        }

        tracing::info!(
            attempt,
            pending = %pending.join(", "),
            wait_secs = settings.wait.as_secs(),
            "Data source(s) not registered yet, retrying"
        );
        if attempt < settings.iterations {
            tokio::time::sleep(settings.wait).await;
        }
    }

    tracing::warn!(pending = %pending.join(", "), "Event registration gave up");
    false
}

/// Ensure `source` has an event action pointing at `callback_url`.
async fn register_source(api: &dyn PlatformApi, source: &DataSource, callback_url: &str) -> bool {
    let session = api.session();
    let action = EventAction {
        id: None,
        container_id: Some(
            source
                .container_id
                .clone()
                .unwrap_or_else(|| session.container_id.clone()),
        ),
        data_source_id: Some(source.id.clone()),
        event_type: FILE_CREATED_EVENT.to_string(),
        action_type: SEND_DATA_ACTION.to_string(),
        action_value: None,
        destination: Some(callback_url.to_string()),
        destination_data_source_id: Some(session.data_source_id.clone()),
        active: true,
    };

    match api.list_event_actions().await {
        Ok(existing) if existing.iter().any(|a| a.same_subscription(&action)) => {
            tracing::info!(data_source = %source.name, "Event action already exists");
            return true;
        }
        Ok(_) => {}
        Err(e) => {
            tracing::warn!(data_source = %source.name, error = %e, "Failed to list event actions");
            return false;
        }
    }

    match api.create_event_action(&action).await {
        Ok(_) => {
            tracing::info!(data_source = %source.name, "Created event action");
            true
        }
        Err(e) => {
            tracing::warn!(data_source = %source.name, error = %e, "Error creating event action");
            false
        }
    }
}

//! Server setup and lifecycle management

use crate::api::create_router;
use crate::api::rest::state::AppState;
use crate::config::DaemonConfig;
use crate::error::{DaemonError, DaemonResult};
use crate::pipeline::Pipeline;
use axum::Router;
use std::sync::Arc;
use supctl_platform::{register_for_events, DeepLynxClient, PlatformApi};
use tokio::net::TcpListener;

/// Supervisory control daemon server
pub struct Server {
    config: DaemonConfig,
    platform: Arc<dyn PlatformApi>,
    pipeline: Arc<Pipeline>,
}

impl Server {
    /// Validate the configuration, prepare output directories and connect
    /// to the platform.
    pub async fn new(config: DaemonConfig) -> DaemonResult<Self> {
        config.validate().map_err(DaemonError::Config)?;
        prepare_directories(&config)?;

        let client = DeepLynxClient::connect(&config.platform).await.map_err(|e| {
            tracing::error!(error = %e, base_url = %config.platform.base_url, "Could not connect to platform");
            e
        })?;

        Self::with_platform(config, Arc::new(client))
    }

    /// Build a server on an already connected platform
    pub fn with_platform(config: DaemonConfig, platform: Arc<dyn PlatformApi>) -> DaemonResult<Self> {
        let pipeline = Arc::new(Pipeline::from_config(&config, platform.clone())?);

        Ok(Self {
            config,
            platform,
            pipeline,
        })
    }

    /// Router serving the webhook and operator endpoints
    pub fn router(&self) -> Router {
        create_router(AppState::new(self.pipeline.clone()), &self.config.server)
    }

    /// Run the server
    pub async fn run(self) -> DaemonResult<()> {
        let addr = self.config.server.listen_addr;
        let app = self.router();

        // Create listener
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Supervisory control daemon listening on {}", addr);
        tracing::info!(
            webhook = %self.config.server.webhook_path,
            upper = self.config.limits.upper,
            lower = self.config.limits.lower,
            reset_policy = ?self.config.control.reset_policy,
            "Monitoring configured"
        );

        // Register for platform events in background
        if self.config.registration.enabled {
            let platform = self.platform.clone();
            let settings = self.config.registration_settings();
            tokio::spawn(async move {
                tracing::info!(callback = %settings.callback_url, "Registering for platform events");
                register_for_events(platform.as_ref(), &settings).await;
            });
        }

        // Run server with graceful shutdown
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| DaemonError::Server(e.to_string()))?;

        tracing::info!("Supervisory control daemon shutting down");
        Ok(())
    }
}

/// Create every directory the daemon writes into
pub fn prepare_directories(config: &DaemonConfig) -> DaemonResult<()> {
    for dir in config.output_dirs() {
        std::fs::create_dir_all(&dir)?;
        tracing::debug!(dir = %dir.display(), "Prepared directory");
    }
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}

//! Supervisory control daemon library
//!
//! This module provides the components of the `supctld` daemon:
//! - the notification webhook and operator REST endpoints
//! - the event-to-decision pipeline
//! - configuration loading
//! - server lifecycle management

pub mod api;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod server;

pub use config::DaemonConfig;
pub use error::{ApiError, DaemonError, PipelineError};
pub use pipeline::{Pipeline, PipelineOutcome};
pub use server::Server;

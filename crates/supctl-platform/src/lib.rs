//! DeepLynx platform client
//!
//! - [`DeepLynxClient`]: REST client with token auth, container and data
//!   source discovery, timeouts and retry with backoff
//! - [`register_for_events`]: webhook subscription on `file_created` events
//! - [`PlatformSink`]: control request submission as manual imports
//! - [`InMemoryPlatform`]: platform double for development and testing

#![deny(unsafe_code)]

pub mod client;
pub mod error;
pub mod memory;
pub mod registration;
pub mod retry;
pub mod sink;
pub mod types;

pub use client::{ClientConfig, DeepLynxClient, PlatformApi};
pub use error::{PlatformError, PlatformResult};
pub use memory::InMemoryPlatform;
pub use registration::{register_for_events, RegistrationSettings};
pub use retry::RetryPolicy;
pub use sink::PlatformSink;
pub use types::{DataSource, EventAction, ImportResult, PlatformSession, RetrievedFile};

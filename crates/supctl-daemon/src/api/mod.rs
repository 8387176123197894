//! HTTP API for supctl-daemon

pub mod rest;

pub use rest::router::create_router;

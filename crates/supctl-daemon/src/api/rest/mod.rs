//! REST surface: the notification webhook and operator endpoints

pub mod handlers;
pub mod router;
pub mod state;

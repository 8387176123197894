//! API request handlers

mod gate;
mod health;
mod notifications;

pub use gate::*;
pub use health::*;
pub use notifications::*;

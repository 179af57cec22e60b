//! # LiveSockets Traits
//!
//! Core traits and types shared across the library:
//!
//! - **LiveSocketError / Result**: the crate error taxonomy
//! - **ReconnectionStrategy**: controls backoff between reconnect attempts
//! - **NotificationSink**: the external notification collaborator

pub mod error;
pub mod reconnect;
pub mod sink;

// Re-export commonly used types
pub use error::{LiveSocketError, Result};
pub use reconnect::{ExponentialBackoff, NeverReconnect, ReconnectionStrategy};
pub use sink::{NoOpSink, NotificationSink, TracingSink};

//! Connection lifecycle: state tracking, configuration, heartbeat and the
//! client itself.

pub mod builder;
pub mod client;
pub mod config;
pub mod connection_state;
pub mod heartbeat;

// Re-export main types
pub use builder::RealtimeClientBuilder;
pub use client::{Metrics, RealtimeClient};
pub use config::ClientConfig;
pub use connection_state::{AtomicConnectionState, AtomicMetrics, ConnectionState};

// Re-export traits for convenience
pub use crate::traits::*;

/// Create a new realtime client builder
///
/// This is a convenience function for starting the builder pattern.
///
/// # Example
/// ```ignore
/// let router = Arc::new(MessageRouter::new());
/// let client = livesockets::builder()
///     .url("wss://realtime.appforge.dev/ws")
///     .router(Arc::clone(&router))
///     .user_id("user-42")
///     .build();
/// ```
pub fn builder() -> RealtimeClientBuilder<builder::states::NoUrl, builder::states::NoRouter> {
    RealtimeClientBuilder::new()
}

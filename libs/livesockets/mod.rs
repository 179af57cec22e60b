//! # LiveSockets
//!
//! Realtime update client for the AppForge platform: server-pushed generation
//! progress, deployment progress, and ad-hoc notifications over a single
//! persistent WebSocket connection.
//!
//! ## Features
//!
//! - **Single duplex connection**: one socket, exclusively owned by the
//!   connection supervisor task
//! - **Heartbeat**: periodic application-level pings with automatic pong
//!   replies to server pings
//! - **Typed envelopes**: tagged message kinds with an unknown-type fallback
//! - **Topic registry**: ordered listener sets with handle-based removal
//! - **Resource subscriptions**: per-id reactive views over the update stream
//! - **Reconnection**: exponential backoff on unexpected closes, suppressed
//!   by manual disconnect
//!
//! ## Example
//!
//! ```rust,ignore
//! use livesockets::{GenerationSubscription, MessageRouter, NotificationBridge, TracingSink};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> livesockets::Result<()> {
//!     let router = Arc::new(MessageRouter::new());
//!     let client = livesockets::builder()
//!         .url("wss://realtime.appforge.dev/ws")
//!         .router(Arc::clone(&router))
//!         .user_id("user-42")
//!         .build();
//!
//!     let _bridge = NotificationBridge::new(Arc::clone(&router), Arc::new(TracingSink));
//!
//!     let mut generation = GenerationSubscription::new(Arc::clone(&router));
//!     generation.track(Some("gen-123".to_string()));
//!
//!     client.connect().await?;
//!     // ... poll generation.progress() / generation.is_completed()
//!     client.disconnect().await;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod notify;
pub mod protocol;
pub mod router;
pub mod subscribe;
pub mod traits;

// Re-export all traits
pub use traits::*;

// Re-export the wire model
pub use protocol::{
    DeploymentStatus, DeploymentUpdate, Envelope, GeneratedFile, GenerationStatus,
    GenerationUpdate, MessageKind, Notification, NotificationKind, Progress,
};

// Re-export core client functionality
pub use crate::core::{
    builder, client, config, connection_state, heartbeat,
    builder::RealtimeClientBuilder,
    client::{Metrics, RealtimeClient},
    config::ClientConfig,
    connection_state::{AtomicConnectionState, AtomicMetrics, ConnectionState},
};

// Re-export routing and the adapters built on top of it
pub use router::{ListenerHandle, MessageRouter, Topic};
pub use subscribe::{
    DeploymentSubscription, GenerationSubscription, ResourceSubscription, ResourceUpdate,
};
pub use notify::NotificationBridge;

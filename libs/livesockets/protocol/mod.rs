//! Wire model for the realtime protocol
//!
//! Every frame exchanged over the socket is a JSON [`Envelope`] carrying a
//! [`MessageKind`] tag, an opaque `data` payload, a sender-side timestamp and
//! an optional user id. The typed payloads for the known kinds live alongside
//! it: [`GenerationUpdate`], [`DeploymentUpdate`] and [`Notification`].

pub mod deployment;
pub mod envelope;
pub mod generation;
pub mod notification;
pub mod progress;

pub use deployment::{DeploymentStatus, DeploymentUpdate};
pub use envelope::{Envelope, MessageKind};
pub use generation::{GeneratedFile, GenerationStatus, GenerationUpdate};
pub use notification::{Notification, NotificationKind};
pub use progress::Progress;

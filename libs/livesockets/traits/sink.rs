use crate::protocol::{Notification, NotificationKind};
use async_trait::async_trait;
use tracing::{error, info, warn};

/// Trait for the external notification collaborator
///
/// The bridge forwards server-pushed notification payloads and its own
/// synthesized transport-status notifications into this sink. Delivery is
/// fire-and-forget: no return value is consumed.
#[async_trait]
pub trait NotificationSink: Send + Sync + 'static {
    /// Deliver a notification
    async fn notify(&self, notification: Notification);
}

/// A no-op sink that discards all notifications
pub struct NoOpSink;

#[async_trait]
impl NotificationSink for NoOpSink {
    async fn notify(&self, _notification: Notification) {}
}

/// Sink that logs notifications through tracing
pub struct TracingSink;

#[async_trait]
impl NotificationSink for TracingSink {
    async fn notify(&self, notification: Notification) {
        match notification.kind {
            NotificationKind::Error => {
                error!(title = %notification.title, "{}", notification.message)
            }
            NotificationKind::Warning => {
                warn!(title = %notification.title, "{}", notification.message)
            }
            _ => info!(title = %notification.title, "{}", notification.message),
        }
    }
}

//! Notification bridge
//!
//! Forwards server-pushed `notification` envelopes verbatim into the
//! external [`NotificationSink`], and synthesizes local transport-status
//! notifications from the router's connect/disconnect/error events. Both
//! flavors use the same sink.

use crate::protocol::{MessageKind, Notification, NotificationKind};
use crate::router::{ListenerHandle, MessageRouter};
use crate::traits::NotificationSink;
use std::sync::Arc;
use tracing::warn;

/// Bridges the realtime stream into the notification collaborator
///
/// Registers its listeners on construction and removes them when dropped.
pub struct NotificationBridge {
    router: Arc<MessageRouter>,
    handles: Vec<ListenerHandle>,
}

impl NotificationBridge {
    pub fn new(router: Arc<MessageRouter>, sink: Arc<dyn NotificationSink>) -> Self {
        let mut handles = Vec::with_capacity(4);

        // Server-pushed notifications, filtered here rather than in the router
        let forward = Arc::clone(&sink);
        handles.push(router.on_message(move |envelope| {
            if envelope.kind != MessageKind::Notification {
                return;
            }
            let notification: Notification = match serde_json::from_value(envelope.data.clone()) {
                Ok(notification) => notification,
                Err(e) => {
                    warn!("dropping malformed notification payload: {}", e);
                    return;
                }
            };
            deliver(&forward, notification);
        }));

        // Local transport-status notifications
        let connected = Arc::clone(&sink);
        handles.push(router.on_connect(move || {
            deliver(
                &connected,
                Notification::new(
                    NotificationKind::Success,
                    "Connected",
                    "Realtime connection established",
                ),
            );
        }));

        let failed = Arc::clone(&sink);
        handles.push(router.on_error(move |message| {
            deliver(
                &failed,
                Notification::new(NotificationKind::Error, "Connection failed", message),
            );
        }));

        let interrupted = Arc::clone(&sink);
        handles.push(router.on_disconnect(move || {
            deliver(
                &interrupted,
                Notification::new(
                    NotificationKind::Warning,
                    "Connection interrupted",
                    "Realtime connection lost",
                ),
            );
        }));

        Self { router, handles }
    }
}

impl Drop for NotificationBridge {
    fn drop(&mut self) {
        for handle in self.handles.drain(..) {
            self.router.remove(handle);
        }
    }
}

/// Fire-and-forget delivery into the sink
///
/// Requires a running Tokio runtime; outside one the notification is
/// dropped with a warning.
fn deliver(sink: &Arc<dyn NotificationSink>, notification: Notification) {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            let sink = Arc::clone(sink);
            handle.spawn(async move {
                sink.notify(notification).await;
            });
        }
        Err(_) => warn!(
            title = %notification.title,
            "notification dropped: no async runtime available"
        ),
    }
}

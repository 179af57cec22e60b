//! Message routing and the listener registry
//!
//! The router is an explicitly constructed object, created once at
//! application startup and shared (via `Arc`) between the client, the
//! subscription adapters and the notification bridge — there is no
//! module-level global channel.
//!
//! # Topics and ordering
//!
//! ```text
//! socket ──> parse ──> ping/pong? (intercepted by the connection loop)
//!                          │
//!                          └─> broadcast ──> message listeners, in
//!                                            registration order, exactly once
//! connect/disconnect/error transitions ──> their own listener sets
//! ```
//!
//! Listeners are not filtered by envelope kind here; narrowing by kind/id is
//! the subscription adapters' job. Each listener runs inside its own panic
//! boundary so one panicking listener cannot suppress delivery to the others.

use crate::protocol::Envelope;
use crate::traits::{LiveSocketError, Result};
use parking_lot::RwLock;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error};

type MessageListener = Arc<dyn Fn(&Envelope) + Send + Sync>;
type EventListener = Arc<dyn Fn() + Send + Sync>;
type ErrorListener = Arc<dyn Fn(&str) + Send + Sync>;

/// Topic a listener is registered under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    /// Every non-control envelope
    Message,
    /// Fired once per successful open
    Connect,
    /// Fired once per close of an open connection
    Disconnect,
    /// Fired once per transport error
    Error,
}

/// Handle returned at registration time
///
/// Removal requires the handle: it is the listener's stable identity.
/// Registering the same closure twice yields two independent entries.
#[derive(Debug)]
pub struct ListenerHandle {
    topic: Topic,
    id: u64,
}

impl ListenerHandle {
    pub fn topic(&self) -> Topic {
        self.topic
    }
}

#[derive(Default)]
struct Registry {
    message: Vec<(u64, MessageListener)>,
    connect: Vec<(u64, EventListener)>,
    disconnect: Vec<(u64, EventListener)>,
    error: Vec<(u64, ErrorListener)>,
}

/// Parses inbound frames and fans envelopes out to registered listeners
pub struct MessageRouter {
    registry: RwLock<Registry>,
    next_id: AtomicU64,
}

impl MessageRouter {
    pub fn new() -> Self {
        Self {
            registry: RwLock::new(Registry::default()),
            next_id: AtomicU64::new(1),
        }
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Parse an inbound frame as an [`Envelope`]
    ///
    /// The caller logs and drops failures; they never reach listeners.
    pub fn parse(&self, frame: &str) -> Result<Envelope> {
        serde_json::from_str(frame).map_err(|e| LiveSocketError::Parse(e.to_string()))
    }

    /// Register a listener for every non-control envelope
    pub fn on_message(
        &self,
        listener: impl Fn(&Envelope) + Send + Sync + 'static,
    ) -> ListenerHandle {
        let id = self.next_id();
        self.registry.write().message.push((id, Arc::new(listener)));
        ListenerHandle {
            topic: Topic::Message,
            id,
        }
    }

    /// Register a listener for successful opens
    pub fn on_connect(&self, listener: impl Fn() + Send + Sync + 'static) -> ListenerHandle {
        let id = self.next_id();
        self.registry.write().connect.push((id, Arc::new(listener)));
        ListenerHandle {
            topic: Topic::Connect,
            id,
        }
    }

    /// Register a listener for closes of an open connection
    pub fn on_disconnect(&self, listener: impl Fn() + Send + Sync + 'static) -> ListenerHandle {
        let id = self.next_id();
        self.registry
            .write()
            .disconnect
            .push((id, Arc::new(listener)));
        ListenerHandle {
            topic: Topic::Disconnect,
            id,
        }
    }

    /// Register a listener for transport errors
    pub fn on_error(&self, listener: impl Fn(&str) + Send + Sync + 'static) -> ListenerHandle {
        let id = self.next_id();
        self.registry.write().error.push((id, Arc::new(listener)));
        ListenerHandle {
            topic: Topic::Error,
            id,
        }
    }

    /// Remove exactly the listener the handle was issued for
    ///
    /// Removing a handle that is no longer registered is a no-op.
    pub fn remove(&self, handle: ListenerHandle) {
        let mut registry = self.registry.write();
        let removed = match handle.topic {
            Topic::Message => remove_entry(&mut registry.message, handle.id),
            Topic::Connect => remove_entry(&mut registry.connect, handle.id),
            Topic::Disconnect => remove_entry(&mut registry.disconnect, handle.id),
            Topic::Error => remove_entry(&mut registry.error, handle.id),
        };
        if !removed {
            debug!(topic = ?handle.topic, id = handle.id, "listener already removed");
        }
    }

    /// Number of listeners currently registered for a topic
    pub fn listener_count(&self, topic: Topic) -> usize {
        let registry = self.registry.read();
        match topic {
            Topic::Message => registry.message.len(),
            Topic::Connect => registry.connect.len(),
            Topic::Disconnect => registry.disconnect.len(),
            Topic::Error => registry.error.len(),
        }
    }

    /// Fan a non-control envelope out to every message listener
    ///
    /// Listeners are invoked in registration order, exactly once each.
    pub fn broadcast(&self, envelope: &Envelope) {
        let listeners: Vec<MessageListener> = {
            let registry = self.registry.read();
            registry.message.iter().map(|(_, l)| Arc::clone(l)).collect()
        };

        for listener in listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(envelope))).is_err() {
                error!(kind = ?envelope.kind, "message listener panicked during dispatch");
            }
        }
    }

    /// Fire the connect listeners
    pub fn emit_connect(&self) {
        for listener in self.event_listeners(Topic::Connect) {
            if catch_unwind(AssertUnwindSafe(|| listener())).is_err() {
                error!("connect listener panicked");
            }
        }
    }

    /// Fire the disconnect listeners
    pub fn emit_disconnect(&self) {
        for listener in self.event_listeners(Topic::Disconnect) {
            if catch_unwind(AssertUnwindSafe(|| listener())).is_err() {
                error!("disconnect listener panicked");
            }
        }
    }

    /// Fire the error listeners with the transport error text
    pub fn emit_error(&self, message: &str) {
        let listeners: Vec<ErrorListener> = {
            let registry = self.registry.read();
            registry.error.iter().map(|(_, l)| Arc::clone(l)).collect()
        };

        for listener in listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(message))).is_err() {
                error!("error listener panicked");
            }
        }
    }

    fn event_listeners(&self, topic: Topic) -> Vec<EventListener> {
        let registry = self.registry.read();
        let entries = match topic {
            Topic::Connect => &registry.connect,
            Topic::Disconnect => &registry.disconnect,
            _ => return Vec::new(),
        };
        entries.iter().map(|(_, l)| Arc::clone(l)).collect()
    }
}

impl Default for MessageRouter {
    fn default() -> Self {
        Self::new()
    }
}

fn remove_entry<T>(entries: &mut Vec<(u64, T)>, id: u64) -> bool {
    let before = entries.len();
    entries.retain(|(entry_id, _)| *entry_id != id);
    entries.len() != before
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::MessageKind;
    use parking_lot::Mutex;
    use serde_json::json;

    fn update_envelope(id: &str) -> Envelope {
        Envelope::new(
            MessageKind::GenerationUpdate,
            json!({"generationId": id, "status": "generating"}),
        )
    }

    #[test]
    fn test_broadcast_in_registration_order_exactly_once() {
        let router = MessageRouter::new();
        let calls = Arc::new(Mutex::new(Vec::new()));

        for tag in 1..=3 {
            let calls = Arc::clone(&calls);
            router.on_message(move |_| calls.lock().push(tag));
        }

        router.broadcast(&update_envelope("g1"));
        assert_eq!(*calls.lock(), vec![1, 2, 3]);
    }

    #[test]
    fn test_remove_exact_listener() {
        let router = MessageRouter::new();
        let calls = Arc::new(Mutex::new(Vec::new()));

        let first = {
            let calls = Arc::clone(&calls);
            router.on_message(move |_| calls.lock().push("first"))
        };
        {
            let calls = Arc::clone(&calls);
            router.on_message(move |_| calls.lock().push("second"));
        }

        router.remove(first);
        router.broadcast(&update_envelope("g1"));
        assert_eq!(*calls.lock(), vec!["second"]);
        assert_eq!(router.listener_count(Topic::Message), 1);
    }

    #[test]
    fn test_remove_absent_handle_is_noop() {
        let router = MessageRouter::new();
        let handle = router.on_connect(|| {});
        let other = router.on_connect(|| {});

        router.remove(handle);
        // Second removal of the same slot must not disturb the survivor
        router.remove(ListenerHandle {
            topic: Topic::Connect,
            id: 999,
        });
        router.remove(other);
        assert_eq!(router.listener_count(Topic::Connect), 0);
    }

    #[test]
    fn test_same_closure_registered_twice_runs_twice() {
        let router = MessageRouter::new();
        let count = Arc::new(Mutex::new(0usize));

        for _ in 0..2 {
            let count = Arc::clone(&count);
            router.on_message(move |_| *count.lock() += 1);
        }

        router.broadcast(&update_envelope("g1"));
        assert_eq!(*count.lock(), 2);
    }

    #[test]
    fn test_panicking_listener_does_not_suppress_siblings() {
        let router = MessageRouter::new();
        let calls = Arc::new(Mutex::new(Vec::new()));

        {
            let calls = Arc::clone(&calls);
            router.on_message(move |_| calls.lock().push("before"));
        }
        router.on_message(|_| panic!("listener blew up"));
        {
            let calls = Arc::clone(&calls);
            router.on_message(move |_| calls.lock().push("after"));
        }

        router.broadcast(&update_envelope("g1"));
        assert_eq!(*calls.lock(), vec!["before", "after"]);
    }

    #[test]
    fn test_parse_failure_is_an_error() {
        let router = MessageRouter::new();
        assert!(router.parse("not json at all").is_err());
        assert!(router
            .parse(r#"{"type": "ping", "timestamp": "2024-05-01T12:00:00Z"}"#)
            .is_ok());
    }

    #[test]
    fn test_event_listener_sets_are_independent() {
        let router = MessageRouter::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        {
            let log = Arc::clone(&log);
            router.on_connect(move || log.lock().push("connect"));
        }
        {
            let log = Arc::clone(&log);
            router.on_disconnect(move || log.lock().push("disconnect"));
        }
        {
            let log = Arc::clone(&log);
            router.on_error(move |message| log.lock().push(if message.is_empty() {
                "error"
            } else {
                "error-with-message"
            }));
        }

        router.emit_connect();
        router.emit_error("boom");
        router.emit_disconnect();

        assert_eq!(*log.lock(), vec!["connect", "error-with-message", "disconnect"]);
    }
}

//! Resource-scoped subscription adapters
//!
//! An adapter narrows the router's generic message stream down to updates
//! for one identified resource and exposes a reactive view over the latest
//! snapshot. Semantics are live-tail from subscription time: an update
//! broadcast before the adapter registered its listener is missed and never
//! recovered — there is no replay or catch-up.

use crate::protocol::{DeploymentUpdate, GenerationUpdate, MessageKind, Progress};
use crate::router::{ListenerHandle, MessageRouter};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::warn;

/// A payload type that can be tailed per resource id
pub trait ResourceUpdate: DeserializeOwned + Clone + Send + Sync + 'static {
    /// Envelope kind carrying this update
    const KIND: MessageKind;

    /// Identifier matched against the tracked id
    fn resource_id(&self) -> &str;

    fn progress(&self) -> &Progress;

    fn is_completed(&self) -> bool;

    fn is_failed(&self) -> bool;

    fn is_cancelled(&self) -> bool {
        false
    }
}

impl ResourceUpdate for GenerationUpdate {
    const KIND: MessageKind = MessageKind::GenerationUpdate;

    fn resource_id(&self) -> &str {
        &self.generation_id
    }

    fn progress(&self) -> &Progress {
        &self.progress
    }

    fn is_completed(&self) -> bool {
        GenerationUpdate::is_completed(self)
    }

    fn is_failed(&self) -> bool {
        GenerationUpdate::is_failed(self)
    }

    fn is_cancelled(&self) -> bool {
        GenerationUpdate::is_cancelled(self)
    }
}

impl ResourceUpdate for DeploymentUpdate {
    const KIND: MessageKind = MessageKind::DeploymentUpdate;

    fn resource_id(&self) -> &str {
        &self.deployment_id
    }

    fn progress(&self) -> &Progress {
        &self.progress
    }

    fn is_completed(&self) -> bool {
        DeploymentUpdate::is_completed(self)
    }

    fn is_failed(&self) -> bool {
        DeploymentUpdate::is_failed(self)
    }
}

struct View<U> {
    latest: Option<U>,
    loading: bool,
}

impl<U> View<U> {
    fn empty(loading: bool) -> Self {
        Self {
            latest: None,
            loading,
        }
    }
}

/// Reactive view over the latest update for one resource id
///
/// Created detached; point it at a resource with [`track`](Self::track).
/// Each id gets a fresh view: switching ids (or detaching) never carries
/// state over, and an update for a previous id that races the switch can
/// only touch the orphaned view.
pub struct ResourceSubscription<U: ResourceUpdate> {
    router: Arc<MessageRouter>,
    view: Arc<Mutex<View<U>>>,
    listener: Option<ListenerHandle>,
    resource_id: Option<String>,
}

impl<U: ResourceUpdate> ResourceSubscription<U> {
    pub fn new(router: Arc<MessageRouter>) -> Self {
        Self {
            router,
            view: Arc::new(Mutex::new(View::empty(false))),
            listener: None,
            resource_id: None,
        }
    }

    /// Point the adapter at a resource id, or detach with `None`
    ///
    /// A non-null id resets the view to loading and registers a listener
    /// accepting only envelopes of this payload's kind whose id matches.
    /// The first match stores the snapshot and clears loading; later
    /// matches replace the snapshot.
    pub fn track(&mut self, resource_id: Option<String>) {
        self.detach();

        let Some(id) = resource_id else {
            return;
        };

        let view = Arc::new(Mutex::new(View::empty(true)));
        self.view = Arc::clone(&view);

        let target = id.clone();
        let handle = self.router.on_message(move |envelope| {
            if envelope.kind != U::KIND {
                return;
            }
            let update: U = match serde_json::from_value(envelope.data.clone()) {
                Ok(update) => update,
                Err(e) => {
                    warn!(kind = ?envelope.kind, "dropping update with malformed payload: {}", e);
                    return;
                }
            };
            if update.resource_id() != target {
                return;
            }

            let mut view = view.lock();
            view.latest = Some(update);
            view.loading = false;
        });

        self.listener = Some(handle);
        self.resource_id = Some(id);
    }

    fn detach(&mut self) {
        if let Some(handle) = self.listener.take() {
            self.router.remove(handle);
        }
        self.resource_id = None;
        self.view = Arc::new(Mutex::new(View::empty(false)));
    }

    /// Id currently tracked, if any
    pub fn resource_id(&self) -> Option<&str> {
        self.resource_id.as_deref()
    }

    /// Latest update received for the tracked id
    pub fn snapshot(&self) -> Option<U> {
        self.view.lock().latest.clone()
    }

    /// True from id assignment until the first matching update arrives
    pub fn is_loading(&self) -> bool {
        self.view.lock().loading
    }

    pub fn is_completed(&self) -> bool {
        self.view
            .lock()
            .latest
            .as_ref()
            .map(|update| update.is_completed())
            .unwrap_or(false)
    }

    pub fn is_failed(&self) -> bool {
        self.view
            .lock()
            .latest
            .as_ref()
            .map(|update| update.is_failed())
            .unwrap_or(false)
    }

    pub fn is_cancelled(&self) -> bool {
        self.view
            .lock()
            .latest
            .as_ref()
            .map(|update| update.is_cancelled())
            .unwrap_or(false)
    }

    /// Progress of the latest snapshot, or an empty block while none exists
    pub fn progress(&self) -> Progress {
        self.view
            .lock()
            .latest
            .as_ref()
            .map(|update| update.progress().clone())
            .unwrap_or_default()
    }
}

impl<U: ResourceUpdate> Drop for ResourceSubscription<U> {
    fn drop(&mut self) {
        if let Some(handle) = self.listener.take() {
            self.router.remove(handle);
        }
    }
}

/// Adapter over [`GenerationUpdate`] envelopes
pub type GenerationSubscription = ResourceSubscription<GenerationUpdate>;

/// Adapter over [`DeploymentUpdate`] envelopes
pub type DeploymentSubscription = ResourceSubscription<DeploymentUpdate>;

pub mod states;

use crate::core::client::RealtimeClient;
use crate::core::config::{ClientConfig, DEFAULT_HEARTBEAT_INTERVAL};
use crate::router::MessageRouter;
use crate::traits::{ExponentialBackoff, ReconnectionStrategy};
use states::*;
use std::sync::Arc;
use std::time::Duration;

/// Type-state builder for [`RealtimeClient`]
///
/// The URL and the shared message router are required and enforced at
/// compile time: `build()` only exists once both have been provided. The
/// router is constructed by the application and injected here so the same
/// instance can be shared with subscription adapters and the notification
/// bridge.
pub struct RealtimeClientBuilder<U, Ro>
where
    U: UrlState,
    Ro: RouterState,
{
    _state: TypeState<U, Ro>,
    url: Option<String>,
    router: Option<Arc<MessageRouter>>,
    user_id: Option<String>,
    heartbeat_interval: Duration,
    reconnect_strategy: Option<Box<dyn ReconnectionStrategy>>,
}

impl RealtimeClientBuilder<NoUrl, NoRouter> {
    /// Create a new builder instance
    pub fn new() -> Self {
        Self {
            _state: TypeState::new(),
            url: None,
            router: None,
            user_id: None,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            reconnect_strategy: None,
        }
    }
}

impl Default for RealtimeClientBuilder<NoUrl, NoRouter> {
    fn default() -> Self {
        Self::new()
    }
}

// URL setting
impl<Ro> RealtimeClientBuilder<NoUrl, Ro>
where
    Ro: RouterState,
{
    pub fn url(self, url: impl Into<String>) -> RealtimeClientBuilder<HasUrl, Ro> {
        RealtimeClientBuilder {
            _state: TypeState::new(),
            url: Some(url.into()),
            router: self.router,
            user_id: self.user_id,
            heartbeat_interval: self.heartbeat_interval,
            reconnect_strategy: self.reconnect_strategy,
        }
    }
}

// Router setting
impl<U> RealtimeClientBuilder<U, NoRouter>
where
    U: UrlState,
{
    pub fn router(self, router: Arc<MessageRouter>) -> RealtimeClientBuilder<U, HasRouter> {
        RealtimeClientBuilder {
            _state: TypeState::new(),
            url: self.url,
            router: Some(router),
            user_id: self.user_id,
            heartbeat_interval: self.heartbeat_interval,
            reconnect_strategy: self.reconnect_strategy,
        }
    }
}

// Optional configuration methods
impl<U, Ro> RealtimeClientBuilder<U, Ro>
where
    U: UrlState,
    Ro: RouterState,
{
    /// Embed a user identifier as a query parameter on the endpoint
    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Override the heartbeat interval (default: 30s)
    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Override the reconnection strategy
    ///
    /// The default is exponential backoff: 1s base, 30s cap, 5 attempts,
    /// no jitter.
    pub fn reconnect_strategy(mut self, strategy: impl ReconnectionStrategy + 'static) -> Self {
        self.reconnect_strategy = Some(Box::new(strategy));
        self
    }
}

// Build method - only available when all required fields are set
impl RealtimeClientBuilder<HasUrl, HasRouter> {
    pub fn build(self) -> RealtimeClient {
        let config = ClientConfig {
            url: self.url.expect("URL must be set"),
            user_id: self.user_id,
            heartbeat_interval: self.heartbeat_interval,
            reconnect_strategy: self
                .reconnect_strategy
                .unwrap_or_else(|| Box::new(ExponentialBackoff::default())),
        };

        RealtimeClient::new(config, self.router.expect("router must be set"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::connection_state::ConnectionState;

    #[test]
    fn test_build_with_required_fields() {
        let router = Arc::new(MessageRouter::new());
        let client = RealtimeClientBuilder::new()
            .url("ws://localhost:8080/ws")
            .router(router)
            .build();

        assert_eq!(client.connection_state(), ConnectionState::Closed);
    }

    #[test]
    fn test_optional_fields_flow_through() {
        let router = Arc::new(MessageRouter::new());
        let client = RealtimeClientBuilder::new()
            .url("ws://localhost:8080/ws")
            .user_id("user-42")
            .heartbeat_interval(Duration::from_secs(5))
            .router(router)
            .build();

        assert!(!client.is_connected());
    }
}

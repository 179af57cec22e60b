use crate::traits::ReconnectionStrategy;
use std::time::Duration;

/// Default interval between heartbeat pings
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Configuration for [`RealtimeClient`](crate::RealtimeClient)
///
/// Built via the type-state builder; the URL and the router are enforced at
/// compile time.
pub struct ClientConfig {
    /// WebSocket URL (wss:// or ws://)
    pub(crate) url: String,

    /// Optional user identifier, embedded as a query parameter
    pub(crate) user_id: Option<String>,

    /// Interval between heartbeat pings
    pub(crate) heartbeat_interval: Duration,

    /// Reconnection strategy applied after unexpected closes
    pub(crate) reconnect_strategy: Box<dyn ReconnectionStrategy>,
}

impl ClientConfig {
    /// Get a reference to the configured URL
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn heartbeat_interval(&self) -> Duration {
        self.heartbeat_interval
    }

    pub(crate) fn reconnect_strategy(&self) -> &dyn ReconnectionStrategy {
        self.reconnect_strategy.as_ref()
    }

    /// The endpoint actually dialed, with the user id embedded when set
    pub(crate) fn endpoint(&self) -> String {
        match &self.user_id {
            Some(user_id) => {
                let separator = if self.url.contains('?') { '&' } else { '?' };
                format!("{}{}userId={}", self.url, separator, user_id)
            }
            None => self.url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::ExponentialBackoff;

    fn config(url: &str, user_id: Option<&str>) -> ClientConfig {
        ClientConfig {
            url: url.to_string(),
            user_id: user_id.map(str::to_string),
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            reconnect_strategy: Box::new(ExponentialBackoff::default()),
        }
    }

    #[test]
    fn test_endpoint_without_user_id() {
        let config = config("ws://localhost:8080/ws", None);
        assert_eq!(config.endpoint(), "ws://localhost:8080/ws");
    }

    #[test]
    fn test_endpoint_embeds_user_id() {
        let config = config("wss://realtime.appforge.dev/ws", Some("user-42"));
        assert_eq!(
            config.endpoint(),
            "wss://realtime.appforge.dev/ws?userId=user-42"
        );
    }

    #[test]
    fn test_endpoint_appends_to_existing_query() {
        let config = config("wss://realtime.appforge.dev/ws?v=2", Some("user-42"));
        assert_eq!(
            config.endpoint(),
            "wss://realtime.appforge.dev/ws?v=2&userId=user-42"
        );
    }
}

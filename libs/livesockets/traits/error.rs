use thiserror::Error;

/// Main error type for livesockets
#[derive(Error, Debug)]
pub enum LiveSocketError {
    /// WebSocket connection error
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Connection closed unexpectedly
    #[error("Connection closed: {0}")]
    ConnectionClosed(String),

    /// Inbound frame could not be parsed as an envelope
    #[error("Parse error: {0}")]
    Parse(String),

    /// Channel send error
    #[error("Channel send error: {0}")]
    ChannelSend(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Result type for livesockets operations
pub type Result<T> = std::result::Result<T, LiveSocketError>;

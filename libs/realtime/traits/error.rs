use thiserror::Error;

/// Main error type for the realtime client
#[derive(Error, Debug)]
pub enum RealtimeError {
    /// WebSocket transport error
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Connection closed unexpectedly
    #[error("Connection closed: {0}")]
    ConnectionClosed(String),

    /// Server refused the namespace connect
    #[error("Connect error: {0}")]
    ConnectRefused(String),

    /// Authentication payload could not be produced
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Malformed Socket.IO / Engine.IO frame
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Capability probe failed; push layer disabled for this session
    #[error("Push endpoint unavailable: {0}")]
    Unavailable(String),

    /// Channel send error
    #[error("Channel send error: {0}")]
    ChannelSend(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// No PONG arrived within the heartbeat timeout
    #[error("Heartbeat timed out after {0:?}")]
    HeartbeatTimeout(std::time::Duration),

    /// Event handler failure
    #[error("Handler error: {0}")]
    Handler(String),
}

/// Result type for realtime operations
pub type Result<T> = std::result::Result<T, RealtimeError>;

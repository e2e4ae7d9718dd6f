use crate::traits::*;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

/// Configuration for [`RealtimeClient`](crate::client::RealtimeClient)
///
/// Built with the type-state builder; the reconnection strategy is handed to
/// the connection state machine separately since it is owned by the task.
pub struct ClientConfig {
    /// WebSocket transport URL (`ws://` or `wss://`)
    pub(crate) url: String,

    /// Optional HTTP capability probe URL
    pub(crate) probe_url: Option<String>,

    /// Timeout applied to the capability probe
    pub(crate) probe_timeout: Duration,

    /// Receives server events and lifecycle changes
    pub(crate) handler: Arc<dyn EventHandler>,

    /// Optional authentication event provider
    pub(crate) auth: Option<Arc<dyn AuthProvider>>,

    /// Application heartbeat interval (`ping {timestamp}`)
    pub(crate) heartbeat_interval: Option<Duration>,

    /// Time allowed between a heartbeat ping and its pong
    pub(crate) pong_timeout: Duration,

    /// Transport-level ping answering
    pub(crate) passive_ping: Arc<dyn PassivePingDetector>,

    /// Shutdown flag - when false, the task stops and never reconnects
    pub(crate) shutdown_flag: Arc<AtomicBool>,
}

impl ClientConfig {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn probe_url(&self) -> Option<&str> {
        self.probe_url.as_deref()
    }

    pub fn has_auth(&self) -> bool {
        self.auth.is_some()
    }

    pub fn heartbeat_interval(&self) -> Option<Duration> {
        self.heartbeat_interval
    }

    pub fn pong_timeout(&self) -> Duration {
        self.pong_timeout
    }
}

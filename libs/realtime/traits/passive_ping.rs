/// Trait for detecting and answering transport-level pings
///
/// Engine.IO servers probe liveness with their own ping frames, which
/// are unrelated to the application heartbeat. Detected frames are
/// answered immediately and never reach the event handler.
///
/// ```text
/// Server ──["2"]──> Client
///                    ├─> is_ping() == true
///                    └─> pong_response() ──["3"]──> Server
/// ```
pub trait PassivePingDetector: Send + Sync {
    /// Check if a raw text frame is a passive ping
    fn is_ping(&self, frame: &str) -> bool;

    /// The frame to send back when a ping is detected
    fn pong_response(&self) -> String;
}

/// Never detects pings
pub struct NoOpPassivePing;

impl PassivePingDetector for NoOpPassivePing {
    fn is_ping(&self, _frame: &str) -> bool {
        false
    }

    fn pong_response(&self) -> String {
        String::new()
    }
}

/// Engine.IO v4 ping: server sends `2`, client answers `3`
pub struct EngineIoPing;

impl PassivePingDetector for EngineIoPing {
    fn is_ping(&self, frame: &str) -> bool {
        frame == "2"
    }

    fn pong_response(&self) -> String {
        "3".to_string()
    }
}

/// Exact text match detector with a configured response
pub struct TextPassivePing {
    ping_text: String,
    pong_response: String,
}

impl TextPassivePing {
    pub fn new(ping_text: impl Into<String>, pong_response: impl Into<String>) -> Self {
        Self {
            ping_text: ping_text.into(),
            pong_response: pong_response.into(),
        }
    }
}

impl PassivePingDetector for TextPassivePing {
    fn is_ping(&self, frame: &str) -> bool {
        frame == self.ping_text
    }

    fn pong_response(&self) -> String {
        self.pong_response.clone()
    }
}

//! Connection lifecycle state machine
//!
//! Pure bookkeeping with no I/O: the client task feeds transport outcomes in
//! and performs whatever the returned [`LifecycleEvent`]s ask for (sleep for a
//! scheduled delay, give up, notify the handler).
//!
//! ```text
//! Disconnected ──begin_connect──> Connecting ──on_connected──> Connected
//!      ▲                              │                           │
//!      │                        on_connect_error            on_disconnected
//!      │                              ▼                           ▼
//!      └──── budget exhausted ── ReconnectScheduled <──────── Disconnected
//! ```

use crate::core::connection_state::ConnectionState;
use crate::traits::{LifecycleEvent, ReconnectionStrategy};
use tracing::{debug, info, warn};

/// Reason reported when the server drops the namespace (`41` frame)
pub const SERVER_DISCONNECT: &str = "io server disconnect";

/// Reason reported when the client closes on purpose
pub const CLIENT_DISCONNECT: &str = "io client disconnect";

/// Reason reported when the heartbeat pong did not arrive in time
pub const PING_TIMEOUT: &str = "ping timeout";

/// Reason reported when the socket stream ends or errors
pub const TRANSPORT_CLOSE: &str = "transport close";

pub struct ConnectionMachine {
    state: ConnectionState,
    attempts: usize,
    exhausted: bool,
    strategy: Box<dyn ReconnectionStrategy>,
}

impl ConnectionMachine {
    pub fn new(strategy: Box<dyn ReconnectionStrategy>) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            attempts: 0,
            exhausted: false,
            strategy,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Reconnect attempts since the last successful connect
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// True once the reconnect budget is spent
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Move to `Connecting`
    ///
    /// Returns false when the machine refuses to connect (budget exhausted,
    /// already connected or shutting down).
    pub fn begin_connect(&mut self) -> bool {
        if self.exhausted {
            return false;
        }
        match self.state {
            ConnectionState::Disconnected | ConnectionState::ReconnectScheduled => {
                self.state = ConnectionState::Connecting;
                true
            }
            _ => false,
        }
    }

    /// Namespace connect acknowledged
    pub fn on_connected(&mut self) -> Vec<LifecycleEvent> {
        if self.attempts > 0 {
            info!("Reconnected after {} attempt(s)", self.attempts);
        }
        self.state = ConnectionState::Connected;
        self.attempts = 0;
        vec![LifecycleEvent::Connected]
    }

    /// An established connection went away
    pub fn on_disconnected(&mut self, reason: &str) -> Vec<LifecycleEvent> {
        if self.state == ConnectionState::ShuttingDown {
            return Vec::new();
        }
        self.state = ConnectionState::Disconnected;
        let mut events = vec![LifecycleEvent::Disconnected {
            reason: reason.to_string(),
        }];

        if reason == CLIENT_DISCONNECT {
            debug!("Client-initiated disconnect, not reconnecting");
            return events;
        }

        events.push(self.schedule_reconnect());
        events
    }

    /// A connection attempt failed before the connect acknowledgment
    pub fn on_connect_error(&mut self, error: &str) -> Vec<LifecycleEvent> {
        if self.state == ConnectionState::ShuttingDown {
            return Vec::new();
        }
        if self.state == ConnectionState::Connected {
            return self.on_disconnected(error);
        }
        debug!("Connect error: {}", error);
        self.state = ConnectionState::Disconnected;
        vec![self.schedule_reconnect()]
    }

    pub fn on_shutdown(&mut self) {
        self.state = ConnectionState::ShuttingDown;
    }

    fn schedule_reconnect(&mut self) -> LifecycleEvent {
        self.attempts += 1;
        match self.strategy.next_delay(self.attempts) {
            Some(delay) => {
                self.state = ConnectionState::ReconnectScheduled;
                info!("Reconnecting in {:?} (attempt {})", delay, self.attempts);
                LifecycleEvent::ReconnectScheduled {
                    attempt: self.attempts,
                    delay,
                }
            }
            None => {
                let attempts = self.attempts - 1;
                self.exhausted = true;
                self.state = ConnectionState::Disconnected;
                warn!(
                    "Reconnect budget exhausted after {} attempts, staying disconnected",
                    attempts
                );
                LifecycleEvent::MaxReconnectsReached { attempts }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{FixedDelay, NeverReconnect};
    use std::time::Duration;

    fn fixed(max: usize) -> ConnectionMachine {
        ConnectionMachine::new(Box::new(FixedDelay::new(Duration::from_millis(10), Some(max))))
    }

    #[test]
    fn test_connect_resets_attempts() {
        let mut machine = fixed(3);
        assert!(machine.begin_connect());
        machine.on_connect_error("refused");
        assert_eq!(machine.attempts(), 1);
        assert_eq!(machine.state(), ConnectionState::ReconnectScheduled);

        assert!(machine.begin_connect());
        let events = machine.on_connected();
        assert_eq!(events, vec![LifecycleEvent::Connected]);
        assert_eq!(machine.attempts(), 0);
        assert_eq!(machine.state(), ConnectionState::Connected);
    }

    #[test]
    fn test_client_disconnect_does_not_reconnect() {
        let mut machine = fixed(3);
        machine.begin_connect();
        machine.on_connected();
        let events = machine.on_disconnected(CLIENT_DISCONNECT);
        assert_eq!(events.len(), 1);
        assert_eq!(machine.state(), ConnectionState::Disconnected);
        assert_eq!(machine.attempts(), 0);
    }

    #[test]
    fn test_begin_connect_refused_while_connected() {
        let mut machine = fixed(3);
        assert!(machine.begin_connect());
        assert!(!machine.begin_connect());
        machine.on_connected();
        assert!(!machine.begin_connect());
    }

    #[test]
    fn test_never_reconnect_exhausts_immediately() {
        let mut machine = ConnectionMachine::new(Box::new(NeverReconnect));
        machine.begin_connect();
        machine.on_connected();
        let events = machine.on_disconnected(SERVER_DISCONNECT);
        assert_eq!(
            events.last(),
            Some(&LifecycleEvent::MaxReconnectsReached { attempts: 0 })
        );
        assert!(machine.is_exhausted());
        assert!(!machine.begin_connect());
    }

    #[test]
    fn test_shutdown_swallows_transitions() {
        let mut machine = fixed(3);
        machine.begin_connect();
        machine.on_connected();
        machine.on_shutdown();
        assert!(machine.on_disconnected(SERVER_DISCONNECT).is_empty());
        assert_eq!(machine.state(), ConnectionState::ShuttingDown);
    }
}

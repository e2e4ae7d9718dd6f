//! Event handling seam
//!
//! The client decodes every Socket.IO event frame and hands the event name
//! and JSON payload to a single [`EventHandler`]. Lifecycle transitions of the
//! connection are delivered through the same handler so consumers observe
//! them in the order they happened.
//!
//! # Ordering Guarantees
//!
//! - Events are delivered in socket order, one at a time, from the client task
//! - Lifecycle events are delivered before the frames of the new connection

use crate::Result;
use serde_json::Value;
use std::time::Duration;

/// Connection lifecycle notifications
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleEvent {
    /// Namespace connect acknowledged by the server
    Connected,
    /// Transport or namespace dropped
    Disconnected { reason: String },
    /// A reconnect will be attempted after `delay`
    ReconnectScheduled { attempt: usize, delay: Duration },
    /// Reconnect budget exhausted, no further attempts
    MaxReconnectsReached { attempts: usize },
    /// Capability probe failed, push layer disabled for the session
    Unavailable { reason: String },
}

impl LifecycleEvent {
    /// Wire-compatible event name (`ws:*`)
    pub fn name(&self) -> &'static str {
        match self {
            LifecycleEvent::Connected => "ws:connected",
            LifecycleEvent::Disconnected { .. } => "ws:disconnected",
            LifecycleEvent::ReconnectScheduled { .. } => "ws:reconnect_scheduled",
            LifecycleEvent::MaxReconnectsReached { .. } => "ws:max_reconnects_reached",
            LifecycleEvent::Unavailable { .. } => "ws:unavailable",
        }
    }
}

/// Handler for decoded server events
///
/// Errors returned from [`EventHandler::on_event`] are logged by the client
/// and never interrupt the connection.
pub trait EventHandler: Send + Sync + 'static {
    /// Handle a server event (`42["name", payload]`)
    fn on_event(&self, name: &str, payload: Value) -> Result<()>;

    /// Observe a lifecycle transition
    fn on_lifecycle(&self, _event: &LifecycleEvent) {}
}

/// Discards everything
#[derive(Debug, Default)]
pub struct NoOpHandler;

impl EventHandler for NoOpHandler {
    fn on_event(&self, _name: &str, _payload: Value) -> Result<()> {
        Ok(())
    }
}

/// Forwards events into an unbounded channel
///
/// Useful for binaries that want to drive their own loop and for tests.
#[derive(Debug, Clone)]
pub struct ChannelHandler {
    tx: tokio::sync::mpsc::UnboundedSender<ChannelEvent>,
}

/// Item produced by [`ChannelHandler`]
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Lifecycle(LifecycleEvent),
    Server { name: String, payload: Value },
}

impl ChannelHandler {
    pub fn new() -> (Self, tokio::sync::mpsc::UnboundedReceiver<ChannelEvent>) {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventHandler for ChannelHandler {
    fn on_event(&self, name: &str, payload: Value) -> Result<()> {
        self.tx
            .send(ChannelEvent::Server {
                name: name.to_string(),
                payload,
            })
            .map_err(|e| crate::RealtimeError::ChannelSend(e.to_string()))
    }

    fn on_lifecycle(&self, event: &LifecycleEvent) {
        let _ = self.tx.send(ChannelEvent::Lifecycle(event.clone()));
    }
}

impl<T: EventHandler> EventHandler for std::sync::Arc<T> {
    fn on_event(&self, name: &str, payload: Value) -> Result<()> {
        (**self).on_event(name, payload)
    }

    fn on_lifecycle(&self, event: &LifecycleEvent) {
        (**self).on_lifecycle(event)
    }
}

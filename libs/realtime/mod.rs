//! # realtime
//!
//! Socket.IO push client for the league mini-app.
//!
//! ## Features
//!
//! - **Single connection**: one task owns the socket, handles talk to it over channels
//! - **Type-state builder**: URL and handler are required at compile time
//! - **Sans-IO reconnect machine**: jittered exponential backoff, testable without sockets
//! - **Heartbeat**: application `ping`/`pong` with a pong deadline, plus Engine.IO passive pings
//! - **Topics**: subscriptions survive reconnects and are flushed on every connect

pub mod traits;
pub mod core;
pub mod protocol;

pub use traits::*;

pub use self::core::{
    builder, client, config, connection_state, heartbeat, machine, pong_tracker, probe, topics,
    builder::{states, RealtimeClientBuilder},
    client::{Metrics, RealtimeClient},
    config::ClientConfig,
    connection_state::{AtomicConnectionState, AtomicMetrics, ConnectionState},
    machine::ConnectionMachine,
    pong_tracker::PongTracker,
    topics::TopicRegistry,
};

pub use self::core::builder as client_builder;

//! Connection core
//!
//! The task-owning [`RealtimeClient`], its type-state builder and the sans-IO
//! pieces the connection loop is made of: the reconnect state machine, the
//! heartbeat ticker, the pong deadline tracker and the topic registry.
//!
//! ## Example
//!
//! ```rust,ignore
//! use realtime::*;
//!
//! let client = realtime::builder()
//!     .url("https://league.example.com")
//!     .handler(MyHandler)
//!     .with_probe()
//!     .auth(InitDataAuth::new(init_data))
//!     .topic("match_stats:zenit__spartak__2025-03-01")
//!     .build()?;
//!
//! client.subscribe_topic("tours");
//! ```

pub mod builder;
pub mod client;
pub mod config;
pub mod connection_state;
pub mod heartbeat;
pub mod machine;
pub mod pong_tracker;
pub mod probe;
pub mod topics;

pub use builder::{states, RealtimeClientBuilder};
pub use client::{Metrics, RealtimeClient};
pub use config::ClientConfig;
pub use connection_state::{AtomicConnectionState, AtomicMetrics, ConnectionState};
pub use machine::ConnectionMachine;
pub use pong_tracker::PongTracker;
pub use topics::TopicRegistry;

pub use crate::traits::*;

/// Create a new realtime client builder
pub fn builder() -> RealtimeClientBuilder<builder::states::NoUrl, builder::states::NoHandler> {
    RealtimeClientBuilder::new()
}

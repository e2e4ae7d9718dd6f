//! # Realtime Traits
//!
//! Seams of the push client:
//!
//! - **EventHandler**: receives decoded server events and lifecycle changes
//! - **AuthProvider**: produces the authentication event sent after connect
//! - **ReconnectionStrategy**: controls reconnect delays and the attempt budget
//! - **PassivePingDetector**: answers transport-level pings

pub mod auth;
pub mod error;
pub mod handler;
pub mod passive_ping;
pub mod reconnect;

// Re-export commonly used types
pub use auth::{AuthProvider, InitDataAuth, NoAuth};
pub use error::{RealtimeError, Result};
pub use handler::{ChannelEvent, ChannelHandler, EventHandler, LifecycleEvent, NoOpHandler};
pub use passive_ping::{EngineIoPing, NoOpPassivePing, PassivePingDetector, TextPassivePing};
pub use reconnect::{FixedDelay, JitteredBackoff, NeverReconnect, ReconnectionStrategy};

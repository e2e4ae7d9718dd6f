//! Infrastructure Layer
//!
//! Cache store, conditional HTTP fetching, endpoint helpers, the event bus,
//! configuration, logging and shutdown.

pub mod api;
pub mod config;
pub mod etag;
pub mod event_bus;
pub mod keys;
pub mod logging;
pub mod shutdown;
pub mod store;

pub use api::LeagueApi;
pub use config::{ConfigError, FreshWindows, ReconnectConfig, SyncConfig};
pub use etag::{EtagFetcher, FetchError, FetchOptions, FetchOutcome};
pub use event_bus::EventBus;
pub use logging::{init_tracing, init_tracing_with_level};
pub use shutdown::ShutdownManager;
pub use store::{now_millis, CacheEntry, CacheStore, StoreError};

//! League live sync
//!
//! Client-side synchronization layer of the league mini-app: conditional
//! (ETag / stale-while-revalidate) fetching into a versioned cache, snapshot
//! merging, push event handling with per-match odds ordering, and the
//! wiring around the [`realtime`] Socket.IO client.
//!
//! - **domain**: match identity, push payloads, application events, topics
//! - **infrastructure**: cache store, SWR fetcher, endpoints, event bus, config, logging
//! - **application**: dispatcher, merger, odds guard, refresh service, facade

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::{
    init_logging, init_logging_with_level, merge_snapshots, LiveSyncApp, OddsVersionGuard,
    PushDispatcher, RefreshService,
};
pub use domain::{AppEvent, MatchIdentity, OddsUpdate, RefreshRequest};
pub use infrastructure::{
    CacheEntry, CacheStore, ConfigError, EtagFetcher, EventBus, FetchError, FetchOptions,
    FetchOutcome, LeagueApi, ShutdownManager, SyncConfig,
};

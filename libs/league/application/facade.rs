//! Application Facade
//!
//! Public API for binaries (presentation layer). [`LiveSyncApp`] wires the
//! cache store, the SWR fetcher, the push dispatcher, the refresh service
//! and the realtime client together from one [`SyncConfig`].

use super::{OddsVersionGuard, PushDispatcher, RefreshService};
use crate::domain::{topics, AppEvent, DataChanged, MatchIdentity};
use crate::infrastructure::{
    init_tracing, init_tracing_with_level, CacheStore, EtagFetcher, EventBus, LeagueApi,
    ShutdownManager, SyncConfig,
};
use realtime::{InitDataAuth, Metrics, RealtimeClient};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{info, warn};

pub struct LiveSyncApp {
    config: Arc<SyncConfig>,
    store: Arc<CacheStore>,
    bus: EventBus,
    api: LeagueApi,
    dispatcher: Arc<PushDispatcher>,
    client: RealtimeClient,
    refresher: JoinHandle<()>,
    shutdown: ShutdownManager,
}

impl LiveSyncApp {
    /// Build every component and start the push connection
    ///
    /// Must be called inside a Tokio runtime.
    pub fn start(config: SyncConfig) -> anyhow::Result<Self> {
        Self::start_with_shutdown(config, ShutdownManager::new())
    }

    /// Same as [`LiveSyncApp::start`] with an externally owned shutdown flag
    pub fn start_with_shutdown(config: SyncConfig, shutdown: ShutdownManager) -> anyhow::Result<Self> {
        config.validate()?;
        let config = Arc::new(config);

        let store = Arc::new(match &config.cache_file {
            Some(path) => CacheStore::load(path)?,
            None => CacheStore::in_memory(),
        });
        let bus = EventBus::new();
        let fetcher = EtagFetcher::new(reqwest::Client::new(), Arc::clone(&store), bus.clone());
        let api = LeagueApi::new(Arc::clone(&config), fetcher);

        let (refresh_tx, refresh_rx) = mpsc::unbounded_channel();
        let dispatcher = Arc::new(
            PushDispatcher::new(bus.clone(), Arc::clone(&store), Arc::new(OddsVersionGuard::new()))
                .with_refresh(refresh_tx),
        );

        let refresh_service = Arc::new(RefreshService::new(api.clone(), bus.clone()));
        let refresher = tokio::spawn(refresh_service.run(refresh_rx, shutdown.flag()));

        let mut builder = realtime::builder()
            .url(config.push_url())
            .handler(Arc::clone(&dispatcher))
            .heartbeat(Some(config.heartbeat_interval()))
            .pong_timeout(config.pong_timeout())
            .reconnect_strategy(config.reconnect.strategy())
            .topics(config.topics.iter().cloned())
            .shutdown_flag(shutdown.flag());
        if config.probe {
            builder = builder.with_probe();
        }
        if let Some(init_data) = &config.init_data {
            builder = builder.auth(InitDataAuth::new(init_data.clone()));
        }
        let client = builder.build()?;

        info!(
            "Live sync started (api: {}, push: {})",
            config.api_base_url,
            client.url()
        );

        Ok(Self {
            config,
            store,
            bus,
            api,
            dispatcher,
            client,
            refresher,
            shutdown,
        })
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn api(&self) -> &LeagueApi {
        &self.api
    }

    pub fn store(&self) -> &Arc<CacheStore> {
        &self.store
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn dispatcher(&self) -> &Arc<PushDispatcher> {
        &self.dispatcher
    }

    pub fn client(&self) -> &RealtimeClient {
        &self.client
    }

    pub fn events(&self) -> broadcast::Receiver<AppEvent> {
        self.bus.subscribe()
    }

    pub fn on_data_changed<F>(&self, data_type: &str, callback: F)
    where
        F: Fn(&DataChanged) + Send + Sync + 'static,
    {
        self.dispatcher.on_data_changed(data_type, callback);
    }

    pub fn subscribe_topic(&self, topic: &str) {
        self.client.subscribe_topic(topic);
    }

    pub fn unsubscribe_topic(&self, topic: &str) {
        self.client.unsubscribe_topic(topic);
    }

    /// Follow detail pushes for one match
    pub fn watch_match(&self, identity: &MatchIdentity) {
        self.client.subscribe_topic(&topics::match_details(identity));
    }

    pub fn unwatch_match(&self, identity: &MatchIdentity) {
        self.client.unsubscribe_topic(&topics::match_details(identity));
    }

    /// False once the capability probe failed; callers fall back to polling
    pub fn is_realtime_enabled(&self) -> bool {
        self.client.is_enabled()
    }

    pub fn is_connected(&self) -> bool {
        self.client.is_connected()
    }

    pub fn metrics(&self) -> Metrics {
        self.client.metrics()
    }

    pub fn is_running(&self) -> bool {
        self.shutdown.is_running()
    }

    pub fn shutdown_manager(&self) -> &ShutdownManager {
        &self.shutdown
    }

    /// Stop the client and the refresh service, then persist the cache
    pub async fn shutdown(self) -> anyhow::Result<()> {
        info!("Shutting down live sync");
        self.shutdown.trigger();

        if let Err(e) = self.client.shutdown().await {
            warn!("Realtime client shutdown error: {}", e);
        }
        if let Err(e) = self.refresher.await {
            warn!("Refresh service task failed: {}", e);
        }

        self.store.save()?;
        Ok(())
    }
}

/// Initialize logging with default level
pub fn init_logging() {
    init_tracing();
}

/// Initialize logging with a fallback level
pub fn init_logging_with_level(level: &str) {
    init_tracing_with_level(level);
}

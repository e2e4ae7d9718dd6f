use anyhow::Result;
use league::application::{init_logging_with_level, LiveSyncApp};
use league::{AppEvent, ShutdownManager};
use league_sync::bin_common::{load_sync_config, BinaryRunner, RunConfig, StatusTicker};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

struct LiveSync {
    app: Option<LiveSyncApp>,
    config: RunConfig,
    status: StatusTicker,
}

impl LiveSync {
    /// Warm the cache so renderers have data before the first push
    async fn warm_up(app: &LiveSyncApp) {
        let api = app.api();
        if let Err(e) = api.tours(false).await {
            warn!("Initial tours fetch failed: {}", e);
        }
        if let Err(e) = api.league_table(false).await {
            warn!("Initial league table fetch failed: {}", e);
        }
        if let Err(e) = api.schedule(false).await {
            warn!("Initial schedule fetch failed: {}", e);
        }
    }

    fn log_event(event: &AppEvent) {
        match event {
            AppEvent::EtagSuccess { .. } | AppEvent::DataPatch(_) | AppEvent::TopicUpdate(_) => {
                debug!("[{}] {:?}", event.name(), event)
            }
            AppEvent::EtagError { .. }
            | AppEvent::MaxReconnectsReached { .. }
            | AppEvent::RealtimeUnavailable { .. } => warn!("[{}] {:?}", event.name(), event),
            _ => info!("[{}] {:?}", event.name(), event),
        }
    }
}

impl BinaryRunner for LiveSync {
    async fn run(&mut self) -> Result<()> {
        let Some(app) = self.app.take() else {
            return Ok(());
        };

        let mut events = app.events();
        Self::warm_up(&app).await;

        let mut flag_check = tokio::time::interval(Duration::from_millis(250));
        while app.is_running() {
            tokio::select! {
                event = events.recv() => match event {
                    Ok(event) => Self::log_event(&event),
                    Err(RecvError::Lagged(skipped)) => warn!("Event log lagged, skipped {} events", skipped),
                    Err(RecvError::Closed) => break,
                },
                _ = flag_check.tick() => {}
            }

            if self.status.is_due() {
                let metrics = app.metrics();
                info!(
                    "Status: {:?} | sent {} | received {} | reconnects {} | cached keys {}",
                    metrics.connection_state,
                    metrics.messages_sent,
                    metrics.messages_received,
                    metrics.reconnect_count,
                    app.store().len()
                );
                self.status.mark();
            }
        }

        app.shutdown().await
    }

    fn config(&self) -> &RunConfig {
        &self.config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Load config first (before logging is initialized)
    let config = load_sync_config()?;
    init_logging_with_level(&config.log_level);

    let shutdown = ShutdownManager::new();
    shutdown.spawn_signal_handler();

    let run_config = RunConfig::new("League live sync").with_status_interval(60);
    let status = StatusTicker::new(run_config.status_interval_secs);
    let app = LiveSyncApp::start_with_shutdown(config, shutdown)?;

    let mut runner = LiveSync {
        app: Some(app),
        config: run_config,
        status,
    };
    runner.execute().await
}

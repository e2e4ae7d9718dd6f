//! Refresh service
//!
//! Push handlers never block on the network. When a push only says that
//! something changed, the dispatcher queues a [`RefreshRequest`] and this
//! service performs the forced refetch, then publishes the result.

use crate::domain::{AppEvent, DataType, RefreshRequest};
use crate::infrastructure::api::LeagueApi;
use crate::infrastructure::event_bus::EventBus;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Granularity of running-flag checks while idle
const FLAG_CHECK_INTERVAL: Duration = Duration::from_millis(100);

pub struct RefreshService {
    api: LeagueApi,
    bus: EventBus,
}

impl RefreshService {
    pub fn new(api: LeagueApi, bus: EventBus) -> Self {
        Self { api, bus }
    }

    /// Handle one request
    ///
    /// Fetch failures are published as `etag:error` by the fetcher and only
    /// logged here.
    pub async fn process(&self, request: RefreshRequest) {
        debug!("Refreshing {:?}", request);

        match request {
            RefreshRequest::MatchDetails(identity) => {
                match self.api.match_details(&identity, true).await {
                    Ok(outcome) => self.bus.publish(AppEvent::MatchDetailsUpdate {
                        identity,
                        fields: outcome.data,
                    }),
                    Err(e) => warn!("Match details refresh failed for {}: {}", identity, e),
                }
            }
            RefreshRequest::Results => match self.api.results(true).await {
                Ok(_) => self.bus.publish(AppEvent::ResultsUpdated { from_push: false }),
                Err(e) => warn!("Results refresh failed: {}", e),
            },
            RefreshRequest::LeagueTable => match self.api.league_table(true).await {
                Ok(outcome) => self.bus.publish(AppEvent::DataRefresh {
                    data_type: DataType::LeagueTable.as_str().to_string(),
                    data: outcome.data,
                }),
                Err(e) => warn!("League table refresh failed: {}", e),
            },
        }
    }

    /// Serve requests until the channel closes or `running` is cleared
    pub async fn run(
        self: Arc<Self>,
        mut requests: mpsc::UnboundedReceiver<RefreshRequest>,
        running: Arc<AtomicBool>,
    ) {
        info!("Refresh service started");
        let mut flag_check = tokio::time::interval(FLAG_CHECK_INTERVAL);

        loop {
            tokio::select! {
                request = requests.recv() => {
                    match request {
                        Some(request) => self.process(request).await,
                        None => break,
                    }
                }
                _ = flag_check.tick() => {
                    if !running.load(Ordering::Acquire) {
                        break;
                    }
                }
            }
        }

        info!("Refresh service stopped");
    }
}

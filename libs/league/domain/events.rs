//! Application events
//!
//! Everything the sync layer tells renderers travels as an [`AppEvent`] on
//! the event bus. [`AppEvent::name`] keeps the wire-era event names so logs
//! and consumers can match on them.

use crate::domain::identity::MatchIdentity;
use realtime::LifecycleEvent;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Accepted odds patch
///
/// Team names are `homeTeam`/`awayTeam` so they never collide with the
/// `home`/`draw`/`away` outcome keys inside `odds`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OddsUpdate {
    #[serde(rename = "homeTeam")]
    pub home_team: String,
    #[serde(rename = "awayTeam")]
    pub away_team: String,
    pub date: String,
    pub odds_version: Option<u64>,
    pub odds: Value,
}

/// Events published on the bus
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    Connected,
    Disconnected { reason: String },
    ReconnectScheduled { attempt: usize, delay_ms: u64 },
    MaxReconnectsReached { attempts: usize },
    /// Push layer disabled for the session; consumers poll instead
    RealtimeUnavailable { reason: String },

    /// Raw `data_patch` payload, published before handling
    DataPatch(Value),
    /// Raw `topic_update` payload, published before handling
    TopicUpdate(Value),
    Odds(OddsUpdate),

    EtagSuccess {
        cache_key: String,
        url: String,
        from_cache: bool,
        updated: bool,
    },
    EtagError {
        cache_key: String,
        url: String,
        error: String,
        stale_fallback: bool,
    },

    MatchDetailsUpdate { identity: MatchIdentity, fields: Value },
    BettingOddsUpdate { data: Value },
    MatchStatsRefresh { identity: MatchIdentity },
    /// Generic refresh for a data type or patch entity
    DataRefresh { data_type: String, data: Value },

    ScoreUpdate { identity: MatchIdentity, score: Value },
    MatchFinished { identity: MatchIdentity, results_from_push: bool },
    ResultsUpdated { from_push: bool },
    VotesReset { cleared: usize },
    Notification { title: String, body: String },
}

impl AppEvent {
    pub fn name(&self) -> &'static str {
        match self {
            AppEvent::Connected => "ws:connected",
            AppEvent::Disconnected { .. } => "ws:disconnected",
            AppEvent::ReconnectScheduled { .. } => "ws:reconnect_scheduled",
            AppEvent::MaxReconnectsReached { .. } => "ws:max_reconnects_reached",
            AppEvent::RealtimeUnavailable { .. } => "ws:unavailable",
            AppEvent::DataPatch(_) => "ws:data_patch",
            AppEvent::TopicUpdate(_) => "ws:topic_update",
            AppEvent::Odds(_) => "ws:odds",
            AppEvent::EtagSuccess { .. } => "etag:success",
            AppEvent::EtagError { .. } => "etag:error",
            AppEvent::MatchDetailsUpdate { .. } => "matchDetailsUpdate",
            AppEvent::BettingOddsUpdate { .. } => "bettingOddsUpdate",
            AppEvent::MatchStatsRefresh { .. } => "matchStatsRefresh",
            AppEvent::DataRefresh { .. } => "dataRefresh",
            AppEvent::ScoreUpdate { .. } => "scoreUpdate",
            AppEvent::MatchFinished { .. } => "matchFinished",
            AppEvent::ResultsUpdated { .. } => "resultsUpdated",
            AppEvent::VotesReset { .. } => "votesReset",
            AppEvent::Notification { .. } => "notification",
        }
    }
}

impl From<&LifecycleEvent> for AppEvent {
    fn from(event: &LifecycleEvent) -> Self {
        match event {
            LifecycleEvent::Connected => AppEvent::Connected,
            LifecycleEvent::Disconnected { reason } => AppEvent::Disconnected {
                reason: reason.clone(),
            },
            LifecycleEvent::ReconnectScheduled { attempt, delay } => AppEvent::ReconnectScheduled {
                attempt: *attempt,
                delay_ms: delay.as_millis() as u64,
            },
            LifecycleEvent::MaxReconnectsReached { attempts } => AppEvent::MaxReconnectsReached {
                attempts: *attempts,
            },
            LifecycleEvent::Unavailable { reason } => AppEvent::RealtimeUnavailable {
                reason: reason.clone(),
            },
        }
    }
}

/// Network follow-ups requested by push handlers
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshRequest {
    /// Forced refetch of one match's details
    MatchDetails(MatchIdentity),
    Results,
    LeagueTable,
}

//! League REST endpoints
//!
//! Thin wrappers over [`EtagFetcher`] that pin each endpoint to its cache key
//! and freshness window.

use crate::application::merger::merge_snapshots;
use crate::domain::MatchIdentity;
use crate::infrastructure::config::SyncConfig;
use crate::infrastructure::etag::{EtagFetcher, FetchOptions, FetchOutcome, Result};
use crate::infrastructure::keys;
use std::sync::Arc;
use std::time::Duration;

pub const TOURS_PATH: &str = "/api/betting/tours";
pub const LEAGUE_TABLE_PATH: &str = "/api/league-table";
pub const SCHEDULE_PATH: &str = "/api/schedule";
pub const RESULTS_PATH: &str = "/api/results";
pub const MATCH_DETAILS_PATH: &str = "/api/match-details";
pub const MATCH_SCORE_PATH: &str = "/api/match/score/get";
pub const MATCH_STATS_PATH: &str = "/api/match/stats/get";
pub const ACHIEVEMENTS_PATH: &str = "/api/achievements";

#[derive(Clone)]
pub struct LeagueApi {
    config: Arc<SyncConfig>,
    fetcher: EtagFetcher,
}

impl LeagueApi {
    pub fn new(config: Arc<SyncConfig>, fetcher: EtagFetcher) -> Self {
        Self { config, fetcher }
    }

    pub fn fetcher(&self) -> &EtagFetcher {
        &self.fetcher
    }

    fn options(&self, key: impl Into<String>, window_ms: u64, force: bool) -> FetchOptions {
        let mut options = FetchOptions::new(key)
            .fresh_window(Duration::from_millis(window_ms))
            .force_revalidate(force);
        if let Some(init_data) = &self.config.init_data {
            options = options.header("X-Telegram-Init-Data", init_data.clone());
        }
        options
    }

    fn match_params(options: FetchOptions, identity: &MatchIdentity) -> FetchOptions {
        let options = options
            .param("home", identity.home.trim())
            .param("away", identity.away.trim());
        if identity.has_date() {
            options.param("date", crate::domain::date_prefix(&identity.date))
        } else {
            options
        }
    }

    /// Betting tours, merged with the cached snapshot before it is written
    pub async fn tours(&self, force: bool) -> Result<FetchOutcome> {
        let options = self
            .options(keys::TOURS, self.config.fresh_window_ms.tours, force)
            .reconcile(|old, new| merge_snapshots(old, &new));
        self.fetcher
            .fetch(&self.config.endpoint(TOURS_PATH), &options)
            .await
    }

    pub async fn league_table(&self, force: bool) -> Result<FetchOutcome> {
        let options = self.options(keys::LEAGUE_TABLE, self.config.fresh_window_ms.league, force);
        self.fetcher
            .fetch(&self.config.endpoint(LEAGUE_TABLE_PATH), &options)
            .await
    }

    pub async fn schedule(&self, force: bool) -> Result<FetchOutcome> {
        let options = self.options(keys::SCHEDULE, self.config.fresh_window_ms.league, force);
        self.fetcher
            .fetch(&self.config.endpoint(SCHEDULE_PATH), &options)
            .await
    }

    pub async fn results(&self, force: bool) -> Result<FetchOutcome> {
        let options = self.options(keys::RESULTS, self.config.fresh_window_ms.league, force);
        self.fetcher
            .fetch(&self.config.endpoint(RESULTS_PATH), &options)
            .await
    }

    pub async fn match_details(&self, identity: &MatchIdentity, force: bool) -> Result<FetchOutcome> {
        let options = Self::match_params(
            self.options(
                keys::match_details(identity),
                self.config.fresh_window_ms.match_details,
                force,
            ),
            identity,
        );
        self.fetcher
            .fetch(&self.config.endpoint(MATCH_DETAILS_PATH), &options)
            .await
    }

    pub async fn match_score(&self, identity: &MatchIdentity, force: bool) -> Result<FetchOutcome> {
        let options = Self::match_params(
            self.options(
                keys::match_score(identity),
                self.config.fresh_window_ms.match_details,
                force,
            ),
            identity,
        );
        self.fetcher
            .fetch(&self.config.endpoint(MATCH_SCORE_PATH), &options)
            .await
    }

    pub async fn match_stats(&self, identity: &MatchIdentity, force: bool) -> Result<FetchOutcome> {
        let options = Self::match_params(
            self.options(
                keys::match_stats(identity),
                self.config.fresh_window_ms.match_details,
                force,
            ),
            identity,
        );
        self.fetcher
            .fetch(&self.config.endpoint(MATCH_STATS_PATH), &options)
            .await
    }

    pub async fn achievements(&self, force: bool) -> Result<FetchOutcome> {
        let options = self.options(
            keys::ACHIEVEMENTS,
            self.config.fresh_window_ms.achievements,
            force,
        );
        self.fetcher
            .fetch(&self.config.endpoint(ACHIEVEMENTS_PATH), &options)
            .await
    }
}

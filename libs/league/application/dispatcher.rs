//! Server push handlers
//!
//! [`PushDispatcher`] is the [`EventHandler`] plugged into the realtime
//! client. Each server event has its own `handle_*` method so it can be
//! driven directly in tests. Handlers update the cache store and the odds
//! guard, then publish [`AppEvent`]s; anything that needs the network is
//! handed to the refresh service as a [`RefreshRequest`].

use crate::application::merger::patch_match_odds;
use crate::application::odds_guard::OddsVersionGuard;
use crate::domain::push::SCORE_FIELDS;
use crate::domain::{
    AppEvent, DataChanged, DataPatch, DataType, LiveUpdate, MatchFinished, MatchIdentity,
    OddsUpdate, RefreshRequest, TopicUpdate,
};
use crate::infrastructure::event_bus::EventBus;
use crate::infrastructure::keys;
use crate::infrastructure::store::{CacheEntry, CacheStore};
use parking_lot::RwLock;
use realtime::{EventHandler, LifecycleEvent, RealtimeError};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Callback registered for a `data_changed` data type
pub type DataChangedCallback = Arc<dyn Fn(&DataChanged) + Send + Sync>;

pub struct PushDispatcher {
    bus: EventBus,
    store: Arc<CacheStore>,
    guard: Arc<OddsVersionGuard>,
    refresh_tx: Option<mpsc::UnboundedSender<RefreshRequest>>,
    callbacks: RwLock<HashMap<String, Vec<DataChangedCallback>>>,
}

fn decode<T: DeserializeOwned>(name: &str, payload: Value) -> realtime::Result<T> {
    serde_json::from_value(payload)
        .map_err(|e| RealtimeError::Handler(format!("malformed '{}' payload: {}", name, e)))
}

/// Human-readable score from a live update body
fn score_text(data: &Value) -> String {
    if let Some(score) = data.get("score").and_then(Value::as_str) {
        return score.to_string();
    }
    match (data.get("score_home"), data.get("score_away")) {
        (Some(h), Some(a)) => format!("{}:{}", h, a),
        _ => "score updated".to_string(),
    }
}

impl PushDispatcher {
    pub fn new(bus: EventBus, store: Arc<CacheStore>, guard: Arc<OddsVersionGuard>) -> Self {
        Self {
            bus,
            store,
            guard,
            refresh_tx: None,
            callbacks: RwLock::new(HashMap::new()),
        }
    }

    /// Route network follow-ups to a refresh service
    pub fn with_refresh(mut self, tx: mpsc::UnboundedSender<RefreshRequest>) -> Self {
        self.refresh_tx = Some(tx);
        self
    }

    pub fn guard(&self) -> &Arc<OddsVersionGuard> {
        &self.guard
    }

    pub fn store(&self) -> &Arc<CacheStore> {
        &self.store
    }

    /// Register a callback for one `data_changed` data type
    ///
    /// Callbacks run before the default refresh action.
    pub fn on_data_changed<F>(&self, data_type: &str, callback: F)
    where
        F: Fn(&DataChanged) + Send + Sync + 'static,
    {
        self.callbacks
            .write()
            .entry(data_type.to_string())
            .or_default()
            .push(Arc::new(callback));
    }

    /// Decode and route one server event
    pub fn dispatch(&self, name: &str, payload: Value) -> realtime::Result<()> {
        match name {
            "data_changed" => self.handle_data_changed(decode(name, payload)?),
            "data_patch" => {
                self.bus.publish(AppEvent::DataPatch(payload.clone()));
                self.handle_data_patch(decode(name, payload)?);
            }
            "topic_update" => {
                self.bus.publish(AppEvent::TopicUpdate(payload.clone()));
                self.handle_topic_update(decode(name, payload)?);
            }
            "match_finished" => self.handle_match_finished(decode(name, payload)?),
            "live_update" => self.handle_live_update(decode(name, payload)?),
            other => debug!("Unhandled server event '{}'", other),
        }
        Ok(())
    }

    fn request_refresh(&self, request: RefreshRequest) -> bool {
        match &self.refresh_tx {
            Some(tx) => tx.send(request).is_ok(),
            None => false,
        }
    }

    pub fn handle_data_changed(&self, changed: DataChanged) {
        let data_type = changed.data_type();
        debug!("data_changed: {}", data_type.as_str());

        let callbacks: Vec<DataChangedCallback> = self
            .callbacks
            .read()
            .get(data_type.as_str())
            .cloned()
            .unwrap_or_default();
        for callback in &callbacks {
            callback(&changed);
        }

        match &data_type {
            DataType::LeagueTable => {
                self.store.expire(keys::LEAGUE_TABLE);
            }
            DataType::Schedule => {
                self.store.expire(keys::SCHEDULE);
            }
            DataType::MatchDetails | DataType::LineupsUpdated => {
                if let Some(identity) = MatchIdentity::from_value(&changed.data) {
                    self.store.expire(&keys::match_details(&identity));
                    self.bus.publish(AppEvent::MatchDetailsUpdate {
                        identity,
                        fields: changed.data.clone(),
                    });
                    return;
                }
            }
            DataType::BettingOdds => {
                self.store.expire(keys::TOURS);
                self.bus.publish(AppEvent::BettingOddsUpdate {
                    data: changed.data.clone(),
                });
                return;
            }
            DataType::Other(_) => {}
        }

        self.bus.publish(AppEvent::DataRefresh {
            data_type: data_type.as_str().to_string(),
            data: changed.data,
        });
    }

    pub fn handle_data_patch(&self, patch: DataPatch) {
        match patch.entity.as_str() {
            "match" => self.patch_match(patch),
            "odds" => self.patch_odds(patch),
            other => {
                debug!("data_patch for '{}', generic refresh", other);
                self.bus.publish(AppEvent::DataRefresh {
                    data_type: other.to_string(),
                    data: Value::Object(patch.fields),
                });
            }
        }
    }

    fn patch_match(&self, patch: DataPatch) {
        let Some(identity) = patch.identity() else {
            warn!("match patch without a usable id: {}", patch.id);
            return;
        };

        if patch.fields.contains_key("odds_version") {
            let version = patch.odds_version();
            if !self.guard.try_apply_match(&identity, version) {
                return;
            }
            if let Some(odds) = patch.fields.get("odds") {
                self.apply_odds(&identity, version, odds.clone());
            }
        }

        let mut score = Map::new();
        let mut rest = Map::new();
        for (field, value) in patch.fields {
            if SCORE_FIELDS.contains(&field.as_str()) {
                score.insert(field, value);
            } else if field != "odds_version" && field != "odds" {
                rest.insert(field, value);
            }
        }

        if !score.is_empty() {
            self.apply_score(&identity, Value::Object(score));
        }

        if !rest.is_empty() {
            self.store.expire(&keys::match_details(&identity));
            self.bus.publish(AppEvent::MatchDetailsUpdate {
                identity,
                fields: Value::Object(rest),
            });
        }
    }

    fn patch_odds(&self, patch: DataPatch) {
        let Some(identity) = patch.identity() else {
            warn!("odds patch without a usable id: {}", patch.id);
            return;
        };

        let version = patch.odds_version();
        if !self.guard.try_apply_match(&identity, version) {
            return;
        }

        let odds = match patch.fields.get("odds") {
            Some(odds) => odds.clone(),
            None => {
                let mut fields = patch.fields;
                fields.remove("odds_version");
                Value::Object(fields)
            }
        };
        self.apply_odds(&identity, version, odds);
    }

    /// Publish accepted odds and write them into the cached tours snapshot
    fn apply_odds(&self, identity: &MatchIdentity, version: Option<u64>, odds: Value) {
        let patched = self.store.update_entry(keys::TOURS, |entry| {
            let mut entry = entry?;
            if patch_match_odds(&mut entry.payload, identity, &odds) {
                Some(entry)
            } else {
                None
            }
        });
        if patched.is_some() {
            debug!("Patched cached odds for {}", identity);
        }

        self.bus.publish(AppEvent::Odds(OddsUpdate {
            home_team: identity.home.clone(),
            away_team: identity.away.clone(),
            date: identity.date.clone(),
            odds_version: version,
            odds,
        }));
    }

    /// Record a pushed score under `md:score:{matchKey}`
    fn apply_score(&self, identity: &MatchIdentity, score: Value) {
        let key = keys::match_score(identity);
        let merged = self
            .store
            .update_entry(&key, |entry| {
                let mut payload = entry
                    .map(|e| e.payload)
                    .filter(Value::is_object)
                    .unwrap_or_else(|| Value::Object(Map::new()));
                if let (Some(target), Some(source)) = (payload.as_object_mut(), score.as_object()) {
                    for (k, v) in source {
                        target.insert(k.clone(), v.clone());
                    }
                }
                Some(CacheEntry::new(None, payload))
            })
            .map(|entry| entry.payload)
            .unwrap_or(score);

        self.bus.publish(AppEvent::ScoreUpdate {
            identity: identity.clone(),
            score: merged,
        });
    }

    pub fn handle_topic_update(&self, update: TopicUpdate) {
        if update.is_full_reset() {
            let cleared = self
                .store
                .remove_prefixes(&[keys::VOTED_PREFIX, keys::VOTE_AGG_PREFIX]);
            info!("Full reset: cleared {} vote key(s)", cleared);
            self.bus.publish(AppEvent::VotesReset { cleared });
            return;
        }

        let entity = update.entity.clone().unwrap_or_default();
        match entity.as_str() {
            "match_stats" => {
                let Some(identity) = update.identity() else {
                    warn!("match_stats update without teams");
                    return;
                };
                self.store.expire(&keys::match_stats(&identity));
                self.bus.publish(AppEvent::MatchStatsRefresh { identity });
            }
            "match_events" | "match_events_removed" => {
                let Some(identity) = update.identity() else {
                    warn!("{} update without teams", entity);
                    return;
                };
                self.store.expire(&keys::match_details(&identity));
                if !self.request_refresh(RefreshRequest::MatchDetails(identity.clone())) {
                    self.bus.publish(AppEvent::MatchDetailsUpdate {
                        identity,
                        fields: Value::Null,
                    });
                }
            }
            _ => {
                let data_type = if entity.is_empty() {
                    update.reason.clone().unwrap_or_else(|| "topic".to_string())
                } else {
                    entity
                };
                self.bus.publish(AppEvent::DataRefresh {
                    data_type,
                    data: serde_json::to_value(&update).unwrap_or(Value::Null),
                });
            }
        }
    }

    pub fn handle_match_finished(&self, finished: MatchFinished) {
        let identity = finished.identity();
        info!("Match finished: {}", identity);

        self.store.remove(&keys::match_score(&identity));
        self.store.expire(keys::SCHEDULE);
        let home_prefix = keys::team_prefix(&identity.home);
        let away_prefix = keys::team_prefix(&identity.away);
        self.store
            .remove_prefixes(&[home_prefix.as_str(), away_prefix.as_str()]);

        let results_from_push = finished.results_block.is_some();
        self.bus.publish(AppEvent::MatchFinished {
            identity,
            results_from_push,
        });

        match finished.results_block {
            Some(block) => {
                self.store.put_entry(keys::RESULTS, &CacheEntry::new(None, block));
                self.bus.publish(AppEvent::ResultsUpdated { from_push: true });
            }
            None => {
                self.store.expire(keys::RESULTS);
                if !self.request_refresh(RefreshRequest::Results) {
                    self.bus.publish(AppEvent::DataRefresh {
                        data_type: "results".to_string(),
                        data: Value::Null,
                    });
                }
            }
        }

        self.store.expire(keys::LEAGUE_TABLE);
        if !self.request_refresh(RefreshRequest::LeagueTable) {
            self.bus.publish(AppEvent::DataRefresh {
                data_type: DataType::LeagueTable.as_str().to_string(),
                data: Value::Null,
            });
        }
    }

    pub fn handle_live_update(&self, update: LiveUpdate) {
        let identity = update.identity();
        let body = score_text(&update.data);
        self.apply_score(&identity, update.data);

        self.bus.publish(AppEvent::Notification {
            title: format!("{} vs {}", identity.home, identity.away),
            body,
        });
    }
}

impl EventHandler for PushDispatcher {
    fn on_event(&self, name: &str, payload: Value) -> realtime::Result<()> {
        self.dispatch(name, payload)
    }

    fn on_lifecycle(&self, event: &LifecycleEvent) {
        match event {
            LifecycleEvent::MaxReconnectsReached { attempts } => {
                warn!("Realtime updates stopped after {} reconnect attempts", attempts)
            }
            LifecycleEvent::Unavailable { reason } => {
                warn!("Realtime updates unavailable, polling only: {}", reason)
            }
            other => debug!("Lifecycle: {}", other.name()),
        }
        self.bus.publish(AppEvent::from(event));
    }
}


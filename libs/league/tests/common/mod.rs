//! Common test utilities for league integration tests

#![allow(dead_code)]

use league::{AppEvent, CacheStore, EventBus, OddsVersionGuard, PushDispatcher};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Macro for verbose test output (controlled by TEST_VERBOSE env var)
#[macro_export]
macro_rules! verbose_println {
    ($($arg:tt)*) => {
        if std::env::var("TEST_VERBOSE").is_ok() {
            println!($($arg)*);
        }
    };
}

/// Dispatcher wired to an in-memory store and a subscribed bus
pub struct DispatchHarness {
    pub dispatcher: PushDispatcher,
    pub store: Arc<CacheStore>,
    pub guard: Arc<OddsVersionGuard>,
    pub events: broadcast::Receiver<AppEvent>,
}

impl DispatchHarness {
    pub fn new() -> Self {
        let bus = EventBus::new();
        let events = bus.subscribe();
        let store = Arc::new(CacheStore::in_memory());
        let guard = Arc::new(OddsVersionGuard::new());
        let dispatcher = PushDispatcher::new(bus, Arc::clone(&store), Arc::clone(&guard));
        Self {
            dispatcher,
            store,
            guard,
            events,
        }
    }

    /// Everything published since the last drain
    pub fn drain(&mut self) -> Vec<AppEvent> {
        let mut out = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            out.push(event);
        }
        out
    }
}

/// Drain a bus receiver without waiting
pub fn drain(rx: &mut broadcast::Receiver<AppEvent>) -> Vec<AppEvent> {
    let mut out = Vec::new();
    while let Ok(event) = rx.try_recv() {
        out.push(event);
    }
    out
}

pub mod fixtures {
    //! Test fixtures for payloads and snapshots

    use serde_json::{json, Value};

    /// Tours snapshot with two matches of one tour
    pub fn tours_snapshot(version: u64) -> Value {
        json!({
            "version": version,
            "tours": [{
                "tour": 12,
                "matches": [
                    {
                        "home": "Зенит", "away": "Спартак", "date": "2025-03-01T18:00:00",
                        "odds": {"home": 1.8, "draw": 3.4, "away": 4.2},
                        "markets": {"totals": [{"line": 2.5, "over": 1.9, "under": 1.9}]}
                    },
                    {
                        "home": "ЦСКА", "away": "Динамо", "date": "2025-03-02",
                        "odds": {"home": 2.1, "draw": 3.1, "away": 3.3}
                    }
                ]
            }]
        })
    }

    pub fn odds_patch(version: u64, home_odds: f64) -> Value {
        json!({
            "entity": "odds",
            "id": {"home": "Зенит", "away": "Спартак", "date": "2025-03-01"},
            "fields": {"odds_version": version, "odds": {"home": home_odds, "draw": 3.4, "away": 4.2}}
        })
    }
}

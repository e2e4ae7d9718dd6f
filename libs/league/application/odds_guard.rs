//! Per-match odds version guard
//!
//! Odds patches carry a monotonic `odds_version` per match. A patch is applied
//! only if its version is newer than the last applied one for the same
//! `"{home}|{away}"` key; streams of different matches are independent.

use crate::domain::MatchIdentity;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;

#[derive(Debug, Default)]
pub struct OddsVersionGuard {
    versions: DashMap<String, u64>,
}

impl OddsVersionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check without recording
    ///
    /// `None` (unversioned legacy patch) always applies.
    pub fn should_apply(&self, match_key: &str, incoming: Option<u64>) -> bool {
        match incoming {
            None => true,
            Some(version) => self
                .versions
                .get(match_key)
                .map_or(true, |current| version > *current),
        }
    }

    /// Store `version` if it is newer than the stored one
    pub fn record_version(&self, match_key: &str, version: u64) {
        self.versions
            .entry(match_key.to_string())
            .and_modify(|current| {
                if version > *current {
                    *current = version;
                }
            })
            .or_insert(version);
    }

    /// Check and record in one step
    ///
    /// The entry is locked for the duration, so two concurrent patches with
    /// the same version cannot both be accepted.
    pub fn try_apply(&self, match_key: &str, incoming: Option<u64>) -> bool {
        let Some(version) = incoming else {
            return true;
        };

        match self.versions.entry(match_key.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(version);
                true
            }
            Entry::Occupied(mut slot) => {
                if version > *slot.get() {
                    slot.insert(version);
                    true
                } else {
                    debug!(
                        "Ignoring stale odds for {} (v{} <= v{})",
                        match_key,
                        version,
                        slot.get()
                    );
                    false
                }
            }
        }
    }

    /// [`try_apply`](Self::try_apply) keyed by a match identity
    pub fn try_apply_match(&self, identity: &MatchIdentity, incoming: Option<u64>) -> bool {
        self.try_apply(&identity.odds_key(), incoming)
    }

    pub fn current(&self, match_key: &str) -> Option<u64> {
        self.versions.get(match_key).map(|v| *v)
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    pub fn clear(&self) {
        self.versions.clear();
    }
}

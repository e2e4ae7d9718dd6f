//! Tours snapshot merge
//!
//! A fresh tours snapshot sometimes omits odds or markets the previous one
//! had. [`merge_snapshots`] fills those gaps from the old snapshot, matching
//! matches by [`MatchIdentity::key`]. Populated fields of the new snapshot
//! are never replaced.
//!
//! An empty object counts as missing, so a market that really closes to `{}`
//! keeps its previous odds until a snapshot carries new ones.

use crate::domain::MatchIdentity;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::debug;

/// Null, `{}` and `[]` all count as missing
fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::Object(map)) => map.is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    }
}

fn tours(snapshot: &Value) -> Option<&Vec<Value>> {
    match snapshot {
        Value::Array(tours) => Some(tours),
        Value::Object(map) => map.get("tours").and_then(Value::as_array),
        _ => None,
    }
}

fn tours_mut(snapshot: &mut Value) -> Option<&mut Vec<Value>> {
    match snapshot {
        Value::Array(tours) => Some(tours),
        Value::Object(map) => map.get_mut("tours").and_then(Value::as_array_mut),
        _ => None,
    }
}

/// Index the matches of a snapshot by identity key
pub fn index_matches(snapshot: &Value) -> HashMap<String, &Value> {
    let mut index = HashMap::new();
    for tour in tours(snapshot).into_iter().flatten() {
        let matches = tour.get("matches").and_then(Value::as_array);
        for m in matches.into_iter().flatten() {
            if let Some(identity) = MatchIdentity::from_value(m) {
                index.insert(identity.key(), m);
            }
        }
    }
    index
}

/// Fill one market field; returns true when something was copied
fn fill_market(new_match: &mut Value, old_match: &Value, field: &str) -> bool {
    let old_value = old_match.get("markets").and_then(|m| m.get(field));
    if is_blank(old_value) {
        return false;
    }
    let new_value = new_match.get("markets").and_then(|m| m.get(field));
    if !is_blank(new_value) {
        return false;
    }

    let Some(obj) = new_match.as_object_mut() else {
        return false;
    };
    let markets = obj
        .entry("markets")
        .or_insert_with(|| Value::Object(Map::new()));
    if !markets.is_object() {
        *markets = Value::Object(Map::new());
    }
    match (markets.as_object_mut(), old_value) {
        (Some(markets), Some(old_value)) => {
            markets.insert(field.to_string(), old_value.clone());
            true
        }
        _ => false,
    }
}

/// Fill odds and market gaps of one match from its old counterpart
fn fill_match(new_match: &mut Value, old_match: &Value) -> usize {
    let mut filled = 0;

    if is_blank(new_match.get("odds")) && !is_blank(old_match.get("odds")) {
        if let (Some(obj), Some(odds)) = (new_match.as_object_mut(), old_match.get("odds")) {
            obj.insert("odds".to_string(), odds.clone());
            filled += 1;
        }
    }

    for field in ["totals", "specials"] {
        if fill_market(new_match, old_match, field) {
            filled += 1;
        }
    }
    filled
}

/// Merge `new` with the previous snapshot `old`
///
/// Returns a new value; neither input is modified.
pub fn merge_snapshots(old: Option<&Value>, new: &Value) -> Value {
    let Some(old) = old else {
        return new.clone();
    };

    let old_index = index_matches(old);
    let mut merged = new.clone();
    if old_index.is_empty() {
        return merged;
    }

    let mut filled = 0;
    for tour in tours_mut(&mut merged).into_iter().flatten() {
        let matches = tour.get_mut("matches").and_then(Value::as_array_mut);
        for m in matches.into_iter().flatten() {
            let Some(identity) = MatchIdentity::from_value(m) else {
                continue;
            };
            if let Some(old_match) = old_index.get(&identity.key()) {
                filled += fill_match(m, old_match);
            }
        }
    }

    if filled > 0 {
        debug!("Snapshot merge filled {} field(s) from cache", filled);
    }
    merged
}

/// Write pushed odds into the matching match of a snapshot
///
/// Returns false when the snapshot has no such match.
pub fn patch_match_odds(snapshot: &mut Value, identity: &MatchIdentity, odds: &Value) -> bool {
    let key = identity.key();
    let key_without_date = MatchIdentity::new(identity.home.clone(), identity.away.clone(), "").key();

    for tour in tours_mut(snapshot).into_iter().flatten() {
        let matches = tour.get_mut("matches").and_then(Value::as_array_mut);
        for m in matches.into_iter().flatten() {
            let Some(candidate) = MatchIdentity::from_value(m) else {
                continue;
            };
            let hit = if identity.has_date() {
                candidate.key() == key
            } else {
                MatchIdentity::new(candidate.home.clone(), candidate.away.clone(), "").key()
                    == key_without_date
            };
            if hit {
                if let Some(obj) = m.as_object_mut() {
                    obj.insert("odds".to_string(), odds.clone());
                    return true;
                }
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_patch_match_odds() {
        let mut snap = snapshot(json!([
            {"home": "A", "away": "B", "date": "2025-01-01", "odds": {"home": 2.0}},
            {"home": "C", "away": "D", "date": "2025-01-01"}
        ]));

        let identity = MatchIdentity::new("c", "d", "2025-01-01");
        assert!(patch_match_odds(&mut snap, &identity, &json!({"draw": 3.1})));
        assert_eq!(snap["tours"][0]["matches"][1]["odds"], json!({"draw": 3.1}));

        let undated = MatchIdentity::new("A", "B", "");
        assert!(patch_match_odds(&mut snap, &undated, &json!({"home": 1.8})));
        assert_eq!(snap["tours"][0]["matches"][0]["odds"], json!({"home": 1.8}));

        let missing = MatchIdentity::new("X", "Y", "2025-01-01");
        assert!(!patch_match_odds(&mut snap, &missing, &json!({})));
    }

    fn snapshot(matches: Value) -> Value {
        json!({"version": 1, "tours": [{"tour": 7, "matches": matches}]})
    }

    #[test]
    fn test_no_old_snapshot_returns_new() {
        let new = snapshot(json!([{"home": "A", "away": "B", "date": "2025-01-01"}]));
        assert_eq!(merge_snapshots(None, &new), new);
    }

    #[test]
    fn test_empty_odds_filled_from_old() {
        let old = snapshot(json!([{
            "home": "Зенит", "away": "Спартак", "date": "2024-05-01",
            "odds": {"home": 1.5, "draw": 3.2, "away": 4.0}
        }]));
        let new = snapshot(json!([{
            "home": "зенит ", "away": "Спартак", "date": "2024-05-01T18:00:00",
            "odds": {}
        }]));

        let merged = merge_snapshots(Some(&old), &new);
        assert_eq!(
            merged["tours"][0]["matches"][0]["odds"],
            json!({"home": 1.5, "draw": 3.2, "away": 4.0})
        );
        assert_eq!(new["tours"][0]["matches"][0]["odds"], json!({}), "input untouched");
    }

    #[test]
    fn test_missing_markets_filled() {
        let old = snapshot(json!([{
            "home": "A", "away": "B", "date": "2025-01-01",
            "markets": {"totals": [{"line": 2.5, "over": 1.9}], "specials": {"btts": 1.7}}
        }]));
        let new = snapshot(json!([{
            "home": "A", "away": "B", "date": "2025-01-01",
            "odds": {"home": 2.0},
            "markets": {"totals": []}
        }]));

        let merged = merge_snapshots(Some(&old), &new);
        let m = &merged["tours"][0]["matches"][0];
        assert_eq!(m["odds"], json!({"home": 2.0}));
        assert_eq!(m["markets"]["totals"], json!([{"line": 2.5, "over": 1.9}]));
        assert_eq!(m["markets"]["specials"], json!({"btts": 1.7}));
    }

    #[test]
    fn test_populated_fields_win() {
        let old = snapshot(json!([{
            "home": "A", "away": "B", "date": "2025-01-01",
            "odds": {"home": 9.9},
            "markets": {"totals": [1], "specials": {"x": 1}}
        }]));
        let new = snapshot(json!([{
            "home": "A", "away": "B", "date": "2025-01-01",
            "odds": {"home": 1.1},
            "markets": {"totals": [2], "specials": {"y": 2}}
        }]));

        assert_eq!(merge_snapshots(Some(&old), &new), new);
    }

    #[test]
    fn test_unmatched_matches_untouched() {
        let old = snapshot(json!([{
            "home": "A", "away": "B", "date": "2025-01-01", "odds": {"home": 1.5}
        }]));
        let new = snapshot(json!([{"home": "A", "away": "B", "date": "2025-01-08"}]));

        assert_eq!(merge_snapshots(Some(&old), &new), new);
    }

    #[test]
    fn test_top_level_tour_array() {
        let old = json!([{"matches": [{"home": "A", "away": "B", "odds": {"draw": 3.0}}]}]);
        let new = json!([{"matches": [{"home": "a", "away": "b"}]}]);

        let merged = merge_snapshots(Some(&old), &new);
        assert_eq!(merged[0]["matches"][0]["odds"], json!({"draw": 3.0}));
    }
}

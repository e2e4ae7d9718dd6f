//! Server push payloads
//!
//! Typed views of the `42["name", payload]` events the server sends. Fields
//! the server may omit are optional; unknown fields are ignored.

use crate::domain::identity::MatchIdentity;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `data_changed {type, data_type, data, timestamp}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataChanged {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub data_type: Option<String>,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub timestamp: Option<Value>,
}

impl DataChanged {
    /// Effective data type; falls back to `type` for older servers
    pub fn data_type(&self) -> DataType {
        let raw = self
            .data_type
            .as_deref()
            .or(self.kind.as_deref())
            .unwrap_or_default();
        DataType::from(raw)
    }
}

/// Data families with a default refresh action
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataType {
    LeagueTable,
    Schedule,
    MatchDetails,
    BettingOdds,
    LineupsUpdated,
    Other(String),
}

impl DataType {
    pub fn as_str(&self) -> &str {
        match self {
            DataType::LeagueTable => "league_table",
            DataType::Schedule => "schedule",
            DataType::MatchDetails => "match_details",
            DataType::BettingOdds => "betting_odds",
            DataType::LineupsUpdated => "lineups_updated",
            DataType::Other(other) => other,
        }
    }
}

impl From<&str> for DataType {
    fn from(raw: &str) -> Self {
        match raw {
            "league_table" => DataType::LeagueTable,
            "schedule" => DataType::Schedule,
            "match_details" => DataType::MatchDetails,
            "betting_odds" => DataType::BettingOdds,
            "lineups_updated" => DataType::LineupsUpdated,
            other => DataType::Other(other.to_string()),
        }
    }
}

/// `data_patch {entity, id, fields}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPatch {
    pub entity: String,
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl DataPatch {
    pub fn identity(&self) -> Option<MatchIdentity> {
        MatchIdentity::from_patch_id(&self.id)
    }

    /// `fields.odds_version` as an integer, if present
    pub fn odds_version(&self) -> Option<u64> {
        self.fields.get("odds_version").and_then(parse_version)
    }
}

/// Versions arrive as numbers or numeric strings
pub fn parse_version(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Score fields a match patch may carry
pub const SCORE_FIELDS: [&str; 4] = ["score_home", "score_away", "score", "status"];

/// `topic_update {entity?, reason?, change_type?, home?, away?}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopicUpdate {
    #[serde(default)]
    pub entity: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub change_type: Option<String>,
    #[serde(default)]
    pub home: Option<String>,
    #[serde(default)]
    pub away: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
}

impl TopicUpdate {
    pub fn identity(&self) -> Option<MatchIdentity> {
        match (&self.home, &self.away) {
            (Some(home), Some(away)) => Some(MatchIdentity::new(
                home.clone(),
                away.clone(),
                self.date.clone().unwrap_or_default(),
            )),
            _ => None,
        }
    }

    pub fn is_full_reset(&self) -> bool {
        self.reason.as_deref() == Some("full_reset")
            || self.change_type.as_deref() == Some("full_reset")
    }
}

/// `match_finished {home, away, results_block?}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchFinished {
    pub home: String,
    pub away: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub results_block: Option<Value>,
}

impl MatchFinished {
    pub fn identity(&self) -> MatchIdentity {
        MatchIdentity::new(
            self.home.clone(),
            self.away.clone(),
            self.date.clone().unwrap_or_default(),
        )
    }
}

/// `live_update {home, away, data}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveUpdate {
    pub home: String,
    pub away: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub data: Value,
}

impl LiveUpdate {
    pub fn identity(&self) -> MatchIdentity {
        MatchIdentity::new(
            self.home.clone(),
            self.away.clone(),
            self.date.clone().unwrap_or_default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_data_type_falls_back_to_type() {
        let changed: DataChanged =
            serde_json::from_value(json!({"type": "schedule", "data": {}})).unwrap();
        assert_eq!(changed.data_type(), DataType::Schedule);

        let changed: DataChanged =
            serde_json::from_value(json!({"type": "x", "data_type": "league_table"})).unwrap();
        assert_eq!(changed.data_type(), DataType::LeagueTable);

        let changed: DataChanged = serde_json::from_value(json!({"data_type": "news"})).unwrap();
        assert_eq!(changed.data_type(), DataType::Other("news".into()));
    }

    #[test]
    fn test_odds_version_parsing() {
        let patch: DataPatch = serde_json::from_value(json!({
            "entity": "odds",
            "id": "A_B_2024-05-01",
            "fields": {"odds_version": "7"}
        }))
        .unwrap();
        assert_eq!(patch.odds_version(), Some(7));
        assert_eq!(patch.identity().unwrap().key(), "a__b__2024-05-01");

        assert_eq!(parse_version(&json!(3)), Some(3));
        assert_eq!(parse_version(&json!(-1)), None);
        assert_eq!(parse_version(&json!(null)), None);
    }

    #[test]
    fn test_full_reset_detection() {
        let update: TopicUpdate = serde_json::from_value(json!({"reason": "full_reset"})).unwrap();
        assert!(update.is_full_reset());
        assert!(update.identity().is_none());

        let update: TopicUpdate =
            serde_json::from_value(json!({"entity": "match_stats", "home": "A", "away": "B"}))
                .unwrap();
        assert!(!update.is_full_reset());
        assert_eq!(update.identity().unwrap().key(), "a__b__");
    }
}

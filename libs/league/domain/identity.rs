//! Match identity
//!
//! REST snapshots and push patches meet on the composite key produced here.
//! Every key in the crate goes through [`normalize_team`]; building a key by
//! hand anywhere else is a bug.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Normalize a team name: trim, lowercase, fold `ё` into `е`
pub fn normalize_team(name: &str) -> String {
    name.trim().to_lowercase().replace('ё', "е")
}

/// First ten characters of a date or datetime (`YYYY-MM-DD`)
pub fn date_prefix(date: &str) -> &str {
    let date = date.trim();
    match date.char_indices().nth(10) {
        Some((idx, _)) => &date[..idx],
        None => date,
    }
}

/// (home, away, date) triple identifying a match
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchIdentity {
    pub home: String,
    pub away: String,
    #[serde(default)]
    pub date: String,
}

impl MatchIdentity {
    pub fn new(home: impl Into<String>, away: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            home: home.into(),
            away: away.into(),
            date: date.into(),
        }
    }

    /// Composite key `"{home}__{away}__{date}"`
    pub fn key(&self) -> String {
        format!(
            "{}__{}__{}",
            normalize_team(&self.home),
            normalize_team(&self.away),
            date_prefix(&self.date)
        )
    }

    /// Odds stream key `"{home}|{away}"`
    pub fn odds_key(&self) -> String {
        format!("{}|{}", normalize_team(&self.home), normalize_team(&self.away))
    }

    /// Read an identity from a match object
    ///
    /// Accepts `home`/`away` or `home_team`/`away_team`, and `date` or
    /// `datetime`. Missing dates become empty.
    pub fn from_value(value: &Value) -> Option<Self> {
        let text = |keys: &[&str]| {
            keys.iter()
                .find_map(|k| value.get(*k).and_then(Value::as_str))
                .map(str::to_string)
        };

        let home = text(&["home", "home_team"])?;
        let away = text(&["away", "away_team"])?;
        let date = text(&["date", "datetime"]).unwrap_or_default();
        Some(Self::new(home, away, date))
    }

    /// Parse a legacy `"{home}_{away}_{date}"` identifier
    ///
    /// The date is taken from the last underscore; the first underscore of
    /// the remainder separates the teams.
    pub fn parse_legacy(id: &str) -> Option<Self> {
        let (teams, date) = id.rsplit_once('_')?;
        let (home, away) = teams.split_once('_')?;
        if home.trim().is_empty() || away.trim().is_empty() {
            return None;
        }
        Some(Self::new(home, away, date))
    }

    /// Identity from a patch id that is either a legacy string or an object
    pub fn from_patch_id(id: &Value) -> Option<Self> {
        match id {
            Value::String(s) => Self::parse_legacy(s),
            Value::Object(_) => Self::from_value(id),
            _ => None,
        }
    }

    pub fn has_date(&self) -> bool {
        !date_prefix(&self.date).is_empty()
    }
}

impl fmt::Display for MatchIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} vs {}", self.home, self.away)?;
        if self.has_date() {
            write!(f, " ({})", date_prefix(&self.date))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_yo_folding_and_trim() {
        assert_eq!(normalize_team("Полёт"), normalize_team("полет "));
        assert_eq!(normalize_team("  ЁЛКИ  "), "елки");
    }

    #[test]
    fn test_key_truncates_date() {
        let id = MatchIdentity::new("Зенит", " Спартак", "2024-05-01T18:00:00Z");
        assert_eq!(id.key(), "зенит__спартак__2024-05-01");
        assert_eq!(id.odds_key(), "зенит|спартак");
    }

    #[test]
    fn test_key_without_date() {
        let id = MatchIdentity::new("A", "B", "");
        assert_eq!(id.key(), "a__b__");
        assert!(!id.has_date());
    }

    #[test]
    fn test_from_value_variants() {
        let a = MatchIdentity::from_value(&json!({"home": "A", "away": "B", "date": "2025-01-02"}))
            .unwrap();
        let b = MatchIdentity::from_value(
            &json!({"home_team": "a", "away_team": "b ", "datetime": "2025-01-02 19:30"}),
        )
        .unwrap();
        assert_eq!(a.key(), b.key());
        assert!(MatchIdentity::from_value(&json!({"home": "A"})).is_none());
    }

    #[test]
    fn test_parse_legacy() {
        let id = MatchIdentity::parse_legacy("Зенит_Спартак_2024-05-01").unwrap();
        assert_eq!(id.home, "Зенит");
        assert_eq!(id.away, "Спартак");
        assert_eq!(id.date, "2024-05-01");

        assert!(MatchIdentity::parse_legacy("nounderscore").is_none());
        assert!(MatchIdentity::parse_legacy("_B_2024-05-01").is_none());
    }

    #[test]
    fn test_patch_id_forms_agree() {
        let legacy = MatchIdentity::from_patch_id(&json!("Зенит_Спартак_2024-05-01")).unwrap();
        let object = MatchIdentity::from_patch_id(
            &json!({"home": "зенит", "away": "спартак", "date": "2024-05-01"}),
        )
        .unwrap();
        assert_eq!(legacy.key(), object.key());
        assert!(MatchIdentity::from_patch_id(&json!(42)).is_none());
    }
}

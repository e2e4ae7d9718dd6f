//! Push topic names

use crate::domain::identity::MatchIdentity;

pub const GLOBAL: &str = "global";
pub const ADMIN_REFRESH: &str = "admin_refresh";
pub const PREDICTIONS_PAGE: &str = "predictions_page";

/// Odds stream for a server-side match id
pub fn match_odds(match_id: impl std::fmt::Display) -> String {
    format!("match_odds_{}", match_id)
}

/// Details stream for a match; the date part may be empty
pub fn match_details(identity: &MatchIdentity) -> String {
    format!("match:{}:details", identity.key())
}

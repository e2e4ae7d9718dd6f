//! Cache key layout
//!
//! Match-scoped keys are built from [`MatchIdentity`] only.

use crate::domain::{normalize_team, MatchIdentity};

pub const TOURS: &str = "betting:tours";
pub const LEAGUE_TABLE: &str = "league:table";
pub const SCHEDULE: &str = "league:schedule";
pub const RESULTS: &str = "league:results";
pub const ACHIEVEMENTS: &str = "achievements:v1";

pub const VOTED_PREFIX: &str = "voted:";
pub const VOTE_AGG_PREFIX: &str = "voteAgg:";

pub fn match_details(identity: &MatchIdentity) -> String {
    format!("md:details:{}", identity.key())
}

pub fn match_score(identity: &MatchIdentity) -> String {
    format!("md:score:{}", identity.key())
}

/// Stats are keyed by teams only
pub fn match_stats(identity: &MatchIdentity) -> String {
    format!(
        "md:stats:{}::{}",
        normalize_team(&identity.home),
        normalize_team(&identity.away)
    )
}

pub fn voted(identity: &MatchIdentity) -> String {
    format!("{}{}", VOTED_PREFIX, identity.key())
}

pub fn vote_aggregate(identity: &MatchIdentity) -> String {
    format!("{}{}", VOTE_AGG_PREFIX, identity.key())
}

/// Team-detail screen data, one key per section (`squad`, `matches`, ...)
pub fn team_detail(team: &str, section: &str) -> String {
    format!("{}{}", team_prefix(team), section)
}

/// Prefix of every cached team-detail key for a team
pub fn team_prefix(team: &str) -> String {
    format!("team:{}:", normalize_team(team))
}

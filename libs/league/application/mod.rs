//! Application Layer
//!
//! Push dispatch, snapshot merging, odds version ordering and the refresh
//! service. Depends on the domain and infrastructure layers.

pub mod dispatcher;
pub mod facade;
pub mod merger;
pub mod odds_guard;
pub mod refresher;

// Re-export application facade for binaries
pub use facade::{init_logging, init_logging_with_level, LiveSyncApp};

pub use dispatcher::{DataChangedCallback, PushDispatcher};
pub use merger::{merge_snapshots, patch_match_odds};
pub use odds_guard::OddsVersionGuard;
pub use refresher::RefreshService;

//! League live sync - main library
//!
//! Re-exports the workspace libraries and the helpers shared by the binaries.
//!
//! ## Architecture
//!
//! - **bin_common**: Common utilities for binary executables (CLI, runners)
//! - **league**: Cache, fetching, push dispatch (re-exported from workspace)
//! - **realtime**: Socket.IO push client (re-exported from workspace)
//!
//! ## Usage in Binaries
//!
//! ```rust,ignore
//! use league_sync::bin_common::{load_sync_config, ConfigType};
//! use league_sync::league::LiveSyncApp;
//! ```

// Re-export workspace libraries for convenience
pub use league;
pub use realtime;

// Binary common utilities
pub mod bin_common {
    //! Common utilities for binary executables

    pub mod cli;
    pub mod runner;

    pub use cli::{load_config_from_env, load_sync_config, parse_args, ConfigType};
    pub use runner::{BinaryRunner, RunConfig, StatusTicker};
}

//! Domain Layer
//!
//! Match identity, push payloads and application events.
//! This layer has no dependencies on infrastructure or application layers.

pub mod events;
pub mod identity;
pub mod push;
pub mod topics;

pub use events::{AppEvent, OddsUpdate, RefreshRequest};
pub use identity::{date_prefix, normalize_team, MatchIdentity};
pub use push::{DataChanged, DataPatch, DataType, LiveUpdate, MatchFinished, TopicUpdate};

//! Per-game progress records and the derived account view.

mod aggregate;
mod store;
mod sync;
mod types;

pub use aggregate::AggregateProgress;
pub use store::{validate_game_id, Namespace, ProgressStore};
pub use sync::{NoopSync, RemoteSync};
pub use types::{GameId, GameProgress, SessionSummary, UserAchievements, RECENT_WINDOW};

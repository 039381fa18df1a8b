pub mod config;
pub mod reconcile;
mod source;
mod store;

pub use config::SyncConfig;
pub use reconcile::{
    EventCounts, EventLeague, Phase, SportCounts, SyncError, SyncFailure, SyncPlan, SyncStats,
    full_sync, sync_events_for_league, sync_leagues_for_sport, sync_sports,
    sync_teams_for_league,
};
pub use source::SportsSource;
pub use store::{PgSyncStore, SyncStore};

use chrono::Utc;
use chrono_humanize::{Accuracy, HumanTime, Tense};
use log::{info, warn};
use rocket::serde::json::Json;
use rocket::{State, post};
use serde::{Deserialize, Serialize};
use sportsync_ingest::{PgSyncStore, SyncConfig, SyncError, SyncStats, full_sync};

use crate::DatabaseUrl;
use crate::api::error::ApiError;

#[derive(Debug, Default, Deserialize)]
pub struct SyncRequest {
    /// Overrides the configured sports for this run
    pub sports: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub message: &'static str,
    pub stats: SyncStats,
}

/// Runs a full sync and waits for it to finish. The body is optional.
#[post("/admin/sync", data = "<request>")]
pub async fn sync(
    request: Option<Json<SyncRequest>>,
    config: &State<SyncConfig>,
    url: &State<DatabaseUrl>,
) -> Result<Json<SyncResponse>, ApiError> {
    let sports = request.and_then(|request| request.into_inner().sports);
    let plan = config.plan(sports);

    let source = config.source()?;
    let mut store = PgSyncStore::connect(&url.0).await?;

    let sync_start = Utc::now();
    info!("Admin-triggered sync starting for {} sport(s)", plan.sports.len());
    let result = full_sync(&source, &mut store, &plan).await;
    let elapsed = HumanTime::from(Utc::now() - sync_start).to_text_en(Accuracy::Rough, Tense::Present);

    let stats = match result {
        Ok(stats) => stats,
        Err(SyncError::AlreadyRunning) => {
            warn!("Refused admin-triggered sync: another sync is already running");
            return Err(SyncError::AlreadyRunning.into());
        }
        Err(err) => {
            warn!("Admin-triggered sync failed after {elapsed}");
            return Err(err.into());
        }
    };

    info!("Admin-triggered sync finished in {elapsed}");
    Ok(Json(SyncResponse {
        message: "Sync completed successfully",
        stats,
    }))
}

use chrono::Utc;
use chrono_humanize::{Accuracy, HumanTime, Tense};
use log::{error, info};
use miette::{Context, IntoDiagnostic};
use sportsync_ingest::{PgSyncStore, SyncConfig, full_sync};

#[tokio::main]
async fn main() -> miette::Result<()> {
    env_logger::init();

    let config = SyncConfig::config()
        .into_diagnostic()
        .wrap_err("invalid sync configuration")?;
    let url = sportsync_db::postgres_url_from_environment()?;

    {
        let url = url.clone();
        tokio::task::spawn_blocking(move || sportsync_db::run_migrations(&url))
            .await
            .into_diagnostic()??;
    }

    let source = config.source()?;
    let mut store = PgSyncStore::connect(&url)
        .await
        .into_diagnostic()
        .wrap_err("couldn't connect to database")?;

    let plan = config.plan(None);
    let sync_start = Utc::now();
    info!("Starting sync against {}", source.base_url());

    let stats = match full_sync(&source, &mut store, &plan).await {
        Ok(stats) => stats,
        Err(err) => {
            error!("Sync failed after {}", elapsed_since(sync_start));
            return Err(err.into());
        }
    };

    info!(
        "Sync finished in {}: {} sports, {} leagues, {} teams, {} events added, {} updated, \
        {} skipped",
        elapsed_since(sync_start),
        stats.sports_added,
        stats.leagues_added,
        stats.teams_added,
        stats.events_added,
        stats.events_updated,
        stats.events_skipped,
    );
    for failure in &stats.failures {
        error!("{} sync for {} failed: {}", failure.phase, failure.target, failure.message);
    }

    Ok(())
}

fn elapsed_since(start: chrono::DateTime<Utc>) -> String {
    HumanTime::from(Utc::now() - start).to_text_en(Accuracy::Precise, Tense::Present)
}

mod api;

use log::error;
use miette::{Context, IntoDiagnostic};
use rocket::fairing::{self, AdHoc};
use rocket::figment::{Figment, map};
use rocket::{Build, Rocket};
use rocket_sync_db_pools::database as sync_database;
use rocket_sync_db_pools::diesel::PgConnection;
use sportsync_ingest::SyncConfig;

#[sync_database("sportsync")]
pub struct Db(PgConnection);

/// Url for the dedicated connection each admin-triggered sync opens
pub struct DatabaseUrl(pub String);

async fn run_migrations(rocket: Rocket<Build>) -> fairing::Result {
    let Some(url) = rocket.state::<DatabaseUrl>().map(|url| url.0.clone()) else {
        error!("No database url was configured, can't run migrations");
        return Err(rocket);
    };

    match tokio::task::spawn_blocking(move || sportsync_db::run_migrations(&url)).await {
        Ok(Ok(())) => Ok(rocket),
        Ok(Err(err)) => {
            error!("Failed to apply migrations: {:?}", miette::Report::new(err));
            Err(rocket)
        }
        Err(err) => {
            error!("Error joining migrations task: {err}");
            Err(rocket)
        }
    }
}

fn get_figment_with_db_url(url: &str) -> Figment {
    rocket::Config::figment().merge(("databases", map!["sportsync" => map!["url" => url]]))
}

fn build_rocket(url: String, sync_config: SyncConfig) -> miette::Result<Rocket<Build>> {
    let cors = rocket_cors::CorsOptions::default()
        .to_cors()
        .into_diagnostic()
        .wrap_err("invalid CORS configuration")?;

    Ok(rocket::custom(get_figment_with_db_url(&url))
        .attach(cors)
        .mount("/api", api::routes())
        .register("/api", api::catchers())
        .manage(DatabaseUrl(url))
        .manage(sync_config)
        .attach(Db::fairing())
        .attach(AdHoc::try_on_ignite("Migrations", run_migrations)))
}

#[rocket::main]
async fn main() -> miette::Result<()> {
    env_logger::init();

    let url = sportsync_db::postgres_url_from_environment()?;
    let sync_config = SyncConfig::config()
        .into_diagnostic()
        .wrap_err("invalid sync configuration")?;

    build_rocket(url, sync_config)?
        .launch()
        .await
        .into_diagnostic()?;

    Ok(())
}

use rocket::get;
use rocket::serde::json::Json;
use serde::Serialize;
use sportsync_db::QueryError;
use sportsync_db::models::{DbLeague, DbSport, DbTeam};

use crate::Db;
use crate::api::error::ApiError;

#[derive(Serialize)]
pub struct ApiSports {
    pub count: usize,
    pub sports: Vec<DbSport>,
}

#[derive(Serialize)]
pub struct ApiSportLeagues {
    pub sport: DbSport,
    pub count: usize,
    pub leagues: Vec<DbLeague>,
}

#[derive(Serialize)]
pub struct ApiLeagueTeams {
    pub league: DbLeague,
    pub count: usize,
    pub teams: Vec<DbTeam>,
}

#[get("/sports")]
pub async fn sports(db: Db) -> Result<Json<ApiSports>, ApiError> {
    let sports = db.run(|conn| sportsync_db::db::list_sports(conn)).await?;

    Ok(Json(ApiSports {
        count: sports.len(),
        sports,
    }))
}

#[get("/sports/<sport_id>/leagues")]
pub async fn sport_leagues(sport_id: i64, db: Db) -> Result<Json<ApiSportLeagues>, ApiError> {
    let found = db
        .run(move |conn| {
            let Some(sport) = sportsync_db::db::get_sport(conn, sport_id)? else {
                return Ok(None);
            };
            let leagues = sportsync_db::db::leagues_for_sport(conn, &sport)?;
            Ok::<_, QueryError>(Some((sport, leagues)))
        })
        .await?;

    let (sport, leagues) = found.ok_or(ApiError::NotFound {
        what: "sport",
        id: sport_id,
    })?;

    Ok(Json(ApiSportLeagues {
        sport,
        count: leagues.len(),
        leagues,
    }))
}

#[get("/leagues/<league_id>/teams")]
pub async fn league_teams(league_id: i64, db: Db) -> Result<Json<ApiLeagueTeams>, ApiError> {
    let found = db
        .run(move |conn| {
            let Some(league) = sportsync_db::db::get_league(conn, league_id)? else {
                return Ok(None);
            };
            let teams = sportsync_db::db::teams_for_league(conn, &league)?;
            Ok::<_, QueryError>(Some((league, teams)))
        })
        .await?;

    let (league, teams) = found.ok_or(ApiError::NotFound {
        what: "league",
        id: league_id,
    })?;

    Ok(Json(ApiLeagueTeams {
        league,
        count: teams.len(),
        teams,
    }))
}

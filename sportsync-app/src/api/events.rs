use chrono::NaiveDateTime;
use hashbrown::HashMap;
use itertools::Itertools;
use rocket::get;
use rocket::serde::json::Json;
use serde::Serialize;
use sportsync_db::db::EventFilter;
use sportsync_db::models::DbEvent;
use sportsync_db::{PgConnection, QueryResult};

use crate::Db;
use crate::api::error::ApiError;

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Serialize)]
pub struct ApiNamed {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct ApiEvent {
    pub id: i64,
    pub league: ApiNamed,
    pub home_team: ApiNamed,
    pub away_team: ApiNamed,
    /// Civil start time, with no zone attached
    pub event_datetime: NaiveDateTime,
    pub status: String,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
    pub external_api_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApiEventPage {
    pub total: i64,
    pub offset: i64,
    pub limit: i64,
    pub events: Vec<ApiEvent>,
}

fn page_bounds(offset: Option<i64>, limit: Option<i64>) -> (i64, i64) {
    let offset = offset.unwrap_or(0).max(0);
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    (offset, limit)
}

fn named(names: &HashMap<i64, String>, id: i64) -> ApiNamed {
    ApiNamed {
        id,
        name: names.get(&id).cloned().unwrap_or_default(),
    }
}

// Attaches league and team names with one query per table
fn describe_events(conn: &mut PgConnection, events: Vec<DbEvent>) -> QueryResult<Vec<ApiEvent>> {
    let team_ids = events
        .iter()
        .flat_map(|e| [e.home_team_id, e.away_team_id])
        .unique()
        .collect_vec();
    let league_ids = events.iter().map(|e| e.league_id).unique().collect_vec();

    let team_names: HashMap<i64, String> = sportsync_db::db::get_teams(conn, &team_ids)?
        .into_iter()
        .map(|t| (t.id, t.name))
        .collect();
    let league_names: HashMap<i64, String> = sportsync_db::db::get_leagues(conn, &league_ids)?
        .into_iter()
        .map(|l| (l.id, l.name))
        .collect();

    Ok(events
        .into_iter()
        .map(|e| ApiEvent {
            id: e.id,
            league: named(&league_names, e.league_id),
            home_team: named(&team_names, e.home_team_id),
            away_team: named(&team_names, e.away_team_id),
            event_datetime: e.event_datetime,
            status: e.status,
            home_score: e.home_score,
            away_score: e.away_score,
            external_api_id: e.external_api_id,
        })
        .collect())
}

#[get("/events?<league_id>&<status>&<offset>&<limit>")]
pub async fn events(
    league_id: Option<i64>,
    status: Option<String>,
    offset: Option<i64>,
    limit: Option<i64>,
    db: Db,
) -> Result<Json<ApiEventPage>, ApiError> {
    let filter = EventFilter { league_id, status };
    let (offset, limit) = page_bounds(offset, limit);

    let (total, events) = db
        .run(move |conn| {
            let total = sportsync_db::db::count_events(conn, &filter)?;
            let events = sportsync_db::db::list_events(conn, &filter, offset, limit)?;
            let events = describe_events(conn, events)?;
            Ok::<_, ApiError>((total, events))
        })
        .await?;

    Ok(Json(ApiEventPage {
        total,
        offset,
        limit,
        events,
    }))
}

#[get("/events/<event_id>")]
pub async fn event(event_id: i64, db: Db) -> Result<Json<ApiEvent>, ApiError> {
    let event = db
        .run(move |conn| {
            let Some(event) = sportsync_db::db::get_event(conn, event_id)? else {
                return Ok(None);
            };
            Ok::<_, ApiError>(describe_events(conn, vec![event])?.into_iter().next())
        })
        .await?;

    event.map(Json).ok_or(ApiError::NotFound {
        what: "event",
        id: event_id,
    })
}

//! Queries used by the sync engine. These run on an [AsyncPgConnection] so
//! they can be interleaved with requests to the sports source.
//!
//! Every insert here is insert-if-absent against a unique index and returns
//! `None` when the row already existed, so overlapping syncs can't create
//! duplicates even if they both miss on the preceding lookup.

use diesel::prelude::*;
use diesel::sql_types::{BigInt, Bool};
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::models::{DbEvent, DbLeague, DbSport, DbTeam, NewEvent, NewLeague, NewSport, NewTeam};
use crate::schema::data_schema::data::events::dsl as events_dsl;
use crate::schema::data_schema::data::leagues::dsl as leagues_dsl;
use crate::schema::data_schema::data::sports::dsl as sports_dsl;
use crate::schema::data_schema::data::teams::dsl as teams_dsl;

const SYNC_LOCK_ID: i64 = 42417;

pub async fn find_sport_by_name(
    conn: &mut AsyncPgConnection,
    name: &str,
) -> QueryResult<Option<DbSport>> {
    sports_dsl::sports
        .filter(sports_dsl::name.eq(name))
        .select(DbSport::as_select())
        .get_result(conn)
        .await
        .optional()
}

pub async fn insert_sport_if_absent(
    conn: &mut AsyncPgConnection,
    name: &str,
) -> QueryResult<Option<DbSport>> {
    NewSport { name }
        .insert_into(sports_dsl::sports)
        .on_conflict_do_nothing()
        .returning(DbSport::as_returning())
        .get_result(conn)
        .await
        .optional()
}

pub async fn find_league(
    conn: &mut AsyncPgConnection,
    sport_id: i64,
    name: &str,
) -> QueryResult<Option<DbLeague>> {
    leagues_dsl::leagues
        .filter(leagues_dsl::sport_id.eq(sport_id))
        .filter(leagues_dsl::name.eq(name))
        .select(DbLeague::as_select())
        .get_result(conn)
        .await
        .optional()
}

/// League names are only unique within a sport. When two sports share a
/// league name the oldest row wins.
pub async fn find_league_by_name(
    conn: &mut AsyncPgConnection,
    name: &str,
) -> QueryResult<Option<DbLeague>> {
    leagues_dsl::leagues
        .filter(leagues_dsl::name.eq(name))
        .order_by(leagues_dsl::id.asc())
        .select(DbLeague::as_select())
        .first(conn)
        .await
        .optional()
}

pub async fn insert_league_if_absent(
    conn: &mut AsyncPgConnection,
    sport_id: i64,
    name: &str,
) -> QueryResult<Option<DbLeague>> {
    NewLeague { sport_id, name }
        .insert_into(leagues_dsl::leagues)
        .on_conflict_do_nothing()
        .returning(DbLeague::as_returning())
        .get_result(conn)
        .await
        .optional()
}

pub async fn find_league_with_teams(
    conn: &mut AsyncPgConnection,
    name: &str,
) -> QueryResult<Option<(DbLeague, Vec<DbTeam>)>> {
    let Some(league) = find_league_by_name(conn, name).await? else {
        return Ok(None);
    };

    let teams = DbTeam::belonging_to(&league)
        .order_by(teams_dsl::id.asc())
        .select(DbTeam::as_select())
        .load(conn)
        .await?;

    Ok(Some((league, teams)))
}

pub async fn find_team(
    conn: &mut AsyncPgConnection,
    league_id: i64,
    name: &str,
) -> QueryResult<Option<DbTeam>> {
    teams_dsl::teams
        .filter(teams_dsl::league_id.eq(league_id))
        .filter(teams_dsl::name.eq(name))
        .select(DbTeam::as_select())
        .get_result(conn)
        .await
        .optional()
}

pub async fn insert_team_if_absent(
    conn: &mut AsyncPgConnection,
    league_id: i64,
    name: &str,
) -> QueryResult<Option<DbTeam>> {
    NewTeam { league_id, name }
        .insert_into(teams_dsl::teams)
        .on_conflict_do_nothing()
        .returning(DbTeam::as_returning())
        .get_result(conn)
        .await
        .optional()
}

pub async fn find_event_by_external_id(
    conn: &mut AsyncPgConnection,
    external_api_id: &str,
) -> QueryResult<Option<DbEvent>> {
    events_dsl::events
        .filter(events_dsl::external_api_id.eq(external_api_id))
        .select(DbEvent::as_select())
        .get_result(conn)
        .await
        .optional()
}

pub async fn insert_event_if_absent(
    conn: &mut AsyncPgConnection,
    event: &NewEvent<'_>,
) -> QueryResult<Option<DbEvent>> {
    event
        .insert_into(events_dsl::events)
        .on_conflict_do_nothing()
        .returning(DbEvent::as_returning())
        .get_result(conn)
        .await
        .optional()
}

/// Only the result columns of an event ever change after it's created
pub async fn update_event_result(
    conn: &mut AsyncPgConnection,
    event_id: i64,
    status: &str,
    home_score: Option<i32>,
    away_score: Option<i32>,
) -> QueryResult<usize> {
    diesel::update(events_dsl::events.filter(events_dsl::id.eq(event_id)))
        .set((
            events_dsl::status.eq(status),
            events_dsl::home_score.eq(home_score),
            events_dsl::away_score.eq(away_score),
        ))
        .execute(conn)
        .await
}

#[derive(QueryableByName)]
struct AdvisoryLockResult {
    #[diesel(sql_type = Bool)]
    result: bool,
}

/// Session-level advisory lock that serializes full syncs across every
/// process sharing the database. Returns false if another session holds it.
pub async fn try_acquire_sync_lock(conn: &mut AsyncPgConnection) -> QueryResult<bool> {
    diesel::sql_query("select pg_try_advisory_lock($1) as result;")
        .bind::<BigInt, _>(SYNC_LOCK_ID)
        .get_result::<AdvisoryLockResult>(conn)
        .await
        .map(|r| r.result)
}

pub async fn release_sync_lock(conn: &mut AsyncPgConnection) -> QueryResult<bool> {
    diesel::sql_query("select pg_advisory_unlock($1) as result;")
        .bind::<BigInt, _>(SYNC_LOCK_ID)
        .get_result::<AdvisoryLockResult>(conn)
        .await
        .map(|r| r.result)
}

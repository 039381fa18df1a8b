mod events;

pub use events::*;

use diesel::{PgConnection, prelude::*};

use crate::models::{DbLeague, DbSport, DbTeam};
use crate::schema::data_schema::data::leagues::dsl as leagues_dsl;
use crate::schema::data_schema::data::sports::dsl as sports_dsl;
use crate::schema::data_schema::data::teams::dsl as teams_dsl;

pub fn list_sports(conn: &mut PgConnection) -> QueryResult<Vec<DbSport>> {
    sports_dsl::sports
        .order_by(sports_dsl::name.asc())
        .select(DbSport::as_select())
        .load(conn)
}

pub fn get_sport(conn: &mut PgConnection, sport_id: i64) -> QueryResult<Option<DbSport>> {
    sports_dsl::sports
        .find(sport_id)
        .select(DbSport::as_select())
        .get_result(conn)
        .optional()
}

pub fn leagues_for_sport(conn: &mut PgConnection, sport: &DbSport) -> QueryResult<Vec<DbLeague>> {
    DbLeague::belonging_to(sport)
        .order_by(leagues_dsl::name.asc())
        .select(DbLeague::as_select())
        .load(conn)
}

pub fn get_league(conn: &mut PgConnection, league_id: i64) -> QueryResult<Option<DbLeague>> {
    leagues_dsl::leagues
        .find(league_id)
        .select(DbLeague::as_select())
        .get_result(conn)
        .optional()
}

pub fn get_leagues(conn: &mut PgConnection, league_ids: &[i64]) -> QueryResult<Vec<DbLeague>> {
    leagues_dsl::leagues
        .filter(leagues_dsl::id.eq_any(league_ids))
        .select(DbLeague::as_select())
        .load(conn)
}

pub fn teams_for_league(conn: &mut PgConnection, league: &DbLeague) -> QueryResult<Vec<DbTeam>> {
    DbTeam::belonging_to(league)
        .order_by(teams_dsl::name.asc())
        .select(DbTeam::as_select())
        .load(conn)
}

pub fn get_teams(conn: &mut PgConnection, team_ids: &[i64]) -> QueryResult<Vec<DbTeam>> {
    teams_dsl::teams
        .filter(teams_dsl::id.eq_any(team_ids))
        .select(DbTeam::as_select())
        .load(conn)
}

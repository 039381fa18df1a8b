use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::Serialize;

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::data_schema::data::sports)]
pub struct NewSport<'a> {
    pub name: &'a str,
}

#[derive(Debug, Clone, PartialEq, Identifiable, Queryable, Selectable, Serialize)]
#[diesel(table_name = crate::data_schema::data::sports)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DbSport {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::data_schema::data::leagues)]
pub struct NewLeague<'a> {
    pub sport_id: i64,
    pub name: &'a str,
}

#[derive(Debug, Clone, PartialEq, Identifiable, Queryable, Selectable, Associations, Serialize)]
#[diesel(belongs_to(DbSport, foreign_key = sport_id))]
#[diesel(table_name = crate::data_schema::data::leagues)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DbLeague {
    pub id: i64,
    pub sport_id: i64,
    pub name: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::data_schema::data::teams)]
pub struct NewTeam<'a> {
    pub league_id: i64,
    pub name: &'a str,
}

#[derive(Debug, Clone, PartialEq, Identifiable, Queryable, Selectable, Associations, Serialize)]
#[diesel(belongs_to(DbLeague, foreign_key = league_id))]
#[diesel(table_name = crate::data_schema::data::teams)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DbTeam {
    pub id: i64,
    pub league_id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = crate::data_schema::data::events)]
#[diesel(treat_none_as_default_value = false)]
pub struct NewEvent<'a> {
    pub league_id: i64,
    pub home_team_id: i64,
    pub away_team_id: i64,
    pub event_datetime: NaiveDateTime,
    pub status: &'a str,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
    pub external_api_id: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Identifiable, Queryable, Selectable, Associations, Serialize)]
#[diesel(belongs_to(DbLeague, foreign_key = league_id))]
#[diesel(table_name = crate::data_schema::data::events)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DbEvent {
    pub id: i64,
    pub league_id: i64,
    pub home_team_id: i64,
    pub away_team_id: i64,
    pub event_datetime: NaiveDateTime,
    // Kept as text: seed data and older rows may carry statuses the
    // sync never produces
    pub status: String,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
    pub external_api_id: Option<String>,
}

/// The statuses the sync derives. Stored in `events.status` as their
/// display string.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
pub enum EventStatus {
    Scheduled,
    Final,
}

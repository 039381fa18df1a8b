use diesel::pg::Pg;
use diesel::{PgConnection, prelude::*};

use crate::models::DbEvent;
use crate::schema::data_schema::data::events;
use crate::schema::data_schema::data::events::dsl as events_dsl;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct EventFilter {
    pub league_id: Option<i64>,
    pub status: Option<String>,
}

fn filtered_events(filter: &EventFilter) -> events::BoxedQuery<'_, Pg> {
    let mut query = events_dsl::events.into_boxed();

    if let Some(league_id) = filter.league_id {
        query = query.filter(events_dsl::league_id.eq(league_id));
    }

    if let Some(status) = &filter.status {
        query = query.filter(events_dsl::status.eq(status.as_str()));
    }

    query
}

pub fn count_events(conn: &mut PgConnection, filter: &EventFilter) -> QueryResult<i64> {
    filtered_events(filter).count().get_result(conn)
}

pub fn list_events(
    conn: &mut PgConnection,
    filter: &EventFilter,
    offset: i64,
    limit: i64,
) -> QueryResult<Vec<DbEvent>> {
    filtered_events(filter)
        .order_by((events_dsl::event_datetime.asc(), events_dsl::id.asc()))
        .offset(offset)
        .limit(limit)
        .select(DbEvent::as_select())
        .load(conn)
}

pub fn get_event(conn: &mut PgConnection, event_id: i64) -> QueryResult<Option<DbEvent>> {
    events_dsl::events
        .find(event_id)
        .select(DbEvent::as_select())
        .get_result(conn)
        .optional()
}

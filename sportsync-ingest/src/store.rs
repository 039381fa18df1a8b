use sportsync_db::models::{DbEvent, DbLeague, DbSport, DbTeam, EventStatus, NewEvent};
use sportsync_db::{AsyncConnection, AsyncPgConnection, ConnectionError, QueryError, async_db};
use std::error::Error;
use std::future::Future;

/// The persistence primitives the sync is built from. Inserts are
/// insert-if-absent: they return `None` when an equivalent row already
/// exists rather than creating a duplicate.
pub trait SyncStore {
    type Error: Error + Send + Sync + 'static;

    /// Returns false if another sync currently holds the lock
    fn acquire_sync_lock(&mut self) -> impl Future<Output = Result<bool, Self::Error>> + Send;

    fn release_sync_lock(&mut self) -> impl Future<Output = Result<(), Self::Error>> + Send;

    fn find_sport(
        &mut self,
        name: &str,
    ) -> impl Future<Output = Result<Option<DbSport>, Self::Error>> + Send;

    fn insert_sport(
        &mut self,
        name: &str,
    ) -> impl Future<Output = Result<Option<DbSport>, Self::Error>> + Send;

    fn find_league(
        &mut self,
        sport_id: i64,
        name: &str,
    ) -> impl Future<Output = Result<Option<DbLeague>, Self::Error>> + Send;

    fn insert_league(
        &mut self,
        sport_id: i64,
        name: &str,
    ) -> impl Future<Output = Result<Option<DbLeague>, Self::Error>> + Send;

    fn find_league_by_name(
        &mut self,
        name: &str,
    ) -> impl Future<Output = Result<Option<DbLeague>, Self::Error>> + Send;

    fn find_league_with_teams(
        &mut self,
        name: &str,
    ) -> impl Future<Output = Result<Option<(DbLeague, Vec<DbTeam>)>, Self::Error>> + Send;

    fn find_team(
        &mut self,
        league_id: i64,
        name: &str,
    ) -> impl Future<Output = Result<Option<DbTeam>, Self::Error>> + Send;

    fn insert_team(
        &mut self,
        league_id: i64,
        name: &str,
    ) -> impl Future<Output = Result<Option<DbTeam>, Self::Error>> + Send;

    fn find_event(
        &mut self,
        external_api_id: &str,
    ) -> impl Future<Output = Result<Option<DbEvent>, Self::Error>> + Send;

    fn insert_event(
        &mut self,
        event: &NewEvent<'_>,
    ) -> impl Future<Output = Result<Option<DbEvent>, Self::Error>> + Send;

    fn update_event_result(
        &mut self,
        event_id: i64,
        status: EventStatus,
        home_score: Option<i32>,
        away_score: Option<i32>,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// [SyncStore] over a dedicated postgres connection. The sync lock is
/// session scoped, so the connection must not be shared with other work
/// while a sync is running.
pub struct PgSyncStore {
    conn: AsyncPgConnection,
}

impl PgSyncStore {
    pub fn new(conn: AsyncPgConnection) -> Self {
        Self { conn }
    }

    pub async fn connect(url: &str) -> Result<Self, ConnectionError> {
        Ok(Self::new(AsyncPgConnection::establish(url).await?))
    }
}

impl SyncStore for PgSyncStore {
    type Error = QueryError;

    async fn acquire_sync_lock(&mut self) -> Result<bool, QueryError> {
        async_db::try_acquire_sync_lock(&mut self.conn).await
    }

    async fn release_sync_lock(&mut self) -> Result<(), QueryError> {
        async_db::release_sync_lock(&mut self.conn).await.map(|_| ())
    }

    async fn find_sport(&mut self, name: &str) -> Result<Option<DbSport>, QueryError> {
        async_db::find_sport_by_name(&mut self.conn, name).await
    }

    async fn insert_sport(&mut self, name: &str) -> Result<Option<DbSport>, QueryError> {
        async_db::insert_sport_if_absent(&mut self.conn, name).await
    }

    async fn find_league(
        &mut self,
        sport_id: i64,
        name: &str,
    ) -> Result<Option<DbLeague>, QueryError> {
        async_db::find_league(&mut self.conn, sport_id, name).await
    }

    async fn insert_league(
        &mut self,
        sport_id: i64,
        name: &str,
    ) -> Result<Option<DbLeague>, QueryError> {
        async_db::insert_league_if_absent(&mut self.conn, sport_id, name).await
    }

    async fn find_league_by_name(&mut self, name: &str) -> Result<Option<DbLeague>, QueryError> {
        async_db::find_league_by_name(&mut self.conn, name).await
    }

    async fn find_league_with_teams(
        &mut self,
        name: &str,
    ) -> Result<Option<(DbLeague, Vec<DbTeam>)>, QueryError> {
        async_db::find_league_with_teams(&mut self.conn, name).await
    }

    async fn find_team(&mut self, league_id: i64, name: &str) -> Result<Option<DbTeam>, QueryError> {
        async_db::find_team(&mut self.conn, league_id, name).await
    }

    async fn insert_team(
        &mut self,
        league_id: i64,
        name: &str,
    ) -> Result<Option<DbTeam>, QueryError> {
        async_db::insert_team_if_absent(&mut self.conn, league_id, name).await
    }

    async fn find_event(&mut self, external_api_id: &str) -> Result<Option<DbEvent>, QueryError> {
        async_db::find_event_by_external_id(&mut self.conn, external_api_id).await
    }

    async fn insert_event(&mut self, event: &NewEvent<'_>) -> Result<Option<DbEvent>, QueryError> {
        async_db::insert_event_if_absent(&mut self.conn, event).await
    }

    async fn update_event_result(
        &mut self,
        event_id: i64,
        status: EventStatus,
        home_score: Option<i32>,
        away_score: Option<i32>,
    ) -> Result<(), QueryError> {
        async_db::update_event_result(
            &mut self.conn,
            event_id,
            status.as_ref(),
            home_score,
            away_score,
        )
        .await
        .map(|_| ())
    }
}

use sportsdb::{ApiEvent, ApiLeague, ApiSport, ApiTeam, SportsDb, SportsDbError};
use std::error::Error;
use std::future::Future;

/// The slice of the external sports source that the sync reads from.
pub trait SportsSource {
    type Error: Error + Send + Sync + 'static;

    fn all_sports(&self) -> impl Future<Output = Result<Vec<ApiSport>, Self::Error>> + Send;

    fn leagues_by_sport(
        &self,
        sport: &str,
    ) -> impl Future<Output = Result<Vec<ApiLeague>, Self::Error>> + Send;

    fn teams_by_league(
        &self,
        league: &str,
    ) -> impl Future<Output = Result<Vec<ApiTeam>, Self::Error>> + Send;

    /// `league_id` is the source's own league identifier, not a local id
    fn upcoming_events(
        &self,
        league_id: &str,
    ) -> impl Future<Output = Result<Vec<ApiEvent>, Self::Error>> + Send;

    fn past_events(
        &self,
        league_id: &str,
    ) -> impl Future<Output = Result<Vec<ApiEvent>, Self::Error>> + Send;
}

impl SportsSource for SportsDb {
    type Error = SportsDbError;

    async fn all_sports(&self) -> Result<Vec<ApiSport>, SportsDbError> {
        SportsDb::all_sports(self).await
    }

    async fn leagues_by_sport(&self, sport: &str) -> Result<Vec<ApiLeague>, SportsDbError> {
        SportsDb::leagues_by_sport(self, sport).await
    }

    async fn teams_by_league(&self, league: &str) -> Result<Vec<ApiTeam>, SportsDbError> {
        SportsDb::teams_by_league(self, league).await
    }

    async fn upcoming_events(&self, league_id: &str) -> Result<Vec<ApiEvent>, SportsDbError> {
        self.upcoming_events_by_league(league_id).await
    }

    async fn past_events(&self, league_id: &str) -> Result<Vec<ApiEvent>, SportsDbError> {
        self.past_events_by_league(league_id).await
    }
}

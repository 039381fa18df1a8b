mod models;

pub use models::*;

use chrono::NaiveDate;
use log::{debug, warn};
use miette::Diagnostic;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://www.thesportsdb.com/api/v1/json";
/// The source's public test key
pub const DEFAULT_API_KEY: &str = "3";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error, Diagnostic)]
pub enum SportsDbError {
    #[error("error building the HTTP client")]
    ClientBuildError(#[source] reqwest::Error),

    #[error("error building request for {endpoint}")]
    RequestBuildError {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("error executing request for {endpoint}")]
    RequestExecuteError {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("sports source reported an error for {endpoint}")]
    StatusError {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("error extracting response body for {endpoint}")]
    RequestBodyError {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("error deserializing response for {endpoint}")]
    DeserializeError {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Client for a TheSportsDB-compatible JSON API.
///
/// Every request is sent to `{base_url}/{api_key}/{endpoint}`. Responses wrap
/// their payload in a single list-valued key (`sports`, `leagues`, ...); a
/// missing or `null` list is returned as an empty `Vec` rather than an error.
#[derive(Debug, Clone)]
pub struct SportsDb {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SportsDb {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SportsDbError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(SportsDbError::ClientBuildError)?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn all_sports(&self) -> Result<Vec<ApiSport>, SportsDbError> {
        self.list("all_sports.php", &[], "sports").await
    }

    /// The source's filter is advisory. Callers that care must check
    /// [ApiLeague::sport] themselves.
    pub async fn leagues_by_sport(&self, sport: &str) -> Result<Vec<ApiLeague>, SportsDbError> {
        self.list("search_all_leagues.php", &[("s", sport)], "leagues")
            .await
    }

    pub async fn teams_by_league(&self, league: &str) -> Result<Vec<ApiTeam>, SportsDbError> {
        self.list("search_all_teams.php", &[("l", league)], "teams")
            .await
    }

    pub async fn upcoming_events_by_league(
        &self,
        league_id: &str,
    ) -> Result<Vec<ApiEvent>, SportsDbError> {
        self.list("eventsnextleague.php", &[("id", league_id)], "events")
            .await
    }

    pub async fn past_events_by_league(
        &self,
        league_id: &str,
    ) -> Result<Vec<ApiEvent>, SportsDbError> {
        self.list("eventspastleague.php", &[("id", league_id)], "events")
            .await
    }

    // This one endpoint uses `results` instead of `events`
    pub async fn events_by_team(&self, team_id: &str) -> Result<Vec<ApiEvent>, SportsDbError> {
        self.list("eventslast.php", &[("id", team_id)], "results")
            .await
    }

    pub async fn event_by_id(&self, event_id: &str) -> Result<Option<ApiEvent>, SportsDbError> {
        let events: Vec<ApiEvent> = self
            .list("lookupevent.php", &[("id", event_id)], "events")
            .await?;

        Ok(events.into_iter().next())
    }

    pub async fn search_teams(&self, name: &str) -> Result<Vec<ApiTeam>, SportsDbError> {
        self.list("searchteams.php", &[("t", name)], "teams").await
    }

    pub async fn events_by_date(&self, date: NaiveDate) -> Result<Vec<ApiEvent>, SportsDbError> {
        let date = date.format("%Y-%m-%d").to_string();
        self.list("eventsday.php", &[("d", &date)], "events").await
    }

    async fn list<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        query: &[(&str, &str)],
        key: &'static str,
    ) -> Result<Vec<T>, SportsDbError> {
        let result = self.get(endpoint, query).await;
        if let Err(err) = &result {
            warn!("Sports source request for {endpoint} failed: {err}");
        }

        let mut body = result?;
        match body.get_mut(key).map(serde_json::Value::take) {
            None | Some(serde_json::Value::Null) => {
                debug!("{endpoint} returned no `{key}`");
                Ok(Vec::new())
            }
            Some(serde_json::Value::Array(items)) => Ok(items
                .into_iter()
                .filter_map(|item| match <T as serde::Deserialize>::deserialize(&item) {
                    Ok(parsed) => Some(parsed),
                    Err(err) => {
                        warn!("Dropping unreadable `{key}` entry from {endpoint}: {err}. Entry: {item}");
                        None
                    }
                })
                .collect()),
            Some(other) => {
                // The free tier sometimes puts a message string here instead of a list
                warn!("{endpoint} returned a non-list `{key}`, treating it as empty: {other}");
                Ok(Vec::new())
            }
        }
    }

    async fn get(
        &self,
        endpoint: &'static str,
        query: &[(&str, &str)],
    ) -> Result<serde_json::Value, SportsDbError> {
        let url = format!("{}/{}/{}", self.base_url, self.api_key, endpoint);
        debug!("Fetching {endpoint} with {query:?}");

        let request = self
            .client
            .get(&url)
            .query(query)
            .build()
            .map_err(|source| SportsDbError::RequestBuildError { endpoint, source })?;

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|source| SportsDbError::RequestExecuteError { endpoint, source })?
            .error_for_status()
            .map_err(|source| SportsDbError::StatusError { endpoint, source })?;

        let text = response
            .text()
            .await
            .map_err(|source| SportsDbError::RequestBodyError { endpoint, source })?;

        // An empty body is how the source says "nothing here" on some endpoints
        if text.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }

        serde_json::from_str(&text)
            .map_err(|source| SportsDbError::DeserializeError { endpoint, source })
    }
}

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use sportsdb::{SportsDb, SportsDbError};
use std::time::Duration;

use crate::reconcile::{EventLeague, SyncPlan};

#[derive(Debug, PartialEq, Deserialize, Serialize)]
pub struct SyncConfig {
    pub source_base_url: String,
    pub source_api_key: String,
    pub request_timeout_secs: u64,
    pub default_sports: Vec<String>,
    pub team_leagues: Vec<String>,
    pub event_leagues: Vec<EventLeague>,
    pub include_past_events: bool,
    pub strict: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        let major_leagues = [
            ("4328", "English Premier League"),
            ("4387", "NBA"),
            ("4391", "NFL"),
            ("4335", "La Liga"),
            ("4332", "Serie A"),
            ("4331", "Bundesliga"),
        ];

        Self {
            source_base_url: sportsdb::DEFAULT_BASE_URL.to_string(),
            source_api_key: sportsdb::DEFAULT_API_KEY.to_string(),
            request_timeout_secs: sportsdb::DEFAULT_TIMEOUT.as_secs(),
            default_sports: vec![
                "Soccer".to_string(),
                "Basketball".to_string(),
                "American Football".to_string(),
            ],
            team_leagues: major_leagues
                .iter()
                .map(|(_, name)| name.to_string())
                .collect(),
            event_leagues: major_leagues
                .iter()
                .map(|(id, name)| EventLeague::new(*id, *name))
                .collect(),
            include_past_events: false,
            strict: false,
        }
    }
}

impl SyncConfig {
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file("SPORTSYNC.toml"))
            .merge(Env::prefixed("SPORTSYNC_"))
    }

    pub fn config() -> figment::Result<Self> {
        Self::figment().extract()
    }

    /// The plan for one run. `sports` overrides the configured default
    /// sports when given.
    pub fn plan(&self, sports: Option<Vec<String>>) -> SyncPlan {
        SyncPlan {
            sports: sports.unwrap_or_else(|| self.default_sports.clone()),
            team_leagues: self.team_leagues.clone(),
            event_leagues: self.event_leagues.clone(),
            include_past_events: self.include_past_events,
            strict: self.strict,
        }
    }

    pub fn source(&self) -> Result<SportsDb, SportsDbError> {
        SportsDb::new(
            &self.source_base_url,
            &self.source_api_key,
            Duration::from_secs(self.request_timeout_secs),
        )
    }
}

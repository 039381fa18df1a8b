use sportsdb::{ApiEvent, ApiLeague, ApiSport, ApiTeam};
use sportsync_db::models::{DbEvent, DbLeague, DbSport, DbTeam, EventStatus, NewEvent};
use sportsync_ingest::{
    EventLeague, Phase, SportsSource, SyncError, SyncPlan, SyncStore, full_sync,
    sync_leagues_for_sport, sync_sports,
};
use std::collections::{HashMap, HashSet};

#[derive(Debug, thiserror::Error)]
#[error("sports source unavailable")]
struct SourceDown;

#[derive(Debug, thiserror::Error)]
#[error("store unavailable")]
struct StoreDown;

#[derive(Default)]
struct FakeSource {
    sports: Vec<ApiSport>,
    leagues: HashMap<String, Vec<ApiLeague>>,
    teams: HashMap<String, Vec<ApiTeam>>,
    upcoming: HashMap<String, Vec<ApiEvent>>,
    past: HashMap<String, Vec<ApiEvent>>,
    catalog_down: bool,
    failing_league_sports: HashSet<String>,
    failing_team_leagues: HashSet<String>,
}

impl SportsSource for FakeSource {
    type Error = SourceDown;

    async fn all_sports(&self) -> Result<Vec<ApiSport>, SourceDown> {
        if self.catalog_down {
            return Err(SourceDown);
        }
        Ok(self.sports.clone())
    }

    async fn leagues_by_sport(&self, sport: &str) -> Result<Vec<ApiLeague>, SourceDown> {
        if self.failing_league_sports.contains(sport) {
            return Err(SourceDown);
        }
        Ok(self.leagues.get(sport).cloned().unwrap_or_default())
    }

    async fn teams_by_league(&self, league: &str) -> Result<Vec<ApiTeam>, SourceDown> {
        if self.failing_team_leagues.contains(league) {
            return Err(SourceDown);
        }
        Ok(self.teams.get(league).cloned().unwrap_or_default())
    }

    async fn upcoming_events(&self, league_id: &str) -> Result<Vec<ApiEvent>, SourceDown> {
        Ok(self.upcoming.get(league_id).cloned().unwrap_or_default())
    }

    async fn past_events(&self, league_id: &str) -> Result<Vec<ApiEvent>, SourceDown> {
        Ok(self.past.get(league_id).cloned().unwrap_or_default())
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
struct MemoryStore {
    next_id: i64,
    sports: Vec<DbSport>,
    leagues: Vec<DbLeague>,
    teams: Vec<DbTeam>,
    events: Vec<DbEvent>,
    locked: bool,
    locked_elsewhere: bool,
    // Simulates another writer inserting the event between our lookup and
    // our insert
    lose_event_insert_race: bool,
    failing_team_inserts: HashSet<String>,
}

impl MemoryStore {
    fn id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn event(&self, external_id: &str) -> Option<&DbEvent> {
        self.events
            .iter()
            .find(|e| e.external_api_id.as_deref() == Some(external_id))
    }
}

impl SyncStore for MemoryStore {
    type Error = StoreDown;

    async fn acquire_sync_lock(&mut self) -> Result<bool, StoreDown> {
        if self.locked || self.locked_elsewhere {
            return Ok(false);
        }
        self.locked = true;
        Ok(true)
    }

    async fn release_sync_lock(&mut self) -> Result<(), StoreDown> {
        self.locked = false;
        Ok(())
    }

    async fn find_sport(&mut self, name: &str) -> Result<Option<DbSport>, StoreDown> {
        Ok(self.sports.iter().find(|s| s.name == name).cloned())
    }

    async fn insert_sport(&mut self, name: &str) -> Result<Option<DbSport>, StoreDown> {
        if self.sports.iter().any(|s| s.name == name) {
            return Ok(None);
        }
        let sport = DbSport {
            id: self.id(),
            name: name.to_string(),
        };
        self.sports.push(sport.clone());
        Ok(Some(sport))
    }

    async fn find_league(
        &mut self,
        sport_id: i64,
        name: &str,
    ) -> Result<Option<DbLeague>, StoreDown> {
        Ok(self
            .leagues
            .iter()
            .find(|l| l.sport_id == sport_id && l.name == name)
            .cloned())
    }

    async fn insert_league(
        &mut self,
        sport_id: i64,
        name: &str,
    ) -> Result<Option<DbLeague>, StoreDown> {
        if self
            .leagues
            .iter()
            .any(|l| l.sport_id == sport_id && l.name == name)
        {
            return Ok(None);
        }
        let league = DbLeague {
            id: self.id(),
            sport_id,
            name: name.to_string(),
        };
        self.leagues.push(league.clone());
        Ok(Some(league))
    }

    async fn find_league_by_name(&mut self, name: &str) -> Result<Option<DbLeague>, StoreDown> {
        Ok(self
            .leagues
            .iter()
            .filter(|l| l.name == name)
            .min_by_key(|l| l.id)
            .cloned())
    }

    async fn find_league_with_teams(
        &mut self,
        name: &str,
    ) -> Result<Option<(DbLeague, Vec<DbTeam>)>, StoreDown> {
        let Some(league) = self.find_league_by_name(name).await? else {
            return Ok(None);
        };
        let teams = self
            .teams
            .iter()
            .filter(|t| t.league_id == league.id)
            .cloned()
            .collect();
        Ok(Some((league, teams)))
    }

    async fn find_team(&mut self, league_id: i64, name: &str) -> Result<Option<DbTeam>, StoreDown> {
        Ok(self
            .teams
            .iter()
            .find(|t| t.league_id == league_id && t.name == name)
            .cloned())
    }

    async fn insert_team(&mut self, league_id: i64, name: &str) -> Result<Option<DbTeam>, StoreDown> {
        if self.failing_team_inserts.contains(name) {
            return Err(StoreDown);
        }
        if self
            .teams
            .iter()
            .any(|t| t.league_id == league_id && t.name == name)
        {
            return Ok(None);
        }
        let team = DbTeam {
            id: self.id(),
            league_id,
            name: name.to_string(),
        };
        self.teams.push(team.clone());
        Ok(Some(team))
    }

    async fn find_event(&mut self, external_api_id: &str) -> Result<Option<DbEvent>, StoreDown> {
        Ok(self.event(external_api_id).cloned())
    }

    async fn insert_event(&mut self, event: &NewEvent<'_>) -> Result<Option<DbEvent>, StoreDown> {
        if event.external_api_id.is_some_and(|id| self.event(id).is_some()) {
            return Ok(None);
        }
        let row = DbEvent {
            id: self.id(),
            league_id: event.league_id,
            home_team_id: event.home_team_id,
            away_team_id: event.away_team_id,
            event_datetime: event.event_datetime,
            status: event.status.to_string(),
            home_score: event.home_score,
            away_score: event.away_score,
            external_api_id: event.external_api_id.map(str::to_string),
        };
        self.events.push(row.clone());
        if self.lose_event_insert_race {
            return Ok(None);
        }
        Ok(Some(row))
    }

    async fn update_event_result(
        &mut self,
        event_id: i64,
        status: EventStatus,
        home_score: Option<i32>,
        away_score: Option<i32>,
    ) -> Result<(), StoreDown> {
        if let Some(event) = self.events.iter_mut().find(|e| e.id == event_id) {
            event.status = status.to_string();
            event.home_score = home_score;
            event.away_score = away_score;
        }
        Ok(())
    }
}

const EPL: &str = "English Premier League";
const EPL_ID: &str = "4328";

fn sport(name: &str) -> ApiSport {
    ApiSport {
        name: Some(name.to_string()),
        ..Default::default()
    }
}

fn league(name: &str, sport: &str) -> ApiLeague {
    ApiLeague {
        name: Some(name.to_string()),
        sport: Some(sport.to_string()),
        ..Default::default()
    }
}

fn team(name: &str) -> ApiTeam {
    ApiTeam {
        name: Some(name.to_string()),
        ..Default::default()
    }
}

fn event(id: &str, home: &str, away: &str, date: &str, time: Option<&str>) -> ApiEvent {
    ApiEvent {
        id: Some(id.to_string()),
        home_team: Some(home.to_string()),
        away_team: Some(away.to_string()),
        date: Some(date.to_string()),
        time: time.map(str::to_string),
        ..Default::default()
    }
}

fn scored(mut event: ApiEvent, home: &str, away: &str) -> ApiEvent {
    event.home_score = Some(home.to_string());
    event.away_score = Some(away.to_string());
    event
}

fn soccer_source() -> FakeSource {
    FakeSource {
        sports: vec![sport("Soccer"), sport("Basketball")],
        leagues: HashMap::from([(
            "Soccer".to_string(),
            vec![league(EPL, "Soccer"), league("NBA", "Basketball")],
        )]),
        teams: HashMap::from([(
            EPL.to_string(),
            vec![team("Arsenal"), team("Chelsea"), team("Liverpool")],
        )]),
        upcoming: HashMap::from([(
            EPL_ID.to_string(),
            vec![
                event("1001", "Arsenal", "Chelsea", "2099-01-01", Some("15:00:00")),
                event("1002", "Liverpool", "Unknown FC", "2099-01-02", None),
                event("1003", "Chelsea", "Liverpool", "2000-01-01", None),
            ],
        )]),
        ..Default::default()
    }
}

fn soccer_plan() -> SyncPlan {
    SyncPlan {
        sports: vec!["Soccer".to_string()],
        team_leagues: vec![EPL.to_string()],
        event_leagues: vec![EventLeague::new(EPL_ID, EPL)],
        include_past_events: false,
        strict: false,
    }
}

#[tokio::test]
async fn first_sync_creates_everything_reachable() {
    let source = soccer_source();
    let mut store = MemoryStore::default();

    let stats = full_sync(&source, &mut store, &soccer_plan()).await.unwrap();

    assert_eq!(stats.sports_added, 2);
    assert_eq!(stats.sports_created, 2);
    assert_eq!(stats.leagues_added, 1);
    assert_eq!(stats.teams_added, 3);
    assert_eq!(stats.events_added, 2);
    assert_eq!(stats.events_updated, 0);
    assert_eq!(stats.events_skipped, 1);
    assert!(stats.failures.is_empty());

    assert_eq!(store.event("1001").unwrap().status, "Scheduled");
    assert_eq!(store.event("1003").unwrap().status, "Final");
    assert!(!store.locked);
}

#[tokio::test]
async fn second_sync_against_unchanged_source_changes_nothing() {
    let source = soccer_source();
    let mut store = MemoryStore::default();
    full_sync(&source, &mut store, &soccer_plan()).await.unwrap();
    let after_first = store.clone();

    let stats = full_sync(&source, &mut store, &soccer_plan()).await.unwrap();

    assert_eq!(store, after_first);
    assert_eq!(stats.sports_added, 2);
    assert_eq!(stats.sports_created, 0);
    assert_eq!(stats.leagues_added, 0);
    assert_eq!(stats.teams_added, 0);
    assert_eq!(stats.events_added, 0);
    assert_eq!(stats.events_updated, 2);
}

#[tokio::test]
async fn resync_with_scores_finalizes_the_existing_event() {
    let mut source = soccer_source();
    let mut store = MemoryStore::default();
    full_sync(&source, &mut store, &soccer_plan()).await.unwrap();
    let original_id = store.event("1001").unwrap().id;

    let upcoming = source.upcoming.get_mut(EPL_ID).unwrap();
    upcoming[0] = scored(upcoming[0].clone(), "2", "1");
    full_sync(&source, &mut store, &soccer_plan()).await.unwrap();

    let matching = store
        .events
        .iter()
        .filter(|e| e.external_api_id.as_deref() == Some("1001"))
        .count();
    assert_eq!(matching, 1);

    let finished = store.event("1001").unwrap();
    assert_eq!(finished.id, original_id);
    assert_eq!(finished.status, "Final");
    assert_eq!(finished.home_score, Some(2));
    assert_eq!(finished.away_score, Some(1));
}

#[tokio::test]
async fn events_with_unknown_teams_are_never_written() {
    let source = soccer_source();
    let mut store = MemoryStore::default();
    full_sync(&source, &mut store, &soccer_plan()).await.unwrap();

    assert!(store.event("1002").is_none());
    assert!(store.teams.iter().all(|t| t.name != "Unknown FC"));
}

#[tokio::test]
async fn unknown_teams_never_overwrite_an_existing_event() {
    let mut source = soccer_source();
    let mut store = MemoryStore::default();
    full_sync(&source, &mut store, &soccer_plan()).await.unwrap();
    let before = store.event("1001").unwrap().clone();

    let upcoming = source.upcoming.get_mut(EPL_ID).unwrap();
    upcoming[0] = scored(
        event("1001", "Arsenal", "Nobody FC", "2099-01-01", Some("15:00:00")),
        "4",
        "4",
    );
    let stats = full_sync(&source, &mut store, &soccer_plan()).await.unwrap();

    assert_eq!(stats.events_skipped, 2);
    assert_eq!(store.event("1001"), Some(&before));
}

#[tokio::test]
async fn unusable_events_are_skipped() {
    let mut source = soccer_source();
    source.upcoming.insert(
        EPL_ID.to_string(),
        vec![
            event("2001", "Arsenal", "Arsenal", "2099-01-01", None),
            event("2002", "Arsenal", "Chelsea", "next tuesday", None),
            ApiEvent {
                id: None,
                ..event("", "Arsenal", "Chelsea", "2099-01-01", None)
            },
            event("2003", "Chelsea", "Arsenal", "2099-01-03", None),
            event("2003", "Chelsea", "Arsenal", "2099-01-03", None),
        ],
    );
    let mut store = MemoryStore::default();

    let stats = full_sync(&source, &mut store, &soccer_plan()).await.unwrap();

    assert_eq!(stats.events_added, 1);
    assert_eq!(stats.events_skipped, 3);
    assert_eq!(store.events.len(), 1);
    assert!(store.event("2003").is_some());
}

#[tokio::test]
async fn past_events_are_included_when_asked() {
    let mut source = soccer_source();
    source.past.insert(
        EPL_ID.to_string(),
        vec![scored(
            event("900", "Arsenal", "Liverpool", "2000-02-02", Some("20:00:00")),
            "3",
            "0",
        )],
    );

    let mut store = MemoryStore::default();
    full_sync(&source, &mut store, &soccer_plan()).await.unwrap();
    assert!(store.event("900").is_none());

    let plan = SyncPlan {
        include_past_events: true,
        ..soccer_plan()
    };
    let stats = full_sync(&source, &mut store, &plan).await.unwrap();
    assert_eq!(stats.events_added, 1);

    let past = store.event("900").unwrap();
    assert_eq!(past.status, "Final");
    assert_eq!(past.home_score, Some(3));
    assert_eq!(past.away_score, Some(0));
}

#[tokio::test]
async fn scored_past_copy_wins_over_upcoming_copy() {
    let mut source = soccer_source();
    source.past.insert(
        EPL_ID.to_string(),
        vec![scored(
            event("1003", "Chelsea", "Liverpool", "2000-01-01", None),
            "1",
            "2",
        )],
    );
    let plan = SyncPlan {
        include_past_events: true,
        ..soccer_plan()
    };
    let mut store = MemoryStore::default();

    let stats = full_sync(&source, &mut store, &plan).await.unwrap();

    assert_eq!(stats.events_added, 2);
    let finished = store.event("1003").unwrap();
    assert_eq!(finished.status, "Final");
    assert_eq!(finished.home_score, Some(1));
    assert_eq!(finished.away_score, Some(2));
}

#[tokio::test]
async fn sport_phase_counts_each_sport_every_time() {
    let source = FakeSource {
        sports: vec![sport("Soccer")],
        ..Default::default()
    };
    let mut store = MemoryStore::default();

    let first = sync_sports(&source, &mut store).await.unwrap();
    let second = sync_sports(&source, &mut store).await.unwrap();

    assert_eq!(first.processed, 1);
    assert_eq!(first.created, 1);
    assert_eq!(second.processed, 1);
    assert_eq!(second.created, 0);
    assert_eq!(store.sports.len(), 1);
}

#[tokio::test]
async fn league_phase_for_missing_sport_writes_nothing() {
    let source = FakeSource {
        leagues: HashMap::from([("Cricket".to_string(), vec![league("IPL", "Cricket")])]),
        ..Default::default()
    };
    let mut store = MemoryStore::default();

    let created = sync_leagues_for_sport(&source, &mut store, "Cricket")
        .await
        .unwrap();

    assert_eq!(created, 0);
    assert!(store.leagues.is_empty());
}

#[tokio::test]
async fn league_phase_ignores_leagues_of_other_sports() {
    let source = soccer_source();
    let mut store = MemoryStore::default();
    sync_sports(&source, &mut store).await.unwrap();

    let created = sync_leagues_for_sport(&source, &mut store, "Soccer")
        .await
        .unwrap();

    assert_eq!(created, 1);
    assert_eq!(store.leagues.len(), 1);
    assert_eq!(store.leagues[0].name, EPL);
}

#[tokio::test]
async fn overlapping_sync_is_refused() {
    let source = soccer_source();
    let mut store = MemoryStore {
        locked_elsewhere: true,
        ..Default::default()
    };

    let result = full_sync(&source, &mut store, &soccer_plan()).await;

    assert!(matches!(result, Err(SyncError::AlreadyRunning)));
    assert!(store.sports.is_empty());
}

#[tokio::test]
async fn catalog_failure_aborts_the_run() {
    let source = FakeSource {
        catalog_down: true,
        ..soccer_source()
    };
    let mut store = MemoryStore::default();

    let result = full_sync(&source, &mut store, &soccer_plan()).await;

    assert!(matches!(result, Err(SyncError::Source { .. })));
    assert!(store.sports.is_empty());
    assert!(store.leagues.is_empty());
    assert!(!store.locked);
}

#[tokio::test]
async fn team_failure_is_recorded_and_the_run_continues() {
    let source = FakeSource {
        failing_team_leagues: HashSet::from([EPL.to_string()]),
        ..soccer_source()
    };
    let mut store = MemoryStore::default();

    let stats = full_sync(&source, &mut store, &soccer_plan()).await.unwrap();

    assert_eq!(stats.failures.len(), 1);
    assert_eq!(stats.failures[0].phase, Phase::Teams);
    assert_eq!(stats.failures[0].target, EPL);
    assert!(stats.failures[0].message.contains("sports source unavailable"));

    // The events phase still ran, but without teams nothing resolves
    assert_eq!(stats.events_added, 0);
    assert_eq!(stats.events_skipped, 3);
    assert_eq!(stats.leagues_added, 1);
}

#[tokio::test]
async fn league_failure_is_recorded_and_the_run_continues() {
    let source = FakeSource {
        failing_league_sports: HashSet::from(["Soccer".to_string()]),
        ..soccer_source()
    };
    let mut store = MemoryStore::default();

    let stats = full_sync(&source, &mut store, &soccer_plan()).await.unwrap();

    assert_eq!(stats.failures.len(), 1);
    assert_eq!(stats.failures[0].phase, Phase::Leagues);
    assert_eq!(stats.failures[0].target, "Soccer");
    assert!(stats.failures[0].message.contains("leagues for Soccer"));
    assert!(store.leagues.is_empty());
    // Later phases find no league and write nothing
    assert_eq!(stats.teams_added, 0);
    assert_eq!(stats.events_added, 0);
}

#[tokio::test]
async fn store_error_stops_the_phase_at_the_failing_row() {
    let source = soccer_source();
    let mut store = MemoryStore {
        failing_team_inserts: HashSet::from(["Chelsea".to_string()]),
        ..Default::default()
    };

    let stats = full_sync(&source, &mut store, &soccer_plan()).await.unwrap();

    assert_eq!(stats.failures.len(), 1);
    assert_eq!(stats.failures[0].phase, Phase::Teams);
    assert!(stats.failures[0].message.contains("inserting team Chelsea"));
    assert!(stats.failures[0].message.contains("store unavailable"));

    // Rows before the failure stay, rows after it are never reached
    let team_names: Vec<_> = store.teams.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(team_names, ["Arsenal"]);
    assert_eq!(stats.teams_added, 0);
    assert!(!store.locked);
}

#[tokio::test]
async fn strict_sync_aborts_on_team_failure() {
    let source = FakeSource {
        failing_team_leagues: HashSet::from([EPL.to_string()]),
        ..soccer_source()
    };
    let mut store = MemoryStore::default();
    let plan = SyncPlan {
        strict: true,
        ..soccer_plan()
    };

    let result = full_sync(&source, &mut store, &plan).await;

    assert!(matches!(result, Err(SyncError::Source { .. })));
    // Earlier phases keep what they wrote
    assert_eq!(store.leagues.len(), 1);
    assert!(store.events.is_empty());
    assert!(!store.locked);
}

#[tokio::test]
async fn lost_insert_race_falls_back_to_update() {
    let source = soccer_source();
    let mut store = MemoryStore {
        lose_event_insert_race: true,
        ..Default::default()
    };

    let stats = full_sync(&source, &mut store, &soccer_plan()).await.unwrap();

    assert_eq!(stats.events_added, 0);
    assert_eq!(stats.events_updated, 2);
    assert_eq!(store.events.len(), 2);
}

#[test]
fn stats_serialize_in_camel_case() {
    let stats = sportsync_ingest::SyncStats {
        sports_added: 3,
        ..Default::default()
    };

    let json = serde_json::to_value(&stats).unwrap();
    assert_eq!(json["sportsAdded"], 3);
    assert_eq!(json["eventsSkipped"], 0);
    assert!(json["failures"].as_array().unwrap().is_empty());
}

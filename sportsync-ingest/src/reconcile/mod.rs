//! Brings the local sports, leagues, teams and events up to date with the
//! sports source.
//!
//! A full sync runs four phases strictly in order, because each phase needs
//! rows created by the one before it:
//!
//! 1. sports: the whole catalog, insert-if-absent by name
//! 2. leagues: per requested sport, insert-if-absent by (sport, name)
//! 3. teams: per configured league, insert-if-absent by (league, name)
//! 4. events: per configured league, insert-or-update by the source's event id
//!
//! Sports, leagues and teams are never updated or deleted. Events only ever
//! have their status and scores updated after they are created. Every write
//! commits on its own; a failed run leaves everything it already wrote.

mod timing;

pub use timing::{derive_status, event_datetime, parse_score};

use chrono::{Local, NaiveDateTime};
use hashbrown::HashMap;
use itertools::Itertools;
use log::{debug, info, warn};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use sportsdb::ApiEvent;
use sportsync_db::models::{DbTeam, EventStatus, NewEvent};
use std::error::Error;
use thiserror::Error;

use crate::source::SportsSource;
use crate::store::SyncStore;

#[derive(Debug, Error, Diagnostic)]
pub enum SyncError {
    #[error("another sync is already running")]
    AlreadyRunning,

    #[error("error fetching {what} from the sports source")]
    Source {
        what: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },

    #[error("error {what} in the local store")]
    Store {
        what: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

fn source_error<E: Error + Send + Sync + 'static>(what: impl Into<String>) -> impl FnOnce(E) -> SyncError {
    let what = what.into();
    move |err| SyncError::Source {
        what,
        source: Box::new(err),
    }
}

fn store_error<E: Error + Send + Sync + 'static>(what: impl Into<String>) -> impl FnOnce(E) -> SyncError {
    let what = what.into();
    move |err| SyncError::Store {
        what,
        source: Box::new(err),
    }
}

// Display of the error and all of its sources, for places that can only
// keep a string
fn error_chain(err: &dyn Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(err) = source {
        message.push_str(": ");
        message.push_str(&err.to_string());
        source = err.source();
    }
    message
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Phase {
    Sports,
    Leagues,
    Teams,
    Events,
}

/// A league whose events are synced. `external_id` is the source's league
/// id, `name` is the local league name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EventLeague {
    pub external_id: String,
    pub name: String,
}

impl EventLeague {
    pub fn new(external_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            external_id: external_id.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyncPlan {
    /// Sports whose leagues are synced (phase 2)
    pub sports: Vec<String>,
    /// Leagues whose teams are synced (phase 3)
    pub team_leagues: Vec<String>,
    /// Leagues whose events are synced (phase 4)
    pub event_leagues: Vec<EventLeague>,
    /// Also sync the source's recent past events, so finished games get
    /// their final scores
    pub include_past_events: bool,
    /// Abort the run on the first failed league, team or event step instead
    /// of recording it and moving on
    pub strict: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SportCounts {
    /// Every catalog entry that went through the upsert, including ones
    /// that already existed
    pub processed: usize,
    pub created: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventCounts {
    pub added: usize,
    pub updated: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncFailure {
    pub phase: Phase,
    pub target: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStats {
    /// Sports processed, whether or not they were new
    pub sports_added: usize,
    /// Sports that were actually inserted
    pub sports_created: usize,
    pub leagues_added: usize,
    pub teams_added: usize,
    pub events_added: usize,
    pub events_updated: usize,
    pub events_skipped: usize,
    pub failures: Vec<SyncFailure>,
}

impl SyncStats {
    fn record_failure(
        &mut self,
        phase: Phase,
        target: &str,
        err: SyncError,
        strict: bool,
    ) -> Result<(), SyncError> {
        if strict {
            return Err(err);
        }

        let message = error_chain(&err);
        warn!("{phase} sync for {target} failed, continuing: {message}");
        self.failures.push(SyncFailure {
            phase,
            target: target.to_string(),
            message,
        });
        Ok(())
    }
}

/// Runs all four phases under the store's sync lock.
///
/// Fails with [SyncError::AlreadyRunning] if another sync holds the lock.
/// A failure fetching the sport catalog aborts the run. A failure in any
/// per-sport or per-league step is recorded in [SyncStats::failures] and the
/// run continues, unless [SyncPlan::strict] is set.
pub async fn full_sync<Src, St>(
    source: &Src,
    store: &mut St,
    plan: &SyncPlan,
) -> Result<SyncStats, SyncError>
where
    Src: SportsSource + Sync,
    St: SyncStore + Send,
{
    let acquired = store
        .acquire_sync_lock()
        .await
        .map_err(store_error("acquiring the sync lock"))?;
    if !acquired {
        return Err(SyncError::AlreadyRunning);
    }

    let result = run_phases(source, store, plan).await;

    if let Err(err) = store.release_sync_lock().await {
        warn!(
            "Failed to release the sync lock. It will be released when the connection closes. \
            Error: {err:?}"
        );
    }

    result
}

async fn run_phases<Src, St>(
    source: &Src,
    store: &mut St,
    plan: &SyncPlan,
) -> Result<SyncStats, SyncError>
where
    Src: SportsSource + Sync,
    St: SyncStore + Send,
{
    let mut stats = SyncStats::default();

    info!("Step 1: syncing sports");
    let sports = sync_sports(source, store).await?;
    stats.sports_added = sports.processed;
    stats.sports_created = sports.created;

    info!("Step 2: syncing leagues for {} sport(s)", plan.sports.len());
    for sport in &plan.sports {
        match sync_leagues_for_sport(source, store, sport).await {
            Ok(count) => stats.leagues_added += count,
            Err(err) => stats.record_failure(Phase::Leagues, sport, err, plan.strict)?,
        }
    }

    info!("Step 3: syncing teams for {} league(s)", plan.team_leagues.len());
    for league in &plan.team_leagues {
        match sync_teams_for_league(source, store, league).await {
            Ok(count) => stats.teams_added += count,
            Err(err) => stats.record_failure(Phase::Teams, league, err, plan.strict)?,
        }
    }

    info!("Step 4: syncing events for {} league(s)", plan.event_leagues.len());
    let now = Local::now().naive_local();
    for league in &plan.event_leagues {
        match sync_events_for_league(source, store, league, plan.include_past_events, now).await {
            Ok(counts) => {
                stats.events_added += counts.added;
                stats.events_updated += counts.updated;
                stats.events_skipped += counts.skipped;
            }
            Err(err) => stats.record_failure(Phase::Events, &league.name, err, plan.strict)?,
        }
    }

    info!(
        "Sync finished: {} sports ({} new), {} leagues, {} teams, {} events added, {} updated, \
        {} skipped, {} failure(s)",
        stats.sports_added,
        stats.sports_created,
        stats.leagues_added,
        stats.teams_added,
        stats.events_added,
        stats.events_updated,
        stats.events_skipped,
        stats.failures.len(),
    );

    Ok(stats)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Phase 1. Store errors abort the phase at the failing row.
pub async fn sync_sports<Src, St>(source: &Src, store: &mut St) -> Result<SportCounts, SyncError>
where
    Src: SportsSource + Sync,
    St: SyncStore + Send,
{
    let api_sports = source
        .all_sports()
        .await
        .map_err(source_error("the sport catalog"))?;

    let mut counts = SportCounts::default();
    for api_sport in &api_sports {
        let Some(name) = non_empty(api_sport.name.as_deref()) else {
            debug!("Ignoring a sport with no name: {api_sport:?}");
            continue;
        };

        let existing = store
            .find_sport(name)
            .await
            .map_err(store_error(format!("looking up sport {name}")))?;

        if existing.is_none() {
            let inserted = store
                .insert_sport(name)
                .await
                .map_err(store_error(format!("inserting sport {name}")))?;
            if inserted.is_some() {
                counts.created += 1;
            }
        }

        counts.processed += 1;
    }

    info!("Synced {} sports ({} new)", counts.processed, counts.created);
    Ok(counts)
}

/// Phase 2. Returns the number of leagues created. A sport that doesn't
/// exist locally is not an error; nothing is synced for it.
pub async fn sync_leagues_for_sport<Src, St>(
    source: &Src,
    store: &mut St,
    sport_name: &str,
) -> Result<usize, SyncError>
where
    Src: SportsSource + Sync,
    St: SyncStore + Send,
{
    let Some(sport) = store
        .find_sport(sport_name)
        .await
        .map_err(store_error(format!("looking up sport {sport_name}")))?
    else {
        info!("Sport {sport_name:?} not found in database, skipping its leagues");
        return Ok(0);
    };

    let api_leagues = source
        .leagues_by_sport(sport_name)
        .await
        .map_err(source_error(format!("leagues for {sport_name}")))?;

    let mut created = 0;
    for api_league in &api_leagues {
        // The source's sport filter can't be trusted
        if api_league.sport.as_deref() != Some(sport_name) {
            debug!(
                "Ignoring league {:?} filed under {:?} while syncing {sport_name:?}",
                api_league.name, api_league.sport,
            );
            continue;
        }

        let Some(name) = non_empty(api_league.name.as_deref()) else {
            continue;
        };

        let existing = store
            .find_league(sport.id, name)
            .await
            .map_err(store_error(format!("looking up league {name}")))?;

        if existing.is_none() {
            let inserted = store
                .insert_league(sport.id, name)
                .await
                .map_err(store_error(format!("inserting league {name}")))?;
            if inserted.is_some() {
                created += 1;
            }
        }
    }

    info!("Synced {created} new leagues for {sport_name}");
    Ok(created)
}

/// Phase 3. Returns the number of teams created. A league that doesn't
/// exist locally is not an error; nothing is synced for it.
pub async fn sync_teams_for_league<Src, St>(
    source: &Src,
    store: &mut St,
    league_name: &str,
) -> Result<usize, SyncError>
where
    Src: SportsSource + Sync,
    St: SyncStore + Send,
{
    let Some(league) = store
        .find_league_by_name(league_name)
        .await
        .map_err(store_error(format!("looking up league {league_name}")))?
    else {
        info!("League {league_name:?} not found in database, skipping its teams");
        return Ok(0);
    };

    let api_teams = source
        .teams_by_league(league_name)
        .await
        .map_err(source_error(format!("teams for {league_name}")))?;

    let mut created = 0;
    for api_team in &api_teams {
        let Some(name) = non_empty(api_team.name.as_deref()) else {
            continue;
        };

        let existing = store
            .find_team(league.id, name)
            .await
            .map_err(store_error(format!("looking up team {name}")))?;

        if existing.is_none() {
            let inserted = store
                .insert_team(league.id, name)
                .await
                .map_err(store_error(format!("inserting team {name}")))?;
            if inserted.is_some() {
                created += 1;
            }
        }
    }

    info!("Synced {created} new teams for {league_name}");
    Ok(created)
}

/// Phase 4. Events whose teams can't both be found among the league's
/// teams are skipped and never written. `now` decides whether an event
/// without scores is already over.
pub async fn sync_events_for_league<Src, St>(
    source: &Src,
    store: &mut St,
    league: &EventLeague,
    include_past_events: bool,
    now: NaiveDateTime,
) -> Result<EventCounts, SyncError>
where
    Src: SportsSource + Sync,
    St: SyncStore + Send,
{
    let Some((db_league, teams)) = store
        .find_league_with_teams(&league.name)
        .await
        .map_err(store_error(format!("loading league {}", league.name)))?
    else {
        info!("League {:?} not found in database, skipping its events", league.name);
        return Ok(EventCounts::default());
    };

    let upcoming = source
        .upcoming_events(&league.external_id)
        .await
        .map_err(source_error(format!("upcoming events for {}", league.name)))?;

    // Past events go first so that when an event is in both lists, the copy
    // carrying the final score is the one kept
    let mut api_events = if include_past_events {
        source
            .past_events(&league.external_id)
            .await
            .map_err(source_error(format!("past events for {}", league.name)))?
    } else {
        Vec::new()
    };
    api_events.extend(upcoming);

    let teams_by_name: HashMap<&str, &DbTeam> =
        teams.iter().map(|t| (t.name.as_str(), t)).collect();

    let mut counts = EventCounts::default();
    counts.skipped = api_events
        .iter()
        .filter(|e| non_empty(e.id.as_deref()).is_none())
        .count();
    if counts.skipped > 0 {
        warn!("Skipping {} event(s) for {} with no id", counts.skipped, league.name);
    }

    for (external_id, api_event) in api_events
        .iter()
        .filter_map(|e| Some((non_empty(e.id.as_deref())?, e)))
        .unique_by(|(external_id, _)| *external_id)
    {
        let Some(plan) = plan_event(external_id, api_event, &teams_by_name, now) else {
            counts.skipped += 1;
            continue;
        };

        let existing = store
            .find_event(external_id)
            .await
            .map_err(store_error(format!("looking up event {external_id}")))?;

        if let Some(existing) = existing {
            store
                .update_event_result(existing.id, plan.status, plan.home_score, plan.away_score)
                .await
                .map_err(store_error(format!("updating event {external_id}")))?;
            counts.updated += 1;
            continue;
        }

        let new_event = NewEvent {
            league_id: db_league.id,
            home_team_id: plan.home_team_id,
            away_team_id: plan.away_team_id,
            event_datetime: plan.event_datetime,
            status: plan.status.as_ref(),
            home_score: plan.home_score,
            away_score: plan.away_score,
            external_api_id: Some(external_id),
        };

        let inserted = store
            .insert_event(&new_event)
            .await
            .map_err(store_error(format!("inserting event {external_id}")))?;

        if inserted.is_some() {
            counts.added += 1;
            continue;
        }

        // Someone else inserted it between the lookup and the insert
        let raced = store
            .find_event(external_id)
            .await
            .map_err(store_error(format!("looking up event {external_id}")))?;
        match raced {
            Some(existing) => {
                store
                    .update_event_result(existing.id, plan.status, plan.home_score, plan.away_score)
                    .await
                    .map_err(store_error(format!("updating event {external_id}")))?;
                counts.updated += 1;
            }
            None => {
                warn!("Event {external_id} conflicted on insert but could not be found afterwards");
                counts.skipped += 1;
            }
        }
    }

    info!(
        "Synced events for {}: {} added, {} updated, {} skipped",
        league.name, counts.added, counts.updated, counts.skipped,
    );
    Ok(counts)
}

struct EventPlan {
    home_team_id: i64,
    away_team_id: i64,
    event_datetime: NaiveDateTime,
    status: EventStatus,
    home_score: Option<i32>,
    away_score: Option<i32>,
}

fn plan_event(
    external_id: &str,
    api_event: &ApiEvent,
    teams_by_name: &HashMap<&str, &DbTeam>,
    now: NaiveDateTime,
) -> Option<EventPlan> {
    let home_name = api_event.home_team.as_deref();
    let away_name = api_event.away_team.as_deref();
    let home = home_name.and_then(|n| teams_by_name.get(n));
    let away = away_name.and_then(|n| teams_by_name.get(n));

    let (Some(home), Some(away)) = (home, away) else {
        info!("Skipping event {external_id}: teams not found ({home_name:?} vs {away_name:?})");
        return None;
    };

    if home.id == away.id {
        warn!("Skipping event {external_id}: {} is listed as both home and away", home.name);
        return None;
    }

    let Some(event_datetime) = api_event
        .date
        .as_deref()
        .and_then(|date| event_datetime(date, api_event.time.as_deref()))
    else {
        warn!("Skipping event {external_id}: unusable date {:?}", api_event.date);
        return None;
    };

    let home_score = api_event.home_score.as_deref();
    let away_score = api_event.away_score.as_deref();
    let status = derive_status(home_score, away_score, event_datetime, now);

    if status == EventStatus::Final && event_datetime > now {
        warn!("Event {external_id} has scores but starts in the future ({event_datetime})");
    }

    Some(EventPlan {
        home_team_id: home.id,
        away_team_id: away.id,
        event_datetime,
        status,
        home_score: parse_score(home_score),
        away_score: parse_score(away_score),
    })
}

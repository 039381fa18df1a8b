use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use sportsync_db::models::EventStatus;

fn default_time_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN)
}

// "HH:MM:SS", sometimes with a trailing offset ("15:00:00+00:00"). Only hours
// and minutes are used.
fn parse_time_of_day(time: &str) -> Option<NaiveTime> {
    let time = time.trim();
    if time.is_empty() {
        return None;
    }

    let mut parts = time.split(':');
    let hours = parts.next()?.trim().parse::<u32>().ok()?;
    let minutes = parts
        .next()
        .and_then(|m| m.trim().parse::<u32>().ok())
        .unwrap_or(0);

    NaiveTime::from_hms_opt(hours, minutes, 0)
}

/// Civil (local, zone-less) start time of an event. `date` must be
/// `YYYY-MM-DD`; a missing or unusable `time` means noon. That includes an
/// unreadable hour such as `"TBD"`, which older clients of this source read
/// as midnight: noon keeps the event on its listed day in any zone.
pub fn event_datetime(date: &str, time: Option<&str>) -> Option<NaiveDateTime> {
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()?;
    let time = time
        .and_then(parse_time_of_day)
        .unwrap_or_else(default_time_of_day);

    Some(date.and_time(time))
}

fn has_score(score: Option<&str>) -> bool {
    score.is_some_and(|s| !s.trim().is_empty())
}

/// Scores on both sides win over the date, so a future event that somehow
/// has scores is still Final.
pub fn derive_status(
    home_score: Option<&str>,
    away_score: Option<&str>,
    event_datetime: NaiveDateTime,
    now: NaiveDateTime,
) -> EventStatus {
    if has_score(home_score) && has_score(away_score) {
        EventStatus::Final
    } else if event_datetime < now {
        EventStatus::Final
    } else {
        EventStatus::Scheduled
    }
}

pub fn parse_score(score: Option<&str>) -> Option<i32> {
    score?.trim().parse().ok()
}

use serde::{Deserialize, Deserializer, Serialize};

// The source sends every identifier and score as a string, but a handful of
// mirrors send bare numbers. Anything else (objects, bools) counts as absent.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiSport {
    #[serde(rename = "idSport", default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(rename = "strSport", default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(rename = "strFormat", default, deserialize_with = "lenient_string")]
    pub format: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiLeague {
    #[serde(rename = "idLeague", default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(rename = "strLeague", default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    /// Name of the sport the source files this league under
    #[serde(rename = "strSport", default, deserialize_with = "lenient_string")]
    pub sport: Option<String>,
    #[serde(rename = "strLeagueAlternate", default, deserialize_with = "lenient_string")]
    pub alternate_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiTeam {
    #[serde(rename = "idTeam", default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(rename = "strTeam", default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(rename = "strTeamShort", default, deserialize_with = "lenient_string")]
    pub short_name: Option<String>,
    #[serde(rename = "strStadium", default, deserialize_with = "lenient_string")]
    pub stadium: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiEvent {
    /// Stable identifier assigned by the source. This is the only key that
    /// correlates an event across syncs.
    #[serde(rename = "idEvent", default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(rename = "strEvent", default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(rename = "idLeague", default, deserialize_with = "lenient_string")]
    pub league_id: Option<String>,
    #[serde(rename = "strLeague", default, deserialize_with = "lenient_string")]
    pub league: Option<String>,
    #[serde(rename = "strHomeTeam", default, deserialize_with = "lenient_string")]
    pub home_team: Option<String>,
    #[serde(rename = "strAwayTeam", default, deserialize_with = "lenient_string")]
    pub away_team: Option<String>,
    #[serde(rename = "intHomeScore", default, deserialize_with = "lenient_string")]
    pub home_score: Option<String>,
    #[serde(rename = "intAwayScore", default, deserialize_with = "lenient_string")]
    pub away_score: Option<String>,
    #[serde(rename = "strStatus", default, deserialize_with = "lenient_string")]
    pub status: Option<String>,
    /// `YYYY-MM-DD`
    #[serde(rename = "dateEvent", default, deserialize_with = "lenient_string")]
    pub date: Option<String>,
    /// `HH:MM:SS`, frequently missing
    #[serde(rename = "strTime", default, deserialize_with = "lenient_string")]
    pub time: Option<String>,
}

mod admin;
mod error;
mod events;
mod sports;

#[rocket::get("/")]
pub async fn index() -> &'static str {
    "Sportsync API. Sports, leagues, teams and events, synced from the sports source."
}

pub fn routes() -> Vec<rocket::Route> {
    rocket::routes![
        index,
        sports::sports,
        sports::sport_leagues,
        sports::league_teams,
        events::events,
        events::event,
        admin::sync,
    ]
}

pub fn catchers() -> Vec<rocket::Catcher> {
    rocket::catchers![
        error::not_found,
        error::unprocessable,
        error::internal_error,
    ]
}

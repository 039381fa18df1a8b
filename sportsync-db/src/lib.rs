mod url;
mod schema;
mod migrations;
pub mod async_db;
pub mod db;
pub mod models;

pub(crate) use schema::*;

pub use url::*;
pub use migrations::*;

pub use diesel::{Connection, ConnectionError, PgConnection, QueryResult};
pub use diesel_async::{AsyncConnection, AsyncPgConnection};
pub type QueryError = diesel::result::Error;

use log::error;
use miette::Diagnostic;
use rocket::http::Status;
use rocket::response::Responder;
use rocket::serde::json::Json;
use rocket::{Request, catch};
use serde::Serialize;
use sportsdb::SportsDbError;
use sportsync_db::ConnectionError;
use sportsync_ingest::SyncError;
use std::error::Error;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum ApiError {
    #[error("{what} {id} does not exist")]
    NotFound { what: &'static str, id: i64 },

    #[error(transparent)]
    DbError(#[from] diesel::result::Error),

    #[error("couldn't connect to database")]
    ConnectionError(#[from] ConnectionError),

    #[error("couldn't set up the sports source client")]
    SourceError(#[from] SportsDbError),

    #[error(transparent)]
    SyncError(#[from] SyncError),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn status(&self) -> Status {
        match self {
            ApiError::NotFound { .. } => Status::NotFound,
            ApiError::SyncError(SyncError::AlreadyRunning) => Status::Conflict,
            _ => Status::InternalServerError,
        }
    }

    fn title(&self) -> &'static str {
        match self {
            ApiError::NotFound { .. } => "Not found",
            ApiError::SyncError(SyncError::AlreadyRunning) => "Sync already running",
            ApiError::SyncError(_) | ApiError::SourceError(_) | ApiError::ConnectionError(_) => {
                "Sync failed"
            }
            ApiError::DbError(_) => "Database error",
        }
    }

    fn message(&self) -> String {
        let mut message = self.to_string();
        let mut source = self.source();
        while let Some(err) = source {
            message.push_str(": ");
            message.push_str(&err.to_string());
            source = err.source();
        }
        message
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for ApiError {
    fn respond_to(self, request: &'r Request<'_>) -> rocket::response::Result<'o> {
        let status = self.status();
        let body = ErrorBody {
            error: self.title(),
            message: self.message(),
        };

        if status == Status::InternalServerError {
            error!("{} {} failed: {}", request.method(), request.uri(), body.message);
        }

        (status, Json(body)).respond_to(request)
    }
}

#[catch(404)]
pub fn not_found() -> Json<ErrorBody> {
    Json(ErrorBody {
        error: "Not found",
        message: "no such endpoint".to_string(),
    })
}

#[catch(422)]
pub fn unprocessable() -> Json<ErrorBody> {
    Json(ErrorBody {
        error: "Invalid request",
        message: "the request body or parameters could not be parsed".to_string(),
    })
}

#[catch(500)]
pub fn internal_error() -> Json<ErrorBody> {
    Json(ErrorBody {
        error: "Internal server error",
        message: "an unexpected error occurred".to_string(),
    })
}

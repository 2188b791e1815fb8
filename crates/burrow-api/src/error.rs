use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use burrow_db::DbError;
use burrow_types::api::StatusMessage;

/// Handler-level failure taxonomy. Every variant maps to one status code and
/// a structured `{success: false, message}` body; store failures stay opaque.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    SelfReference(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    AlreadyExists(String),

    #[error("{0}")]
    AlreadyMember(String),

    #[error("invalid credentials")]
    Auth,

    #[error("internal server error")]
    Store,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::SelfReference(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::AlreadyExists(_) | Self::AlreadyMember(_) => StatusCode::CONFLICT,
            Self::Auth => StatusCode::UNAUTHORIZED,
            Self::Store => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = StatusMessage {
            success: false,
            message: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound(what) => Self::NotFound(format!("{what} not found")),
            DbError::SelfReference => Self::SelfReference("That's yourself!".into()),
            DbError::AlreadyFriends => Self::AlreadyExists("User is already your friend!".into()),
            DbError::AlreadyMember => Self::AlreadyMember("User is already in chat!".into()),
            DbError::LockPoisoned | DbError::Sqlite(_) => {
                error!("store failure: {}", err);
                Self::Store
            }
        }
    }
}

/// Reject a field longer than `max` characters. Lengths are counted in
/// characters, so a string of exactly `max` chars passes.
pub fn ensure_max_len(field: &str, value: &str, max: usize) -> Result<(), ApiError> {
    if value.chars().count() > max {
        return Err(ApiError::Validation(format!(
            "{field} max char limit is {max}"
        )));
    }
    Ok(())
}

pub fn ensure_not_empty(field: &str, value: &str) -> Result<(), ApiError> {
    if value.is_empty() {
        return Err(ApiError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}

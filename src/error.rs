// src/error.rs
// Core error taxonomy (spec §7): InvalidArgument, Unauthenticated, NotFound,
// Conflict, Internal. Every core operation returns `CoreResult<T>`; the HTTP
// layer (api/error.rs) maps a `CoreError` onto a status code and JSON body.

use axum::http::StatusCode;
use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("unauthenticated")]
    Unauthenticated,

    #[error("not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),

    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

impl CoreError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        CoreError::InvalidArgument(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            CoreError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            CoreError::Unauthenticated => StatusCode::UNAUTHORIZED,
            CoreError::NotFound => StatusCode::NOT_FOUND,
            CoreError::Conflict(_) => StatusCode::CONFLICT,
            CoreError::Internal(_) | CoreError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

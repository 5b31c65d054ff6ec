use api_ingress::Envelope;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::api::rest::dto::UserDto;
use crate::domain::error::DomainError;

/// Failures a users handler answers with. The message strings are what the
/// caller sees; driver text never reaches the response.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(&'static str),

    #[error("no user found for this id")]
    NotFound,

    /// Carries the already stored record when it could be read.
    #[error("user already exists")]
    Conflict(Option<UserDto>),

    #[error("{0}")]
    Internal(&'static str),
}

impl ApiError {
    pub fn id_required() -> Self {
        Self::BadRequest("id is required")
    }

    pub fn invalid_body() -> Self {
        Self::BadRequest("invalid request body")
    }

    /// `internal` is the fixed message used when the store itself failed.
    pub fn from_domain(err: &DomainError, internal: &'static str) -> Self {
        match err {
            DomainError::UserNotFound { .. } => Self::NotFound,
            DomainError::EmailAlreadyExists { .. } => Self::Conflict(None),
            DomainError::Database { .. } => Self::Internal(internal),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        match self {
            Self::Conflict(Some(existing)) => {
                Envelope::failure_with(message, existing).with_status(status)
            }
            _ => Envelope::failure(message).with_status(status),
        }
    }
}

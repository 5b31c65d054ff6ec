use thiserror::Error;

use crate::domain::repo::StoreError;

/// Domain-specific errors using thiserror
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("User not found: {key}")]
    UserNotFound { key: String },

    #[error("User with email '{email}' already exists")]
    EmailAlreadyExists { email: String },

    #[error("Database error: {message}")]
    Database { message: String },
}

impl DomainError {
    pub fn user_not_found(key: impl ToString) -> Self {
        Self::UserNotFound {
            key: key.to_string(),
        }
    }

    pub fn email_already_exists(email: impl Into<String>) -> Self {
        Self::EmailAlreadyExists {
            email: email.into(),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    /// Translate a gateway failure; `key` names the looked-up record and
    /// `email` the value a unique violation refers to.
    pub(crate) fn from_store(err: StoreError, key: impl ToString, email: Option<&str>) -> Self {
        match err {
            StoreError::NotFound => Self::user_not_found(key),
            StoreError::UniqueViolation => {
                Self::email_already_exists(email.unwrap_or_default().to_owned())
            }
            StoreError::Other(e) => Self::database(format!("{e:#}")),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::UserNotFound { .. })
    }
}

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::contract::model::{NewUser, User};

/// Failures of the persistence gateway.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("unique constraint violated")]
    UniqueViolation,

    #[error("store failure: {0:#}")]
    Other(anyhow::Error),
}

impl StoreError {
    pub fn other(err: impl Into<anyhow::Error>) -> Self {
        Self::Other(err.into())
    }
}

/// Port for the domain layer: every statement the service can issue.
/// Object-safe and async-friendly via `async_trait`.
#[async_trait]
pub trait UsersRepository: Send + Sync {
    /// All users, oldest first.
    async fn list_all(&self) -> Result<Vec<User>, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<User, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<User, StoreError>;
    /// Insert; the gateway assigns id, timestamps and `is_active = true`.
    async fn create(&self, new_user: NewUser) -> Result<User, StoreError>;
    /// Overwrite name and email, refresh `updated_at`, return the stored row.
    async fn update(&self, id: Uuid, name: &str, email: &str) -> Result<User, StoreError>;
    /// Flip `is_active`, refresh `updated_at`, return the stored row.
    async fn toggle_active(&self, id: Uuid) -> Result<User, StoreError>;
    /// Hard delete. Returns true if a row was removed.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}

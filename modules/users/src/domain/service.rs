use std::sync::Arc;

use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::contract::model::{NewUser, User};
use crate::domain::error::DomainError;
use crate::domain::repo::UsersRepository;

/// Application service over the persistence gateway. Stateless apart from
/// the shared repository handle; one instance serves all requests.
#[derive(Clone)]
pub struct Service {
    repo: Arc<dyn UsersRepository>,
}

impl Service {
    pub fn new(repo: Arc<dyn UsersRepository>) -> Self {
        Self { repo }
    }

    /// Never yields a partial list: on failure the error carries no rows.
    #[instrument(name = "users.service.list_users", skip(self))]
    pub async fn list_users(&self) -> Result<Vec<User>, DomainError> {
        let users = self
            .repo
            .list_all()
            .await
            .map_err(|e| DomainError::from_store(e, "*", None))?;
        debug!(count = users.len(), "Listed users");
        Ok(users)
    }

    #[instrument(name = "users.service.get_user", skip(self), fields(user_id = %id))]
    pub async fn get_user(&self, id: Uuid) -> Result<User, DomainError> {
        debug!("Getting user by id");
        self.repo
            .find_by_id(id)
            .await
            .map_err(|e| DomainError::from_store(e, id, None))
    }

    #[instrument(name = "users.service.get_user_by_email", skip(self, email), fields(email = %email))]
    pub async fn get_user_by_email(&self, email: &str) -> Result<User, DomainError> {
        debug!("Getting user by email");
        self.repo
            .find_by_email(email)
            .await
            .map_err(|e| DomainError::from_store(e, email, None))
    }

    #[instrument(
        name = "users.service.create_user",
        skip(self, new_user),
        fields(email = %new_user.email)
    )]
    pub async fn create_user(&self, new_user: NewUser) -> Result<User, DomainError> {
        let email = new_user.email.clone();
        let user = self
            .repo
            .create(new_user)
            .await
            .map_err(|e| DomainError::from_store(e, &email, Some(&email)))?;
        info!(user_id = %user.id, "Created user");
        Ok(user)
    }

    /// Persist name and email for `id`.
    #[instrument(
        name = "users.service.update_user",
        skip(self, name, email),
        fields(user_id = %id)
    )]
    pub async fn update_user(&self, id: Uuid, name: &str, email: &str) -> Result<User, DomainError> {
        let user = self
            .repo
            .update(id, name, email)
            .await
            .map_err(|e| DomainError::from_store(e, id, Some(email)))?;
        info!("Updated user");
        Ok(user)
    }

    #[instrument(name = "users.service.toggle_active", skip(self), fields(user_id = %id))]
    pub async fn toggle_active(&self, id: Uuid) -> Result<User, DomainError> {
        let user = self
            .repo
            .toggle_active(id)
            .await
            .map_err(|e| DomainError::from_store(e, id, None))?;
        info!(is_active = user.is_active, "Toggled user activation");
        Ok(user)
    }

    /// A delete that removes nothing is reported as `UserNotFound`.
    #[instrument(name = "users.service.delete_user", skip(self), fields(user_id = %id))]
    pub async fn delete_user(&self, id: Uuid) -> Result<(), DomainError> {
        let removed = self
            .repo
            .delete(id)
            .await
            .map_err(|e| DomainError::from_store(e, id, None))?;
        if !removed {
            return Err(DomainError::user_not_found(id));
        }
        info!("Deleted user");
        Ok(())
    }
}

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Stored user record (no serde; the REST layer has its own DTO).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_active: bool,
}

/// Data for creating a new user. Id, timestamps and `is_active` are assigned on insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
}

/// Partial update: `None` or an empty string leaves the field unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl User {
    /// Apply `patch` to a copy of this record. Returns `None` when no field
    /// would actually change.
    pub fn merged(&self, patch: &UserPatch) -> Option<User> {
        fn staged<'a>(proposed: &'a Option<String>, current: &str) -> Option<&'a str> {
            proposed
                .as_deref()
                .filter(|v| !v.is_empty() && *v != current)
        }

        let name = staged(&patch.name, &self.name);
        let email = staged(&patch.email, &self.email);
        if name.is_none() && email.is_none() {
            return None;
        }

        let mut next = self.clone();
        if let Some(name) = name {
            next.name = name.to_owned();
        }
        if let Some(email) = email {
            next.email = email.to_owned();
        }
        Some(next)
    }
}

use std::fmt::Display;
use std::sync::Arc;

use api_ingress::Envelope;
use axum::{extract::Path, http::StatusCode, response::Response, Extension};
use tracing::{debug, error};
use uuid::Uuid;

use crate::api::rest::dto::{CreateUserReq, UpdateUserReq, UserDto};
use crate::api::rest::error::ApiError;
use crate::api::rest::extract::ValidatedJson;
use crate::contract::model::UserPatch;
use crate::domain::error::DomainError;
use crate::domain::service::Service;

type ApiResult = Result<Response, ApiError>;

/// A blank id is a client error; anything else that is not a UUID cannot
/// name a stored user.
fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ApiError::id_required());
    }
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound)
}

fn log_failure(op: &'static str, key: &dyn Display, err: &DomainError) {
    match err {
        DomainError::Database { .. } => error!(op, key = %key, error = %err, "users request failed"),
        _ => debug!(op, key = %key, error = %err, "users request rejected"),
    }
}

/// Stored record behind a unique violation, when it can still be read.
async fn existing_by_email(svc: &Service, email: &str) -> Option<UserDto> {
    svc.get_user_by_email(email).await.ok().map(UserDto::from)
}

#[utoipa::path(
    get,
    path = "/api/user/list",
    tag = "users",
    responses(
        (status = 200, description = "All users, oldest first"),
        (status = 500, description = "Store failure")
    )
)]
pub async fn list_users(Extension(svc): Extension<Arc<Service>>) -> ApiResult {
    match svc.list_users().await {
        Ok(users) => {
            let users: Vec<UserDto> = users.into_iter().map(UserDto::from).collect();
            Ok(Envelope::data(users).with_status(StatusCode::OK))
        }
        Err(e) => {
            log_failure("list_users", &"*", &e);
            Err(ApiError::from_domain(&e, "internal error"))
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/user/list/{id}",
    tag = "users",
    params(("id" = String, Path, description = "User id (UUID)")),
    responses(
        (status = 200, description = "The user"),
        (status = 400, description = "Blank id"),
        (status = 404, description = "No such user"),
        (status = 500, description = "Store failure")
    )
)]
pub async fn get_user(
    Extension(svc): Extension<Arc<Service>>,
    Path(raw_id): Path<String>,
) -> ApiResult {
    let id = parse_id(&raw_id)?;
    match svc.get_user(id).await {
        Ok(user) => Ok(Envelope::data(UserDto::from(user)).with_status(StatusCode::OK)),
        Err(e) => {
            log_failure("get_user", &id, &e);
            Err(ApiError::from_domain(&e, "internal error"))
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/user/create",
    tag = "users",
    request_body = CreateUserReq,
    responses(
        (status = 201, description = "User created"),
        (status = 400, description = "Invalid request body"),
        (status = 409, description = "Email already taken; carries the stored user"),
        (status = 500, description = "Store failure")
    )
)]
pub async fn create_user(
    Extension(svc): Extension<Arc<Service>>,
    ValidatedJson(req): ValidatedJson<CreateUserReq>,
) -> ApiResult {
    let email = req.email.clone();

    match svc.get_user_by_email(&email).await {
        Ok(existing) => return Err(ApiError::Conflict(Some(existing.into()))),
        Err(e) if e.is_not_found() => {}
        Err(e) => {
            log_failure("create_user.check", &email, &e);
            return Err(ApiError::Internal("failed to check user"));
        }
    }

    match svc.create_user(req.into()).await {
        Ok(user) => {
            Ok(Envelope::with_message("user created", UserDto::from(user))
                .with_status(StatusCode::CREATED))
        }
        // Lost a race with a concurrent create of the same email.
        Err(DomainError::EmailAlreadyExists { .. }) => {
            Err(ApiError::Conflict(existing_by_email(&svc, &email).await))
        }
        Err(e) => {
            log_failure("create_user", &email, &e);
            Err(ApiError::from_domain(&e, "failed to create user"))
        }
    }
}

#[utoipa::path(
    put,
    path = "/api/user/edit/{id}",
    tag = "users",
    params(("id" = String, Path, description = "User id (UUID)")),
    request_body = UpdateUserReq,
    responses(
        (status = 200, description = "User updated, or no changes detected"),
        (status = 400, description = "Blank id or invalid request body"),
        (status = 404, description = "No such user"),
        (status = 409, description = "Email already taken"),
        (status = 500, description = "Store failure")
    )
)]
pub async fn update_user(
    Extension(svc): Extension<Arc<Service>>,
    Path(raw_id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateUserReq>,
) -> ApiResult {
    let id = parse_id(&raw_id)?;

    let current = svc.get_user(id).await.map_err(|e| {
        log_failure("update_user.fetch", &id, &e);
        ApiError::from_domain(&e, "internal error")
    })?;

    let patch = UserPatch::from(req);
    let Some(next) = current.merged(&patch) else {
        return Ok(Envelope::with_message("No changes detected.", UserDto::from(current))
            .with_status(StatusCode::OK));
    };

    match svc.update_user(id, &next.name, &next.email).await {
        Ok(user) => {
            Ok(Envelope::with_message("User updated.", UserDto::from(user))
                .with_status(StatusCode::OK))
        }
        Err(DomainError::EmailAlreadyExists { .. }) => {
            Err(ApiError::Conflict(existing_by_email(&svc, &next.email).await))
        }
        Err(e) => {
            log_failure("update_user", &id, &e);
            Err(ApiError::from_domain(&e, "failed to update user"))
        }
    }
}

#[utoipa::path(
    put,
    path = "/api/user/manage/{id}",
    tag = "users",
    params(("id" = String, Path, description = "User id (UUID)")),
    responses(
        (status = 200, description = "Activation flag flipped"),
        (status = 400, description = "Blank id"),
        (status = 404, description = "No such user"),
        (status = 500, description = "Store failure")
    )
)]
pub async fn toggle_active(
    Extension(svc): Extension<Arc<Service>>,
    Path(raw_id): Path<String>,
) -> ApiResult {
    let id = parse_id(&raw_id)?;
    match svc.toggle_active(id).await {
        Ok(user) => {
            Ok(Envelope::with_message("User updated.", UserDto::from(user))
                .with_status(StatusCode::OK))
        }
        Err(e) => {
            log_failure("toggle_active", &id, &e);
            Err(ApiError::from_domain(&e, "failed to update user"))
        }
    }
}

#[utoipa::path(
    delete,
    path = "/api/user/delete/{id}",
    tag = "users",
    params(("id" = String, Path, description = "User id (UUID)")),
    responses(
        (status = 200, description = "User deleted"),
        (status = 400, description = "Blank id"),
        (status = 404, description = "No such user"),
        (status = 500, description = "Store failure")
    )
)]
pub async fn delete_user(
    Extension(svc): Extension<Arc<Service>>,
    Path(raw_id): Path<String>,
) -> ApiResult {
    let id = parse_id(&raw_id)?;
    match svc.delete_user(id).await {
        Ok(()) => Ok(Envelope::message("User deleted successfully").with_status(StatusCode::OK)),
        Err(e) => {
            log_failure("delete_user", &id, &e);
            Err(ApiError::from_domain(&e, "internal error"))
        }
    }
}

/// Trailing-slash routes whose id segment is empty.
pub async fn missing_id() -> ApiError {
    ApiError::id_required()
}

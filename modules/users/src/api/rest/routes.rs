use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Extension, Router,
};

use crate::api::rest::handlers;
use crate::domain::service::Service;

/// Mount the `/api/user` routes on `router`, sharing `service` with every handler.
pub fn register_routes(router: Router, service: Arc<Service>) -> Router {
    let users = Router::new()
        .route("/api/user/list", get(handlers::list_users))
        .route("/api/user/list/", get(handlers::missing_id))
        .route("/api/user/list/{id}", get(handlers::get_user))
        .route("/api/user/create", post(handlers::create_user))
        .route("/api/user/edit/", put(handlers::missing_id))
        .route("/api/user/edit/{id}", put(handlers::update_user))
        .route("/api/user/manage/", put(handlers::missing_id))
        .route("/api/user/manage/{id}", put(handlers::toggle_active))
        .route("/api/user/delete/", delete(handlers::missing_id))
        .route("/api/user/delete/{id}", delete(handlers::delete_user))
        .layer(Extension(service));

    router.merge(users)
}

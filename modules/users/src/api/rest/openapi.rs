use utoipa::OpenApi;

use crate::api::rest::dto::{CreateUserReq, UpdateUserReq, UserDto};
use crate::api::rest::handlers;

#[derive(OpenApi)]
#[openapi(
    info(title = "User Server API", description = "CRUD over stored users"),
    paths(
        handlers::list_users,
        handlers::get_user,
        handlers::create_user,
        handlers::update_user,
        handlers::toggle_active,
        handlers::delete_user,
    ),
    components(schemas(UserDto, CreateUserReq, UpdateUserReq)),
    tags((name = "users", description = "User management"))
)]
pub struct UsersApi;

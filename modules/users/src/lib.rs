//! The user domain: records, persistence gateway, service and REST surface.

pub mod api;
pub mod contract;
pub mod domain;
pub mod infra;

pub use contract::model::{NewUser, User, UserPatch};
pub use domain::service::Service;
pub use infra::storage::{bootstrap_schema, SeaOrmUsersRepository};

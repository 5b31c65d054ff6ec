pub mod entity;
pub mod schema;
pub mod sea_orm_repo;

pub use schema::bootstrap_schema;
pub use sea_orm_repo::SeaOrmUsersRepository;

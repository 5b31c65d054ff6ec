use sea_orm::{ConnectionTrait, DbErr, Schema};

use crate::infra::storage::entity::Entity;

/// Create the `users` table from the entity definition if it is missing.
///
/// Used by tests and `--mock` runs; managed deployments own their schema.
pub async fn bootstrap_schema<C: ConnectionTrait>(conn: &C) -> Result<(), DbErr> {
    let backend = conn.get_database_backend();
    let mut stmt = Schema::new(backend).create_table_from_entity(Entity);
    stmt.if_not_exists();
    conn.execute(backend.build(&stmt)).await?;
    tracing::debug!(?backend, "users table ensured");
    Ok(())
}

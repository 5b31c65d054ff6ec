//! SeaORM-backed implementation of the `UsersRepository` port.
//!
//! Generic over `C: ConnectionTrait`, so it runs on the pooled
//! `DatabaseConnection` or on a transaction handle. Every call borrows a
//! pooled connection for one statement; writes that must return the stored
//! row read it back by primary key afterwards.

use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait,
    IntoSimpleExpr, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::contract::model::{NewUser, User};
use crate::domain::repo::{StoreError, UsersRepository};
use crate::infra::storage::entity::{ActiveModel as UserAM, Column, Entity as UserEntity};

pub struct SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

/// Classify a driver error; `op` names the failing statement in the chain.
fn store_err(op: &'static str) -> impl FnOnce(DbErr) -> StoreError {
    move |e| match e {
        DbErr::RecordNotFound(_) => StoreError::NotFound,
        e if db::is_seaorm_unique_violation(&e) => StoreError::UniqueViolation,
        e => StoreError::Other(anyhow::Error::new(e).context(op)),
    }
}

#[async_trait::async_trait]
impl<C> UsersRepository for SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn list_all(&self) -> Result<Vec<User>, StoreError> {
        let rows = UserEntity::find()
            .order_by_asc(Column::CreatedAt)
            .order_by_asc(Column::Id)
            .all(&self.conn)
            .await
            .map_err(store_err("list_all failed"))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<User, StoreError> {
        UserEntity::find_by_id(id)
            .one(&self.conn)
            .await
            .map_err(store_err("find_by_id failed"))?
            .map(Into::into)
            .ok_or(StoreError::NotFound)
    }

    async fn find_by_email(&self, email: &str) -> Result<User, StoreError> {
        UserEntity::find()
            .filter(Column::Email.eq(email))
            .one(&self.conn)
            .await
            .map_err(store_err("find_by_email failed"))?
            .map(Into::into)
            .ok_or(StoreError::NotFound)
    }

    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let now = Utc::now();
        let m = UserAM {
            id: Set(Uuid::new_v4()),
            name: Set(new_user.name),
            email: Set(new_user.email),
            created_at: Set(now),
            updated_at: Set(now),
            is_active: Set(true),
        };
        // RETURNING where supported, otherwise a read-back by the id set above;
        // a row deleted in between surfaces as RecordNotFound.
        let model = m.insert(&self.conn).await.map_err(store_err("insert failed"))?;
        Ok(model.into())
    }

    async fn update(&self, id: Uuid, name: &str, email: &str) -> Result<User, StoreError> {
        let res = UserEntity::update_many()
            .col_expr(Column::Name, Expr::value(name))
            .col_expr(Column::Email, Expr::value(email))
            .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(Column::Id.eq(id))
            .exec(&self.conn)
            .await
            .map_err(store_err("update failed"))?;
        if res.rows_affected == 0 {
            return Err(StoreError::NotFound);
        }
        self.find_by_id(id).await
    }

    async fn toggle_active(&self, id: Uuid) -> Result<User, StoreError> {
        let res = UserEntity::update_many()
            .col_expr(Column::IsActive, Column::IsActive.into_simple_expr().not())
            .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(Column::Id.eq(id))
            .exec(&self.conn)
            .await
            .map_err(store_err("toggle_active failed"))?;
        if res.rows_affected == 0 {
            return Err(StoreError::NotFound);
        }
        self.find_by_id(id).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let res = UserEntity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .map_err(store_err("delete failed"))?;
        Ok(res.rows_affected > 0)
    }
}

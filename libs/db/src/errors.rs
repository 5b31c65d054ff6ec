//! Unique-constraint classification for driver errors.

use sea_orm::{DbErr, RuntimeErr, SqlErr};

/// True if the SQLSTATE / extended result code marks a unique violation
/// (Postgres 23505, SQLite 2067 UNIQUE and 1555 PRIMARY KEY, MySQL 1062).
pub fn is_unique_violation_code(code: &str) -> bool {
    matches!(code, "23505" | "2067" | "1555" | "1062")
}

pub fn is_sqlx_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => {
            db.is_unique_violation()
                || db
                    .code()
                    .map(|c| is_unique_violation_code(c.as_ref()))
                    .unwrap_or(false)
        }
        _ => false,
    }
}

pub fn is_seaorm_unique_violation(err: &DbErr) -> bool {
    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        return true;
    }
    match err {
        DbErr::Exec(RuntimeErr::SqlxError(e)) | DbErr::Query(RuntimeErr::SqlxError(e)) => {
            is_sqlx_unique_violation(e)
        }
        _ => false,
    }
}

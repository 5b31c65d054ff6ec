#![cfg_attr(
    not(any(feature = "pg", feature = "sqlite")),
    allow(unused_imports, unused_variables, dead_code, unreachable_code)
)]

//! Connection pool handle for the user server.
//!
//! `DbHandle` owns one sqlx pool (Postgres or SQLite, picked from the DSN
//! scheme) and a SeaORM `DatabaseConnection` sharing that same pool. It is
//! built once at start-up and closed explicitly at shutdown.
//!
//! # Features
//! - `pg`, `sqlite`: enable the sqlx/SeaORM backends (both on by default)
//!
//! # Example
//! ```rust,no_run
//! #[tokio::main]
//! async fn main() -> db::Result<()> {
//!     use db::{ConnectOpts, DbHandle};
//!     use sea_orm::{ConnectionTrait, DatabaseBackend, Statement};
//!
//!     let db = DbHandle::connect("sqlite::memory:", ConnectOpts::default()).await?;
//!     db.sea()
//!         .execute(Statement::from_string(DatabaseBackend::Sqlite, "SELECT 1"))
//!         .await?;
//!     db.close().await;
//!     Ok(())
//! }
//! ```

pub mod errors;

pub use errors::{is_seaorm_unique_violation, is_sqlx_unique_violation, is_unique_violation_code};

use std::time::Duration;

use sea_orm::DatabaseConnection;
use sqlx::pool::PoolOptions;
#[cfg(feature = "pg")]
use sqlx::{postgres::PgConnectOptions, PgPool, Postgres};
#[cfg(feature = "sqlite")]
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqliteSynchronous},
    Sqlite, SqlitePool,
};

#[cfg(feature = "pg")]
use sea_orm::SqlxPostgresConnector;
#[cfg(feature = "sqlite")]
use sea_orm::SqlxSqliteConnector;

use thiserror::Error;

/// Library-local result type.
pub type Result<T> = std::result::Result<T, DbError>;

/// Typed error for the DB handle.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Unknown DSN: {0}")]
    UnknownDsn(String),

    #[error("Feature not enabled: {0}")]
    FeatureDisabled(&'static str),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Sea(#[from] sea_orm::DbErr),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Supported engines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DbEngine {
    Postgres,
    Sqlite,
}

/// Pool knobs. Each driver applies all of them; in-memory SQLite overrides
/// the sizing and lifetime ones.
#[derive(Clone, Debug)]
pub struct ConnectOpts {
    /// Maximum number of connections in the pool.
    pub max_conns: Option<u32>,
    /// Minimum number of connections kept open.
    pub min_conns: Option<u32>,
    /// Timeout to acquire a connection from the pool.
    pub acquire_timeout: Option<Duration>,
    /// Idle timeout before a connection is closed.
    pub idle_timeout: Option<Duration>,
    /// Maximum lifetime for a connection.
    pub max_lifetime: Option<Duration>,
    /// Ping the connection before handing it out.
    pub test_before_acquire: bool,

    /// SQLite-specific: `PRAGMA busy_timeout`.
    pub sqlite_busy_timeout: Option<Duration>,
    /// For SQLite file DSNs, create parent directories if missing.
    pub create_sqlite_dirs: bool,
}

impl Default for ConnectOpts {
    fn default() -> Self {
        Self {
            max_conns: Some(10),
            min_conns: None,
            acquire_timeout: Some(Duration::from_secs(30)),
            idle_timeout: None,
            max_lifetime: None,
            test_before_acquire: false,

            sqlite_busy_timeout: Some(Duration::from_millis(5_000)),
            create_sqlite_dirs: true,
        }
    }
}

/// One concrete sqlx pool.
#[derive(Clone)]
pub enum DbPool {
    #[cfg(feature = "pg")]
    Postgres(PgPool),
    #[cfg(feature = "sqlite")]
    Sqlite(SqlitePool),
}

/// Pool plus SeaORM connection over it.
pub struct DbHandle {
    engine: DbEngine,
    pool: DbPool,
    dsn: String,
    sea: DatabaseConnection,
}

impl std::fmt::Debug for DbHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbHandle")
            .field("engine", &self.engine)
            .field("dsn", &redact_credentials_in_dsn(&self.dsn))
            .finish()
    }
}

impl DbHandle {
    /// Detect engine by DSN scheme. The tail (credentials, path) is not touched.
    pub fn detect(dsn: &str) -> Result<DbEngine> {
        let s = dsn.trim_start();
        if s.starts_with("postgres://") || s.starts_with("postgresql://") {
            Ok(DbEngine::Postgres)
        } else if s.starts_with("sqlite:") {
            Ok(DbEngine::Sqlite)
        } else {
            Err(DbError::UnknownDsn(redact_credentials_in_dsn(dsn)))
        }
    }

    /// Connect and build the handle.
    pub async fn connect(dsn: &str, opts: ConnectOpts) -> Result<Self> {
        let dsn = dsn.trim();
        let engine = Self::detect(dsn)?;
        let handle = match engine {
            #[cfg(feature = "pg")]
            DbEngine::Postgres => {
                let conn: PgConnectOptions = dsn.parse()?;
                let pool = pool_options::<Postgres>(&opts).connect_with(conn).await?;
                let sea = SqlxPostgresConnector::from_sqlx_postgres_pool(pool.clone());
                Self {
                    engine,
                    pool: DbPool::Postgres(pool),
                    dsn: dsn.to_string(),
                    sea,
                }
            }
            #[cfg(feature = "sqlite")]
            DbEngine::Sqlite => {
                let memory = is_memory_dsn(dsn);
                if !memory && opts.create_sqlite_dirs {
                    prepare_sqlite_path(dsn)?;
                }

                let mut conn: SqliteConnectOptions = dsn.parse()?;
                conn = conn.create_if_missing(true);
                if !memory {
                    conn = conn
                        .journal_mode(SqliteJournalMode::Wal)
                        .synchronous(SqliteSynchronous::Normal);
                }
                if let Some(busy) = opts.sqlite_busy_timeout {
                    conn = conn.busy_timeout(busy);
                }

                let mut pool_opts = pool_options::<Sqlite>(&opts);
                if memory {
                    // Every connection to `:memory:` is its own database.
                    pool_opts = pool_opts
                        .max_connections(1)
                        .min_connections(1)
                        .idle_timeout(None)
                        .max_lifetime(None);
                }
                let pool = pool_opts.connect_with(conn).await?;
                let sea = SqlxSqliteConnector::from_sqlx_sqlite_pool(pool.clone());
                Self {
                    engine,
                    pool: DbPool::Sqlite(pool),
                    dsn: dsn.to_string(),
                    sea,
                }
            }
            #[cfg(not(feature = "pg"))]
            DbEngine::Postgres => {
                return Err(DbError::FeatureDisabled("PostgreSQL feature not enabled"))
            }
            #[cfg(not(feature = "sqlite"))]
            DbEngine::Sqlite => return Err(DbError::FeatureDisabled("SQLite feature not enabled")),
        };

        tracing::info!(
            engine = ?handle.engine,
            dsn = %redact_credentials_in_dsn(&handle.dsn),
            "database pool connected"
        );
        Ok(handle)
    }

    /// Close the pool, waiting for checked-out connections to come back.
    pub async fn close(self) {
        match self.pool {
            #[cfg(feature = "pg")]
            DbPool::Postgres(p) => p.close().await,
            #[cfg(feature = "sqlite")]
            DbPool::Sqlite(p) => p.close().await,
        }
        tracing::info!(engine = ?self.engine, "database pool closed");
    }

    pub fn engine(&self) -> DbEngine {
        self.engine
    }

    /// DSN with any password masked.
    pub fn dsn(&self) -> String {
        redact_credentials_in_dsn(&self.dsn)
    }

    #[cfg(feature = "pg")]
    pub fn sqlx_postgres(&self) -> Option<&PgPool> {
        match self.pool {
            DbPool::Postgres(ref p) => Some(p),
            #[cfg(feature = "sqlite")]
            _ => None,
        }
    }

    #[cfg(feature = "sqlite")]
    pub fn sqlx_sqlite(&self) -> Option<&SqlitePool> {
        match self.pool {
            DbPool::Sqlite(ref p) => Some(p),
            #[cfg(feature = "pg")]
            _ => None,
        }
    }

    /// SeaORM connection (clone of a pooled handle).
    pub fn sea(&self) -> DatabaseConnection {
        self.sea.clone()
    }

    pub fn seaorm(&self) -> &DatabaseConnection {
        &self.sea
    }
}

// ===================== helpers =====================

fn pool_options<DB: sqlx::Database>(opts: &ConnectOpts) -> PoolOptions<DB> {
    let mut o = PoolOptions::<DB>::new()
        .idle_timeout(opts.idle_timeout)
        .max_lifetime(opts.max_lifetime)
        .test_before_acquire(opts.test_before_acquire);
    if let Some(n) = opts.max_conns {
        o = o.max_connections(n);
    }
    if let Some(n) = opts.min_conns {
        o = o.min_connections(n);
    }
    if let Some(t) = opts.acquire_timeout {
        o = o.acquire_timeout(t);
    }
    o
}

fn is_memory_dsn(dsn: &str) -> bool {
    dsn.contains(":memory:") || dsn.contains("mode=memory")
}

/// Create the parent directory of a plain `sqlite:` file path.
fn prepare_sqlite_path(dsn: &str) -> Result<()> {
    let raw = dsn
        .strip_prefix("sqlite://")
        .or_else(|| dsn.strip_prefix("sqlite:"))
        .unwrap_or(dsn);

    // URI forms ("file:...") and DSNs with options have no plain path to create.
    if raw.starts_with("file:") || raw.contains('?') {
        return Ok(());
    }
    if let Some(parent) = std::path::Path::new(raw).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Mask the password component of a URL-shaped DSN for logging.
pub fn redact_credentials_in_dsn(dsn: &str) -> String {
    match url::Url::parse(dsn) {
        Ok(mut u) if u.password().is_some() => {
            let _ = u.set_password(Some("***"));
            u.to_string()
        }
        _ => dsn.to_string(),
    }
}

// ===================== tests =====================

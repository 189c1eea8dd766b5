//! Connection pool shared by every repository.

use std::borrow::Cow;
use std::sync::Once;

use sqlx::any::AnyPoolOptions;
use sqlx::{AnyPool, Executor};

use super::{placeholders, schema, seed, ConnectTarget, Dialect};
use crate::persistence::PersistenceError;

static INSTALL_DRIVERS: Once = Once::new();

/// Holds a connection pool plus the dialect it speaks.
#[derive(Clone)]
pub struct Database {
    pool: AnyPool,
    dialect: Dialect,
}

impl Database {
    /// Connect, bring the schema up to date, seed reference data and return
    /// a ready-to-use `Database`.
    ///
    /// Connection, schema creation and migration failures are returned.
    /// Seeding failures are logged and ignored.
    pub async fn open(target: &ConnectTarget) -> Result<Self, PersistenceError> {
        let db = Self::connect(target).await?;
        schema::initialize(&db).await?;
        seed::seed(&db).await;
        Ok(db)
    }

    /// Connect and ping without touching the schema.
    pub async fn connect(target: &ConnectTarget) -> Result<Self, PersistenceError> {
        if let ConnectTarget::Sqlite(path) = target {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
        }

        INSTALL_DRIVERS.call_once(sqlx::any::install_default_drivers);

        let dialect = target.dialect();
        let mut options = AnyPoolOptions::new()
            .max_connections(dialect.max_connections())
            .min_connections(dialect.min_connections())
            .after_connect(move |conn, _meta| {
                Box::pin(async move {
                    for stmt in session_setup(dialect) {
                        (&mut *conn).execute(*stmt).await?;
                    }
                    Ok(())
                })
            });

        // An in-memory database lives exactly as long as its connection.
        if *target == ConnectTarget::SqliteMemory {
            options = options.idle_timeout(None).max_lifetime(None);
        }

        let pool = options.connect(&target.url()).await?;
        let db = Self { pool, dialect };
        db.ping().await?;

        tracing::info!(target = %target.describe(), dialect = dialect.name(), "Database connected");
        Ok(db)
    }

    /// Create an in-memory database for testing. The schema is applied but
    /// nothing is seeded.
    #[cfg(test)]
    pub async fn new_in_memory() -> Result<Self, PersistenceError> {
        let db = Self::connect(&ConnectTarget::SqliteMemory).await?;
        schema::initialize(&db).await?;
        Ok(db)
    }

    pub async fn ping(&self) -> Result<(), PersistenceError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Rewrite a `?`-placeholder statement for this database's engine.
    pub fn sql<'a>(&self, statement: &'a str) -> Cow<'a, str> {
        placeholders::translate(statement, self.dialect)
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }
}

/// Statements run on every freshly opened connection.
fn session_setup(dialect: Dialect) -> &'static [&'static str] {
    match dialect {
        Dialect::Sqlite => &[
            "PRAGMA journal_mode = WAL",
            "PRAGMA busy_timeout = 5000",
            "PRAGMA foreign_keys = ON",
        ],
        Dialect::Postgres => &["SET TIME ZONE 'UTC'"],
    }
}

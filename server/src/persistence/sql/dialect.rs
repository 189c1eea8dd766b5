//! Engine selection and the handful of SQL fragments that differ per engine.

use std::path::{Path, PathBuf};

/// Which relational engine a [`Database`](super::Database) is talking to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Embedded, single-file engine.
    Sqlite,
    /// Client/server engine reached through a connection string.
    Postgres,
}

impl Dialect {
    pub fn name(self) -> &'static str {
        match self {
            Dialect::Sqlite => "sqlite",
            Dialect::Postgres => "postgres",
        }
    }

    pub fn is_client_server(self) -> bool {
        matches!(self, Dialect::Postgres)
    }

    /// Column type for `created_at` / `updated_at`, engine-filled on insert.
    ///
    /// SQLite's `CURRENT_TIMESTAMP` only has whole seconds, so it gets a
    /// millisecond `strftime` default instead.
    pub fn timestamp_column(self) -> &'static str {
        match self {
            Dialect::Sqlite => "DATETIME DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))",
            Dialect::Postgres => "TIMESTAMP DEFAULT CURRENT_TIMESTAMP",
        }
    }

    /// Expression for "now" in `SET updated_at = ...`, at the same
    /// resolution as [`timestamp_column`](Self::timestamp_column).
    pub fn now(self) -> &'static str {
        match self {
            Dialect::Sqlite => "strftime('%Y-%m-%d %H:%M:%f', 'now')",
            Dialect::Postgres => "CURRENT_TIMESTAMP",
        }
    }

    /// Column that grows with every insert, used to break `created_at` ties.
    ///
    /// SQLite tables have an implicit `rowid`. Postgres gets a `seq` column
    /// from [`ADDITIVE_COLUMNS`](super::schema::ADDITIVE_COLUMNS).
    pub fn insertion_order(self) -> &'static str {
        match self {
            Dialect::Sqlite => "rowid",
            Dialect::Postgres => "seq",
        }
    }

    /// Query returning the number of columns named `?2` on table `?1`.
    pub fn column_count_query(self) -> &'static str {
        match self {
            Dialect::Sqlite => "SELECT COUNT(*) FROM pragma_table_info(?) WHERE name = ?",
            Dialect::Postgres => {
                "SELECT COUNT(*) FROM information_schema.columns \
                 WHERE table_schema = current_schema() AND table_name = ? AND column_name = ?"
            }
        }
    }

    /// Upper bound on pooled connections.
    ///
    /// The embedded engine gets exactly one: writes are serialised through
    /// it instead of contending on the file lock.
    pub fn max_connections(self) -> u32 {
        match self {
            Dialect::Sqlite => 1,
            Dialect::Postgres => 10,
        }
    }

    /// Connections kept open while idle.
    pub fn min_connections(self) -> u32 {
        match self {
            Dialect::Sqlite => 0,
            Dialect::Postgres => 5,
        }
    }
}

/// Where to connect. Built once from configuration; nothing else looks at
/// the raw connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectTarget {
    Sqlite(PathBuf),
    /// In-memory embedded database, private to its single connection.
    SqliteMemory,
    Postgres(String),
}

impl ConnectTarget {
    /// A non-empty `database_url` wins; otherwise the embedded file at `path`.
    pub fn from_config(database_url: Option<&str>, path: &Path) -> Self {
        match database_url.map(str::trim) {
            Some(url) if !url.is_empty() => ConnectTarget::Postgres(url.to_string()),
            _ => ConnectTarget::Sqlite(path.to_path_buf()),
        }
    }

    pub fn dialect(&self) -> Dialect {
        match self {
            ConnectTarget::Sqlite(_) | ConnectTarget::SqliteMemory => Dialect::Sqlite,
            ConnectTarget::Postgres(_) => Dialect::Postgres,
        }
    }

    /// URL understood by the sqlx `Any` driver.
    pub(crate) fn url(&self) -> String {
        match self {
            ConnectTarget::Sqlite(path) => format!("sqlite://{}?mode=rwc", path.display()),
            ConnectTarget::SqliteMemory => "sqlite::memory:".to_string(),
            ConnectTarget::Postgres(url) => url.clone(),
        }
    }

    /// Loggable description that never includes credentials.
    pub fn describe(&self) -> String {
        match self {
            ConnectTarget::Sqlite(path) => format!("sqlite file {}", path.display()),
            ConnectTarget::SqliteMemory => "sqlite in-memory".to_string(),
            ConnectTarget::Postgres(_) => "postgres (DATABASE_URL)".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_url_selects_postgres() {
        let target = ConnectTarget::from_config(
            Some("postgres://u:p@localhost/algovault"),
            Path::new("./algovault.db"),
        );
        assert_eq!(target.dialect(), Dialect::Postgres);
        assert!(target.dialect().is_client_server());
        assert!(!target.describe().contains("u:p"));
    }

    #[test]
    fn missing_or_blank_url_selects_sqlite() {
        let path = Path::new("./algovault.db");
        assert_eq!(
            ConnectTarget::from_config(None, path),
            ConnectTarget::Sqlite(path.to_path_buf())
        );
        assert_eq!(
            ConnectTarget::from_config(Some("  "), path).dialect(),
            Dialect::Sqlite
        );
    }

    #[test]
    fn pool_sizing_per_engine() {
        assert_eq!(Dialect::Sqlite.max_connections(), 1);
        assert_eq!(Dialect::Postgres.max_connections(), 10);
        assert_eq!(Dialect::Postgres.min_connections(), 5);
    }

    #[test]
    fn sqlite_url_creates_missing_file() {
        let url = ConnectTarget::Sqlite(PathBuf::from("/tmp/av.db")).url();
        assert_eq!(url, "sqlite:///tmp/av.db?mode=rwc");
    }
}

//! Schema creation and additive migrations.
//!
//! There is no version table. Every start runs [`create`] (all
//! `IF NOT EXISTS`) followed by [`migrate`], which inspects the live schema
//! and adds whichever known columns are missing. Both steps are safe to
//! repeat, and the migrations may run in any order.

use super::{Database, Dialect};
use crate::persistence::PersistenceError;

/// A column added after the first release.
#[derive(Debug, Clone, Copy)]
pub struct AdditiveColumn {
    pub table: &'static str,
    pub column: &'static str,
    /// Type and default, as written after `ADD COLUMN <name>`.
    pub definition: &'static str,
    /// Corrective statement run once, right after the column is added.
    pub backfill: Option<&'static str>,
    /// Restricts the column to one engine. `None` applies everywhere.
    pub only_on: Option<Dialect>,
}

impl AdditiveColumn {
    fn applies_to(&self, dialect: Dialect) -> bool {
        self.only_on.map_or(true, |d| d == dialect)
    }
}

/// Append-only. Never reorder or remove entries.
pub const ADDITIVE_COLUMNS: &[AdditiveColumn] = &[
    AdditiveColumn {
        table: "users",
        column: "role",
        definition: "TEXT DEFAULT 'admin'",
        backfill: Some("UPDATE users SET role = 'admin' WHERE role IS NULL"),
        only_on: None,
    },
    AdditiveColumn {
        table: "patterns",
        column: "theory",
        definition: "TEXT DEFAULT ''",
        backfill: Some("UPDATE patterns SET theory = '' WHERE theory IS NULL"),
        only_on: None,
    },
    AdditiveColumn {
        table: "users",
        column: "email_canonical",
        definition: "TEXT DEFAULT ''",
        backfill: Some(
            "UPDATE users SET email_canonical = LOWER(TRIM(email)) \
             WHERE email_canonical IS NULL OR email_canonical = ''",
        ),
        only_on: None,
    },
    // Insertion-order tiebreak for rows sharing a `created_at`. SQLite uses
    // its implicit rowid instead. BIGSERIAL numbers existing rows on add.
    AdditiveColumn {
        table: "categories",
        column: "seq",
        definition: "BIGSERIAL",
        backfill: None,
        only_on: Some(Dialect::Postgres),
    },
    AdditiveColumn {
        table: "patterns",
        column: "seq",
        definition: "BIGSERIAL",
        backfill: None,
        only_on: Some(Dialect::Postgres),
    },
    AdditiveColumn {
        table: "problems",
        column: "seq",
        definition: "BIGSERIAL",
        backfill: None,
        only_on: Some(Dialect::Postgres),
    },
    AdditiveColumn {
        table: "solutions",
        column: "seq",
        definition: "BIGSERIAL",
        backfill: None,
        only_on: Some(Dialect::Postgres),
    },
];

/// Non-unique lookup index, kept only while duplicate canonical emails exist.
const EMAIL_CANONICAL_INDEX: &str = "idx_users_email_canonical";
const EMAIL_CANONICAL_UNIQUE_INDEX: &str = "idx_users_email_canonical_unique";

/// Create then migrate. Any failure here leaves the service unusable.
pub async fn initialize(db: &Database) -> Result<(), PersistenceError> {
    create(db).await?;
    let added = migrate(db).await?;
    tracing::info!(
        dialect = db.dialect().name(),
        added_columns = added.len(),
        "Schema ready"
    );
    Ok(())
}

/// Create every table and index that does not exist yet.
pub async fn create(db: &Database) -> Result<(), PersistenceError> {
    for (step, stmt) in create_statements(db) {
        run(db, step, &stmt).await?;
    }
    Ok(())
}

/// Add missing columns from [`ADDITIVE_COLUMNS`]. Returns the
/// `table.column` names that were added on this run.
pub async fn migrate(db: &Database) -> Result<Vec<String>, PersistenceError> {
    let mut added = Vec::new();

    for m in ADDITIVE_COLUMNS.iter().filter(|m| m.applies_to(db.dialect())) {
        let step = format!("{}.{}", m.table, m.column);
        if column_exists(db, m.table, m.column).await? {
            continue;
        }

        let alter = format!(
            "ALTER TABLE {} ADD COLUMN {} {}",
            m.table, m.column, m.definition
        );
        run(db, &step, &alter).await?;
        if let Some(backfill) = m.backfill {
            run(db, &step, backfill).await?;
        }

        tracing::info!(column = %step, "Added missing column");
        added.push(step);
    }

    index_canonical_email(db).await?;

    Ok(added)
}

/// Make `users.email_canonical` unique when the stored rows allow it.
///
/// Databases that predate canonical emails can hold two accounts whose
/// emails differ only in case. Those keep a plain index and a warning until
/// the duplicates are resolved by hand; the unique index is created on the
/// first start after that. Returns whether the unique index is in place.
pub async fn index_canonical_email(db: &Database) -> Result<bool, PersistenceError> {
    let step = "users.email_canonical index";
    let duplicates: Vec<(String, i64)> = sqlx::query_as(
        "SELECT email_canonical, COUNT(*) FROM users \
         GROUP BY email_canonical HAVING COUNT(*) > 1 ORDER BY email_canonical",
    )
    .fetch_all(db.pool())
    .await
    .map_err(|source| PersistenceError::Schema {
        step: step.to_string(),
        source,
    })?;

    if duplicates.is_empty() {
        let unique = format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS {EMAIL_CANONICAL_UNIQUE_INDEX} \
             ON users(email_canonical)"
        );
        run(db, step, &unique).await?;
        run(db, step, &format!("DROP INDEX IF EXISTS {EMAIL_CANONICAL_INDEX}")).await?;
        return Ok(true);
    }

    for (email, accounts) in &duplicates {
        tracing::warn!(
            email = %email,
            accounts,
            "Accounts share a canonical email; login picks the oldest"
        );
    }
    let plain = format!(
        "CREATE INDEX IF NOT EXISTS {EMAIL_CANONICAL_INDEX} ON users(email_canonical)"
    );
    run(db, step, &plain).await?;
    Ok(false)
}

/// Ask the engine's catalogue whether `table.column` exists.
pub async fn column_exists(
    db: &Database,
    table: &str,
    column: &str,
) -> Result<bool, PersistenceError> {
    let sql = db.sql(db.dialect().column_count_query());
    let count: i64 = sqlx::query_scalar(&sql)
        .bind(table)
        .bind(column)
        .fetch_one(db.pool())
        .await
        .map_err(|source| PersistenceError::Schema {
            step: format!("inspect {table}.{column}"),
            source,
        })?;
    Ok(count > 0)
}

async fn run(db: &Database, step: &str, stmt: &str) -> Result<(), PersistenceError> {
    sqlx::query(stmt)
        .execute(db.pool())
        .await
        .map_err(|source| PersistenceError::Schema {
            step: step.to_string(),
            source,
        })?;
    Ok(())
}

fn create_statements(db: &Database) -> Vec<(&'static str, String)> {
    let ts = db.dialect().timestamp_column();

    vec![
        (
            "users",
            format!(
                r#"
                CREATE TABLE IF NOT EXISTS users (
                    id TEXT PRIMARY KEY,
                    email TEXT UNIQUE NOT NULL,
                    email_canonical TEXT NOT NULL DEFAULT '',
                    name TEXT NOT NULL,
                    password TEXT NOT NULL,
                    role TEXT NOT NULL DEFAULT 'admin',
                    created_at {ts}
                )
                "#
            ),
        ),
        (
            "categories",
            format!(
                r#"
                CREATE TABLE IF NOT EXISTS categories (
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL,
                    icon TEXT NOT NULL,
                    description TEXT NOT NULL,
                    created_at {ts},
                    updated_at {ts}
                )
                "#
            ),
        ),
        (
            "patterns",
            format!(
                r#"
                CREATE TABLE IF NOT EXISTS patterns (
                    id TEXT PRIMARY KEY,
                    category_id TEXT NOT NULL,
                    name TEXT NOT NULL,
                    icon TEXT NOT NULL,
                    description TEXT NOT NULL,
                    theory TEXT DEFAULT '',
                    created_at {ts},
                    updated_at {ts},
                    FOREIGN KEY (category_id) REFERENCES categories(id) ON DELETE CASCADE
                )
                "#
            ),
        ),
        (
            "problems",
            format!(
                r#"
                CREATE TABLE IF NOT EXISTS problems (
                    id TEXT PRIMARY KEY,
                    pattern_id TEXT NOT NULL,
                    title TEXT NOT NULL,
                    difficulty TEXT NOT NULL CHECK (difficulty IN ('Easy', 'Medium', 'Hard')),
                    description TEXT NOT NULL,
                    input TEXT NOT NULL,
                    output TEXT NOT NULL,
                    constraints TEXT NOT NULL,
                    sample_input TEXT NOT NULL,
                    sample_output TEXT NOT NULL,
                    explanation TEXT NOT NULL,
                    notes TEXT NOT NULL,
                    created_at {ts},
                    updated_at {ts},
                    FOREIGN KEY (pattern_id) REFERENCES patterns(id) ON DELETE CASCADE
                )
                "#
            ),
        ),
        (
            "solutions",
            format!(
                r#"
                CREATE TABLE IF NOT EXISTS solutions (
                    id TEXT PRIMARY KEY,
                    problem_id TEXT NOT NULL,
                    language TEXT NOT NULL,
                    code TEXT NOT NULL,
                    created_at {ts},
                    updated_at {ts},
                    FOREIGN KEY (problem_id) REFERENCES problems(id) ON DELETE CASCADE,
                    UNIQUE (problem_id, language)
                )
                "#
            ),
        ),
        (
            "learning_topics",
            format!(
                r#"
                CREATE TABLE IF NOT EXISTS learning_topics (
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL,
                    icon TEXT NOT NULL,
                    description TEXT NOT NULL,
                    slug TEXT UNIQUE NOT NULL,
                    created_at {ts},
                    updated_at {ts}
                )
                "#
            ),
        ),
        (
            "learning_resources",
            format!(
                r#"
                CREATE TABLE IF NOT EXISTS learning_resources (
                    id TEXT PRIMARY KEY,
                    topic_id TEXT NOT NULL,
                    title TEXT NOT NULL,
                    content TEXT NOT NULL,
                    type TEXT NOT NULL,
                    url TEXT,
                    order_index INTEGER DEFAULT 0,
                    created_at {ts},
                    updated_at {ts},
                    FOREIGN KEY (topic_id) REFERENCES learning_topics(id) ON DELETE CASCADE
                )
                "#
            ),
        ),
        (
            "roadmap_items",
            format!(
                r#"
                CREATE TABLE IF NOT EXISTS roadmap_items (
                    id TEXT PRIMARY KEY,
                    topic_id TEXT NOT NULL,
                    title TEXT NOT NULL,
                    description TEXT NOT NULL,
                    order_index INTEGER DEFAULT 0,
                    status TEXT DEFAULT 'todo',
                    created_at {ts},
                    updated_at {ts},
                    FOREIGN KEY (topic_id) REFERENCES learning_topics(id) ON DELETE CASCADE
                )
                "#
            ),
        ),
        (
            "indexes",
            "CREATE INDEX IF NOT EXISTS idx_patterns_category_id ON patterns(category_id)".into(),
        ),
        (
            "indexes",
            "CREATE INDEX IF NOT EXISTS idx_problems_pattern_id ON problems(pattern_id)".into(),
        ),
        (
            "indexes",
            "CREATE INDEX IF NOT EXISTS idx_solutions_problem_id ON solutions(problem_id)".into(),
        ),
        (
            "indexes",
            "CREATE INDEX IF NOT EXISTS idx_learning_resources_topic_id \
             ON learning_resources(topic_id)"
                .into(),
        ),
        (
            "indexes",
            "CREATE INDEX IF NOT EXISTS idx_roadmap_items_topic_id ON roadmap_items(topic_id)"
                .into(),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::sql::ConnectTarget;

    async fn bare_db() -> Database {
        Database::connect(&ConnectTarget::SqliteMemory).await.unwrap()
    }

    async fn column_names(db: &Database, table: &str) -> Vec<String> {
        sqlx::query_scalar("SELECT name FROM pragma_table_info(?)")
            .bind(table)
            .fetch_all(db.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_makes_every_table() {
        let db = bare_db().await;
        create(&db).await.unwrap();

        let tables: Vec<String> =
            sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
                .fetch_all(db.pool())
                .await
                .unwrap();
        for expected in [
            "categories",
            "learning_resources",
            "learning_topics",
            "patterns",
            "problems",
            "roadmap_items",
            "solutions",
            "users",
        ] {
            assert!(tables.iter().any(|t| t == expected), "missing {expected}");
        }
    }

    #[tokio::test]
    async fn test_initialize_twice_is_a_no_op() {
        let db = bare_db().await;
        initialize(&db).await.unwrap();
        let before = column_names(&db, "users").await;

        initialize(&db).await.unwrap();
        assert!(migrate(&db).await.unwrap().is_empty());

        let after = column_names(&db, "users").await;
        assert_eq!(before, after);
        assert_eq!(after.iter().filter(|c| *c == "role").count(), 1);
    }

    #[tokio::test]
    async fn test_migrate_upgrades_legacy_schema() {
        let db = bare_db().await;
        // First-release layout: no role, no theory, no email_canonical.
        for stmt in [
            "CREATE TABLE users (id TEXT PRIMARY KEY, email TEXT UNIQUE NOT NULL, \
             name TEXT NOT NULL, password TEXT NOT NULL, created_at DATETIME DEFAULT CURRENT_TIMESTAMP)",
            "CREATE TABLE categories (id TEXT PRIMARY KEY, name TEXT NOT NULL, icon TEXT NOT NULL, \
             description TEXT NOT NULL, created_at DATETIME DEFAULT CURRENT_TIMESTAMP, \
             updated_at DATETIME DEFAULT CURRENT_TIMESTAMP)",
            "CREATE TABLE patterns (id TEXT PRIMARY KEY, category_id TEXT NOT NULL, name TEXT NOT NULL, \
             icon TEXT NOT NULL, description TEXT NOT NULL, created_at DATETIME DEFAULT CURRENT_TIMESTAMP, \
             updated_at DATETIME DEFAULT CURRENT_TIMESTAMP, \
             FOREIGN KEY (category_id) REFERENCES categories(id) ON DELETE CASCADE)",
            "INSERT INTO users (id, email, name, password) VALUES ('u1', '  Old@Example.COM ', 'Old', 'x')",
            "INSERT INTO categories (id, name, icon, description) VALUES ('c1', 'Arrays', 'Grid', '')",
            "INSERT INTO patterns (id, category_id, name, icon, description) VALUES ('p1', 'c1', 'Two Pointers', 'Code', '')",
        ] {
            sqlx::query(stmt).execute(db.pool()).await.unwrap();
        }

        create(&db).await.unwrap();
        let added = migrate(&db).await.unwrap();
        assert_eq!(
            added,
            vec!["users.role", "patterns.theory", "users.email_canonical"]
        );

        let (role, canonical): (String, String) =
            sqlx::query_as("SELECT role, email_canonical FROM users WHERE id = 'u1'")
                .fetch_one(db.pool())
                .await
                .unwrap();
        assert_eq!(role, "admin");
        assert_eq!(canonical, "old@example.com");

        let theory: String = sqlx::query_scalar("SELECT theory FROM patterns WHERE id = 'p1'")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(theory, "");

        // Second boot sees nothing to do.
        assert!(migrate(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_canonical_email_index_is_unique_on_clean_data() {
        let db = bare_db().await;
        initialize(&db).await.unwrap();
        let indexes: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'index' AND tbl_name = 'users'",
        )
        .fetch_all(db.pool())
        .await
        .unwrap();
        assert!(indexes.iter().any(|i| i == EMAIL_CANONICAL_UNIQUE_INDEX));
        assert!(!indexes.iter().any(|i| i == EMAIL_CANONICAL_INDEX));
        assert!(!column_exists(&db, "categories", "seq").await.unwrap());
    }

    #[tokio::test]
    async fn test_column_exists() {
        let db = bare_db().await;
        initialize(&db).await.unwrap();
        assert!(column_exists(&db, "patterns", "theory").await.unwrap());
        assert!(!column_exists(&db, "patterns", "nonexistent").await.unwrap());
        assert!(!column_exists(&db, "no_such_table", "id").await.unwrap());
    }

    #[tokio::test]
    async fn test_difficulty_check_constraint() {
        let db = Database::new_in_memory().await.unwrap();
        sqlx::query("INSERT INTO categories (id, name, icon, description) VALUES ('c', 'C', '', '')")
            .execute(db.pool())
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO patterns (id, category_id, name, icon, description) VALUES ('p', 'c', 'P', '', '')",
        )
        .execute(db.pool())
        .await
        .unwrap();

        let result = sqlx::query(
            "INSERT INTO problems (id, pattern_id, title, difficulty, description, input, output, \
             constraints, sample_input, sample_output, explanation, notes) \
             VALUES ('x', 'p', 'T', 'Impossible', '', '', '', '', '', '', '', '')",
        )
        .execute(db.pool())
        .await;
        assert!(result.is_err());
    }
}

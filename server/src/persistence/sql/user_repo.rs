//! SQL-backed repository for user accounts.

use catalog::{canonical_email, Role, User};

use super::helpers::decode_timestamp;
use super::Database;
use crate::persistence::traits::{StoredUser, UserRepository};
use crate::persistence::{generate_id, PersistenceError};

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    email: String,
    name: String,
    password: String,
    role: Option<String>,
    created_at: String,
}

impl UserRow {
    fn into_stored(self) -> Result<StoredUser, PersistenceError> {
        Ok(StoredUser {
            user: User {
                id: self.id,
                email: self.email,
                name: self.name,
                role: Role::from_column(self.role.as_deref().unwrap_or_default()),
                created_at: decode_timestamp(&self.created_at)?,
            },
            password_hash: self.password,
        })
    }
}

/// SQL implementation of [`UserRepository`].
pub struct SqlUserRepository {
    db: Database,
}

impl SqlUserRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl UserRepository for SqlUserRepository {
    /// Oldest account first when a pre-migration database still holds
    /// several accounts for one canonical email.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<StoredUser>, PersistenceError> {
        let canonical = canonical_email(email);
        let rows: Vec<UserRow> = sqlx::query_as(&self.db.sql(
            r#"
            SELECT id, email, name, password, role,
                   CAST(created_at AS TEXT) AS created_at
            FROM users
            WHERE email_canonical = ?
            ORDER BY created_at ASC, id ASC
            "#,
        ))
        .bind(&canonical)
        .fetch_all(self.db.pool())
        .await?;

        if rows.len() > 1 {
            tracing::warn!(
                email = %canonical,
                accounts = rows.len(),
                "Several accounts share this email, using the oldest"
            );
        }
        rows.into_iter().next().map(UserRow::into_stored).transpose()
    }

    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, PersistenceError> {
        let row: Option<UserRow> = sqlx::query_as(&self.db.sql(
            r#"
            SELECT id, email, name, password, role,
                   CAST(created_at AS TEXT) AS created_at
            FROM users
            WHERE id = ?
            "#,
        ))
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(UserRow::into_stored).transpose()?.map(|s| s.user))
    }

    async fn find_role(&self, user_id: &str) -> Result<Option<Role>, PersistenceError> {
        let role: Option<Option<String>> =
            sqlx::query_scalar(&self.db.sql("SELECT role FROM users WHERE id = ?"))
                .bind(user_id)
                .fetch_optional(self.db.pool())
                .await?;

        Ok(role.map(|r| Role::from_column(r.as_deref().unwrap_or_default())))
    }

    async fn create_user(
        &self,
        email: &str,
        name: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<User, PersistenceError> {
        let id = generate_id();
        sqlx::query(&self.db.sql(
            r#"
            INSERT INTO users (id, email, email_canonical, name, password, role)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        ))
        .bind(&id)
        .bind(email.trim())
        .bind(canonical_email(email))
        .bind(name)
        .bind(password_hash)
        .bind(role.as_str())
        .execute(self.db.pool())
        .await?;

        tracing::info!(user_id = %id, role = role.as_str(), "User created");
        self.find_user_by_id(&id)
            .await?
            .ok_or(PersistenceError::Database(sqlx::Error::RowNotFound))
    }

    async fn update_password_hash(
        &self,
        user_id: &str,
        password_hash: &str,
    ) -> Result<bool, PersistenceError> {
        let result = sqlx::query(&self.db.sql("UPDATE users SET password = ? WHERE id = ?"))
            .bind(password_hash)
            .bind(user_id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

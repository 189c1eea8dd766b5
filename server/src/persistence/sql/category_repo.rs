//! SQL-backed repository for categories.

use catalog::{Category, CategoryInput};

use super::helpers::decode_timestamp;
use super::Database;
use crate::persistence::traits::CategoryRepository;
use crate::persistence::{generate_id, PersistenceError};

/// Row type for category queries, mapped via `sqlx::FromRow`.
#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: String,
    name: String,
    icon: String,
    description: String,
    pattern_count: i64,
    created_at: String,
    updated_at: String,
}

impl CategoryRow {
    fn into_category(self) -> Result<Category, PersistenceError> {
        Ok(Category {
            id: self.id,
            name: self.name,
            icon: self.icon,
            description: self.description,
            pattern_count: self.pattern_count,
            created_at: decode_timestamp(&self.created_at)?,
            updated_at: decode_timestamp(&self.updated_at)?,
        })
    }
}

/// SQL implementation of [`CategoryRepository`].
pub struct SqlCategoryRepository {
    db: Database,
}

impl SqlCategoryRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl CategoryRepository for SqlCategoryRepository {
    async fn list_categories(&self) -> Result<Vec<Category>, PersistenceError> {
        let sql = format!(
            r#"
            SELECT c.id, c.name, c.icon, c.description,
                   COUNT(DISTINCT p.id) AS pattern_count,
                   CAST(c.created_at AS TEXT) AS created_at,
                   CAST(c.updated_at AS TEXT) AS updated_at
            FROM categories c
            LEFT JOIN patterns p ON p.category_id = c.id
            GROUP BY c.id, c.name, c.icon, c.description, c.created_at, c.updated_at
            ORDER BY c.created_at ASC, c.{order} ASC
            "#,
            order = self.db.dialect().insertion_order(),
        );
        let rows: Vec<CategoryRow> = sqlx::query_as(&sql).fetch_all(self.db.pool()).await?;

        rows.into_iter().map(CategoryRow::into_category).collect()
    }

    async fn get_category(&self, id: &str) -> Result<Option<Category>, PersistenceError> {
        let row: Option<CategoryRow> = sqlx::query_as(&self.db.sql(
            r#"
            SELECT c.id, c.name, c.icon, c.description,
                   COUNT(DISTINCT p.id) AS pattern_count,
                   CAST(c.created_at AS TEXT) AS created_at,
                   CAST(c.updated_at AS TEXT) AS updated_at
            FROM categories c
            LEFT JOIN patterns p ON p.category_id = c.id
            WHERE c.id = ?
            GROUP BY c.id, c.name, c.icon, c.description, c.created_at, c.updated_at
            "#,
        ))
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        row.map(CategoryRow::into_category).transpose()
    }

    async fn create_category(&self, input: &CategoryInput) -> Result<Category, PersistenceError> {
        let id = generate_id();
        sqlx::query(&self.db.sql(
            "INSERT INTO categories (id, name, icon, description) VALUES (?, ?, ?, ?)",
        ))
        .bind(&id)
        .bind(&input.name)
        .bind(&input.icon)
        .bind(&input.description)
        .execute(self.db.pool())
        .await?;

        tracing::debug!(category_id = %id, name = %input.name, "Category inserted");
        self.get_category(&id)
            .await?
            .ok_or(PersistenceError::Database(sqlx::Error::RowNotFound))
    }

    async fn update_category(
        &self,
        id: &str,
        input: &CategoryInput,
    ) -> Result<Option<Category>, PersistenceError> {
        let sql = format!(
            r#"
            UPDATE categories
            SET name = ?, icon = ?, description = ?, updated_at = {now}
            WHERE id = ?
            "#,
            now = self.db.dialect().now(),
        );
        let result = sqlx::query(&self.db.sql(&sql))
        .bind(&input.name)
        .bind(&input.icon)
        .bind(&input.description)
        .bind(id)
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_category(id).await
    }

    async fn delete_category(&self, id: &str) -> Result<bool, PersistenceError> {
        let result = sqlx::query(&self.db.sql("DELETE FROM categories WHERE id = ?"))
            .bind(id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

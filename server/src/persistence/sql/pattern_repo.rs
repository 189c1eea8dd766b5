//! SQL-backed repository for patterns.

use catalog::{Pattern, PatternInput};

use super::helpers::decode_timestamp;
use super::Database;
use crate::persistence::traits::PatternRepository;
use crate::persistence::{generate_id, PersistenceError};

#[derive(sqlx::FromRow)]
struct PatternRow {
    id: String,
    category_id: String,
    name: String,
    icon: String,
    description: String,
    theory: String,
    problem_count: i64,
    created_at: String,
    updated_at: String,
}

impl PatternRow {
    fn into_pattern(self) -> Result<Pattern, PersistenceError> {
        Ok(Pattern {
            id: self.id,
            category_id: self.category_id,
            name: self.name,
            icon: self.icon,
            description: self.description,
            theory: self.theory,
            problem_count: self.problem_count,
            created_at: decode_timestamp(&self.created_at)?,
            updated_at: decode_timestamp(&self.updated_at)?,
        })
    }
}

/// SQL implementation of [`PatternRepository`].
pub struct SqlPatternRepository {
    db: Database,
}

impl SqlPatternRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl PatternRepository for SqlPatternRepository {
    async fn list_patterns(&self, category_id: &str) -> Result<Vec<Pattern>, PersistenceError> {
        let sql = format!(
            r#"
            SELECT p.id, p.category_id, p.name, p.icon, p.description,
                   COALESCE(p.theory, '') AS theory,
                   COUNT(DISTINCT pr.id) AS problem_count,
                   CAST(p.created_at AS TEXT) AS created_at,
                   CAST(p.updated_at AS TEXT) AS updated_at
            FROM patterns p
            LEFT JOIN problems pr ON pr.pattern_id = p.id
            WHERE p.category_id = ?
            GROUP BY p.id, p.category_id, p.name, p.icon, p.description, p.theory,
                     p.created_at, p.updated_at
            ORDER BY p.created_at ASC, p.{order} ASC
            "#,
            order = self.db.dialect().insertion_order(),
        );
        let rows: Vec<PatternRow> = sqlx::query_as(&self.db.sql(&sql))
        .bind(category_id)
        .fetch_all(self.db.pool())
        .await?;

        rows.into_iter().map(PatternRow::into_pattern).collect()
    }

    async fn get_pattern(&self, id: &str) -> Result<Option<Pattern>, PersistenceError> {
        let row: Option<PatternRow> = sqlx::query_as(&self.db.sql(
            r#"
            SELECT p.id, p.category_id, p.name, p.icon, p.description,
                   COALESCE(p.theory, '') AS theory,
                   COUNT(DISTINCT pr.id) AS problem_count,
                   CAST(p.created_at AS TEXT) AS created_at,
                   CAST(p.updated_at AS TEXT) AS updated_at
            FROM patterns p
            LEFT JOIN problems pr ON pr.pattern_id = p.id
            WHERE p.id = ?
            GROUP BY p.id, p.category_id, p.name, p.icon, p.description, p.theory,
                     p.created_at, p.updated_at
            "#,
        ))
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        row.map(PatternRow::into_pattern).transpose()
    }

    async fn create_pattern(
        &self,
        category_id: &str,
        input: &PatternInput,
    ) -> Result<Pattern, PersistenceError> {
        let id = generate_id();
        sqlx::query(&self.db.sql(
            r#"
            INSERT INTO patterns (id, category_id, name, icon, description, theory)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        ))
        .bind(&id)
        .bind(category_id)
        .bind(&input.name)
        .bind(&input.icon)
        .bind(&input.description)
        .bind(&input.theory)
        .execute(self.db.pool())
        .await?;

        tracing::debug!(pattern_id = %id, category_id, "Pattern inserted");
        self.get_pattern(&id)
            .await?
            .ok_or(PersistenceError::Database(sqlx::Error::RowNotFound))
    }

    async fn update_pattern(
        &self,
        id: &str,
        input: &PatternInput,
    ) -> Result<Option<Pattern>, PersistenceError> {
        let sql = format!(
            r#"
            UPDATE patterns
            SET name = ?, icon = ?, description = ?, theory = ?,
                updated_at = {now}
            WHERE id = ?
            "#,
            now = self.db.dialect().now(),
        );
        let result = sqlx::query(&self.db.sql(&sql))
        .bind(&input.name)
        .bind(&input.icon)
        .bind(&input.description)
        .bind(&input.theory)
        .bind(id)
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_pattern(id).await
    }

    async fn update_pattern_theory(
        &self,
        id: &str,
        theory: &str,
    ) -> Result<Option<Pattern>, PersistenceError> {
        let sql = format!(
            "UPDATE patterns SET theory = ?, updated_at = {} WHERE id = ?",
            self.db.dialect().now()
        );
        let result = sqlx::query(&self.db.sql(&sql))
        .bind(theory)
        .bind(id)
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_pattern(id).await
    }

    async fn delete_pattern(&self, id: &str) -> Result<bool, PersistenceError> {
        let result = sqlx::query(&self.db.sql("DELETE FROM patterns WHERE id = ?"))
            .bind(id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::sql::SqlCategoryRepository;
    use crate::persistence::traits::CategoryRepository;
    use catalog::CategoryInput;

    async fn test_db() -> (Database, SqlPatternRepository, String) {
        let db = Database::new_in_memory().await.unwrap();
        let category = SqlCategoryRepository::new(db.clone())
            .create_category(&CategoryInput {
                name: "Arrays".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        let repo = SqlPatternRepository::new(db.clone());
        (db, repo, category.id)
    }

    fn sample_pattern(name: &str) -> PatternInput {
        PatternInput {
            name: name.to_string(),
            icon: "Code".to_string(),
            description: "Walk inward from both ends".to_string(),
            theory: String::new(),
        }
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let (_db, repo, category_id) = test_db().await;
        let created = repo
            .create_pattern(&category_id, &sample_pattern("Two Pointers"))
            .await
            .unwrap();
        assert_eq!(created.category_id, category_id);
        assert_eq!(created.theory, "");
        assert_eq!(created.problem_count, 0);

        let list = repo.list_patterns(&category_id).await.unwrap();
        assert_eq!(list, vec![created]);
        assert!(repo.list_patterns("other").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_under_missing_category_fails() {
        let (_db, repo, _) = test_db().await;
        let result = repo
            .create_pattern("missing", &sample_pattern("Orphan"))
            .await;
        assert!(matches!(result, Err(PersistenceError::Database(_))));
    }

    #[tokio::test]
    async fn test_update_theory_only_touches_theory() {
        let (_db, repo, category_id) = test_db().await;
        let created = repo
            .create_pattern(&category_id, &sample_pattern("Two Pointers"))
            .await
            .unwrap();

        let updated = repo
            .update_pattern_theory(&created.id, "## When to use\nSorted input.")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.theory, "## When to use\nSorted input.");
        assert_eq!(updated.name, created.name);
        assert_eq!(updated.description, created.description);

        assert_eq!(
            repo.update_pattern_theory("missing", "x").await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_update_replaces_fields_but_not_parent() {
        let (_db, repo, category_id) = test_db().await;
        let created = repo
            .create_pattern(&category_id, &sample_pattern("Two Pointers"))
            .await
            .unwrap();

        let mut input = sample_pattern("Two Pointers (opposite ends)");
        input.theory = "theory".to_string();
        let updated = repo.update_pattern(&created.id, &input).await.unwrap().unwrap();
        assert_eq!(updated.name, "Two Pointers (opposite ends)");
        assert_eq!(updated.theory, "theory");
        assert_eq!(updated.category_id, category_id);
        assert_eq!(updated.created_at, created.created_at);
    }

    #[tokio::test]
    async fn test_delete() {
        let (_db, repo, category_id) = test_db().await;
        let created = repo
            .create_pattern(&category_id, &sample_pattern("Two Pointers"))
            .await
            .unwrap();
        assert!(repo.delete_pattern(&created.id).await.unwrap());
        assert_eq!(repo.get_pattern(&created.id).await.unwrap(), None);
        assert!(!repo.delete_pattern(&created.id).await.unwrap());
    }
}

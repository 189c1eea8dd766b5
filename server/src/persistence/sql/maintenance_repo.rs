//! Whole-catalogue import and wipe.

use catalog::{
    CatalogueImport, Difficulty, ImportStats, ImportedCategory, ImportedPattern, ImportedProblem,
};

use super::Database;
use crate::persistence::traits::MaintenanceRepository;
use crate::persistence::{generate_id, PersistenceError};

const IMPORTED_CATEGORY_ICON: &str = "Globe";
const IMPORTED_PATTERN_ICON: &str = "Code";
const PENDING_DESCRIPTION: &str = "Description pending fetch...";
const SEE_DESCRIPTION: &str = "See description";
const NO_CONSTRAINTS: &str = "No specific constraints provided.";

/// Child-to-parent order; users are never cleared.
const CLEAR_ORDER: &[&str] = &[
    "solutions",
    "problems",
    "patterns",
    "categories",
    "learning_resources",
    "roadmap_items",
    "learning_topics",
];

/// SQL implementation of [`MaintenanceRepository`].
pub struct SqlMaintenanceRepository {
    db: Database,
}

impl SqlMaintenanceRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    async fn find_id(&self, sql: &str, binds: &[&str]) -> Result<Option<String>, PersistenceError> {
        let sql = self.db.sql(sql);
        let mut query = sqlx::query_scalar::<_, String>(&sql);
        for value in binds {
            query = query.bind(*value);
        }
        Ok(query.fetch_optional(self.db.pool()).await?)
    }

    /// Existing id, or the id of a freshly created row and `true`.
    async fn ensure_category(
        &self,
        category: &ImportedCategory,
    ) -> Result<(String, bool), PersistenceError> {
        if let Some(id) = self
            .find_id("SELECT id FROM categories WHERE name = ?", &[category.name.as_str()])
            .await?
        {
            return Ok((id, false));
        }

        let id = generate_id();
        sqlx::query(&self.db.sql(
            "INSERT INTO categories (id, name, icon, description) VALUES (?, ?, ?, ?)",
        ))
        .bind(&id)
        .bind(&category.name)
        .bind(IMPORTED_CATEGORY_ICON)
        .bind(&category.description)
        .execute(self.db.pool())
        .await?;
        Ok((id, true))
    }

    async fn ensure_pattern(
        &self,
        category_id: &str,
        pattern: &ImportedPattern,
    ) -> Result<(String, bool), PersistenceError> {
        if let Some(id) = self
            .find_id(
                "SELECT id FROM patterns WHERE name = ? AND category_id = ?",
                &[pattern.name.as_str(), category_id],
            )
            .await?
        {
            return Ok((id, false));
        }

        let id = generate_id();
        sqlx::query(&self.db.sql(
            r#"
            INSERT INTO patterns (id, category_id, name, icon, description, theory)
            VALUES (?, ?, ?, ?, ?, '')
            "#,
        ))
        .bind(&id)
        .bind(category_id)
        .bind(&pattern.name)
        .bind(IMPORTED_PATTERN_ICON)
        .bind(&pattern.description)
        .execute(self.db.pool())
        .await?;
        Ok((id, true))
    }

    /// Returns whether a problem was created.
    async fn ensure_problem(
        &self,
        pattern_id: &str,
        problem: &ImportedProblem,
    ) -> Result<bool, PersistenceError> {
        if self
            .find_id(
                "SELECT id FROM problems WHERE title = ? AND pattern_id = ?",
                &[problem.title.as_str(), pattern_id],
            )
            .await?
            .is_some()
        {
            return Ok(false);
        }

        let id = problem
            .id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .unwrap_or_else(generate_id);

        sqlx::query(&self.db.sql(
            r#"
            INSERT INTO problems
                (id, pattern_id, title, difficulty, description, input, output,
                 constraints, sample_input, sample_output, explanation, notes)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, '', '', '', '')
            "#,
        ))
        .bind(&id)
        .bind(pattern_id)
        .bind(&problem.title)
        .bind(Difficulty::parse_lenient(&problem.difficulty).as_str())
        .bind(PENDING_DESCRIPTION)
        .bind(SEE_DESCRIPTION)
        .bind(SEE_DESCRIPTION)
        .bind(NO_CONSTRAINTS)
        .execute(self.db.pool())
        .await?;
        Ok(true)
    }
}

impl MaintenanceRepository for SqlMaintenanceRepository {
    async fn import_catalogue(
        &self,
        bundle: &CatalogueImport,
    ) -> Result<ImportStats, PersistenceError> {
        let mut stats = ImportStats::default();

        for category in &bundle.categories {
            let category_id = match self.ensure_category(category).await {
                Ok((id, created)) => {
                    stats.categories_created += u64::from(created);
                    id
                }
                Err(e) => {
                    tracing::warn!(category = %category.name, error = %e, "Skipping imported category");
                    continue;
                }
            };

            for pattern in &category.patterns {
                let pattern_id = match self.ensure_pattern(&category_id, pattern).await {
                    Ok((id, created)) => {
                        stats.patterns_created += u64::from(created);
                        id
                    }
                    Err(e) => {
                        tracing::warn!(pattern = %pattern.name, error = %e, "Skipping imported pattern");
                        continue;
                    }
                };

                for problem in &pattern.problems {
                    match self.ensure_problem(&pattern_id, problem).await {
                        Ok(created) => stats.problems_created += u64::from(created),
                        Err(e) => {
                            tracing::warn!(problem = %problem.title, error = %e, "Skipping imported problem");
                        }
                    }
                }
            }
        }

        tracing::info!(
            categories = stats.categories_created,
            patterns = stats.patterns_created,
            problems = stats.problems_created,
            "Catalogue import finished"
        );
        Ok(stats)
    }

    async fn clear_all(&self) -> Result<(), PersistenceError> {
        for table in CLEAR_ORDER {
            sqlx::query(&format!("DELETE FROM {table}"))
                .execute(self.db.pool())
                .await?;
        }
        tracing::info!("All catalogue and learning data cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::sql::seed;

    async fn test_db() -> (Database, SqlMaintenanceRepository) {
        let db = Database::new_in_memory().await.unwrap();
        let repo = SqlMaintenanceRepository::new(db.clone());
        (db, repo)
    }

    fn sample_bundle() -> CatalogueImport {
        serde_json::from_value(serde_json::json!({
            "categories": [{
                "name": "Arrays",
                "description": "Contiguous data",
                "patterns": [{
                    "name": "Two Pointers",
                    "description": "Walk inward",
                    "matched_problems": [
                        {"id": "valid-palindrome", "title": "Valid Palindrome", "difficulty": "Easy"},
                        {"id": "", "title": "3Sum", "difficulty": "medium"},
                        {"title": "Trapping Rain Water", "difficulty": "Extreme"}
                    ]
                }]
            }]
        }))
        .unwrap()
    }

    async fn count(db: &Database, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_import_creates_hierarchy() {
        let (db, repo) = test_db().await;
        let stats = repo.import_catalogue(&sample_bundle()).await.unwrap();
        assert_eq!(
            stats,
            ImportStats {
                categories_created: 1,
                patterns_created: 1,
                problems_created: 3,
            }
        );

        let (difficulty, description): (String, String) = sqlx::query_as(
            "SELECT difficulty, description FROM problems WHERE id = 'valid-palindrome'",
        )
        .fetch_one(db.pool())
        .await
        .unwrap();
        assert_eq!(difficulty, "Easy");
        assert_eq!(description, PENDING_DESCRIPTION);

        let hard_to_say: String =
            sqlx::query_scalar("SELECT difficulty FROM problems WHERE title = 'Trapping Rain Water'")
                .fetch_one(db.pool())
                .await
                .unwrap();
        assert_eq!(hard_to_say, "Medium");

        let icon: String = sqlx::query_scalar("SELECT icon FROM categories")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(icon, IMPORTED_CATEGORY_ICON);
    }

    #[tokio::test]
    async fn test_import_twice_creates_nothing_new() {
        let (db, repo) = test_db().await;
        repo.import_catalogue(&sample_bundle()).await.unwrap();
        let stats = repo.import_catalogue(&sample_bundle()).await.unwrap();
        assert_eq!(stats, ImportStats::default());
        assert_eq!(count(&db, "problems").await, 3);
    }

    #[tokio::test]
    async fn test_import_skips_failed_items() {
        let (db, repo) = test_db().await;
        // Occupy the upstream id under a different title so the insert collides.
        repo.import_catalogue(&sample_bundle()).await.unwrap();
        sqlx::query("UPDATE problems SET title = 'Renamed' WHERE id = 'valid-palindrome'")
            .execute(db.pool())
            .await
            .unwrap();

        let stats = repo.import_catalogue(&sample_bundle()).await.unwrap();
        assert_eq!(stats.problems_created, 0);
        assert_eq!(count(&db, "problems").await, 3);
    }

    #[tokio::test]
    async fn test_clear_all_keeps_users() {
        let (db, repo) = test_db().await;
        seed::seed(&db).await;
        repo.import_catalogue(&sample_bundle()).await.unwrap();

        repo.clear_all().await.unwrap();
        for table in CLEAR_ORDER {
            assert_eq!(count(&db, table).await, 0, "{table} not cleared");
        }
        assert_eq!(count(&db, "users").await, 1);
    }
}

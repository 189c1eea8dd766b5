//! SQL-backed repository for problems and their attached solutions.

use catalog::{Difficulty, Problem, ProblemInput, Solution};

use super::helpers::decode_timestamp;
use super::{solution_repo, Database};
use crate::persistence::traits::ProblemRepository;
use crate::persistence::{generate_id, PersistenceError};

#[derive(sqlx::FromRow)]
struct ProblemRow {
    id: String,
    pattern_id: String,
    title: String,
    difficulty: String,
    description: String,
    input: String,
    output: String,
    constraints: String,
    sample_input: String,
    sample_output: String,
    explanation: String,
    notes: String,
    created_at: String,
    updated_at: String,
}

impl ProblemRow {
    fn into_problem(self, solutions: Vec<Solution>) -> Result<Problem, PersistenceError> {
        Ok(Problem {
            id: self.id,
            pattern_id: self.pattern_id,
            title: self.title,
            // Rows written before the CHECK constraint may hold anything.
            difficulty: Difficulty::parse_lenient(&self.difficulty),
            description: self.description,
            input: self.input,
            output: self.output,
            constraints: self.constraints,
            sample_input: self.sample_input,
            sample_output: self.sample_output,
            explanation: self.explanation,
            notes: self.notes,
            solutions,
            created_at: decode_timestamp(&self.created_at)?,
            updated_at: decode_timestamp(&self.updated_at)?,
        })
    }
}

/// SQL implementation of [`ProblemRepository`].
pub struct SqlProblemRepository {
    db: Database,
}

impl SqlProblemRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl ProblemRepository for SqlProblemRepository {
    async fn list_problems(&self, pattern_id: &str) -> Result<Vec<Problem>, PersistenceError> {
        let sql = format!(
            r#"
            SELECT id, pattern_id, title, difficulty, description, input, output,
                   constraints, sample_input, sample_output, explanation, notes,
                   CAST(created_at AS TEXT) AS created_at,
                   CAST(updated_at AS TEXT) AS updated_at
            FROM problems
            WHERE pattern_id = ?
            ORDER BY created_at ASC, {order} ASC
            "#,
            order = self.db.dialect().insertion_order(),
        );
        let rows: Vec<ProblemRow> = sqlx::query_as(&self.db.sql(&sql))
        .bind(pattern_id)
        .fetch_all(self.db.pool())
        .await?;

        let mut solutions = solution_repo::load_for_pattern(&self.db, pattern_id).await?;
        rows.into_iter()
            .map(|row| {
                let attached = solutions.remove(&row.id).unwrap_or_default();
                row.into_problem(attached)
            })
            .collect()
    }

    async fn get_problem(&self, id: &str) -> Result<Option<Problem>, PersistenceError> {
        let row: Option<ProblemRow> = sqlx::query_as(&self.db.sql(
            r#"
            SELECT id, pattern_id, title, difficulty, description, input, output,
                   constraints, sample_input, sample_output, explanation, notes,
                   CAST(created_at AS TEXT) AS created_at,
                   CAST(updated_at AS TEXT) AS updated_at
            FROM problems
            WHERE id = ?
            "#,
        ))
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        match row {
            None => Ok(None),
            Some(r) => {
                let solutions = solution_repo::load_for_problem(&self.db, &r.id).await?;
                Ok(Some(r.into_problem(solutions)?))
            }
        }
    }

    async fn create_problem(
        &self,
        pattern_id: &str,
        input: &ProblemInput,
    ) -> Result<Problem, PersistenceError> {
        let id = generate_id();
        sqlx::query(&self.db.sql(
            r#"
            INSERT INTO problems
                (id, pattern_id, title, difficulty, description, input, output,
                 constraints, sample_input, sample_output, explanation, notes)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        ))
        .bind(&id)
        .bind(pattern_id)
        .bind(&input.title)
        .bind(input.difficulty.as_str())
        .bind(&input.description)
        .bind(&input.input)
        .bind(&input.output)
        .bind(&input.constraints)
        .bind(&input.sample_input)
        .bind(&input.sample_output)
        .bind(&input.explanation)
        .bind(&input.notes)
        .execute(self.db.pool())
        .await?;

        solution_repo::save_all(&self.db, &id, &input.solutions).await?;

        tracing::debug!(
            problem_id = %id,
            pattern_id,
            solutions = input.solutions.len(),
            "Problem inserted"
        );
        self.get_problem(&id)
            .await?
            .ok_or(PersistenceError::Database(sqlx::Error::RowNotFound))
    }

    async fn update_problem(
        &self,
        id: &str,
        input: &ProblemInput,
    ) -> Result<Option<Problem>, PersistenceError> {
        let sql = format!(
            r#"
            UPDATE problems
            SET title = ?, difficulty = ?, description = ?, input = ?, output = ?,
                constraints = ?, sample_input = ?, sample_output = ?,
                explanation = ?, notes = ?, updated_at = {now}
            WHERE id = ?
            "#,
            now = self.db.dialect().now(),
        );
        let result = sqlx::query(&self.db.sql(&sql))
        .bind(&input.title)
        .bind(input.difficulty.as_str())
        .bind(&input.description)
        .bind(&input.input)
        .bind(&input.output)
        .bind(&input.constraints)
        .bind(&input.sample_input)
        .bind(&input.sample_output)
        .bind(&input.explanation)
        .bind(&input.notes)
        .bind(id)
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        solution_repo::save_all(&self.db, id, &input.solutions).await?;
        self.get_problem(id).await
    }

    async fn delete_problem(&self, id: &str) -> Result<bool, PersistenceError> {
        let result = sqlx::query(&self.db.sql("DELETE FROM problems WHERE id = ?"))
            .bind(id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

//! SQL-backed repository for per-language solutions.

use std::collections::HashMap;

use catalog::{Solution, SolutionInput};

use super::helpers::decode_timestamp;
use super::Database;
use crate::persistence::traits::SolutionRepository;
use crate::persistence::{generate_id, PersistenceError};

#[derive(sqlx::FromRow)]
struct SolutionRow {
    id: String,
    problem_id: String,
    language: String,
    code: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<SolutionRow> for Solution {
    type Error = PersistenceError;

    fn try_from(r: SolutionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            problem_id: r.problem_id,
            language: r.language,
            code: r.code,
            created_at: decode_timestamp(&r.created_at)?,
            updated_at: decode_timestamp(&r.updated_at)?,
        })
    }
}

/// SQL implementation of [`SolutionRepository`].
pub struct SqlSolutionRepository {
    db: Database,
}

impl SqlSolutionRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl SolutionRepository for SqlSolutionRepository {
    async fn list_solutions(&self, problem_id: &str) -> Result<Vec<Solution>, PersistenceError> {
        load_for_problem(&self.db, problem_id).await
    }

    async fn upsert_solution(
        &self,
        problem_id: &str,
        language: &str,
        code: &str,
    ) -> Result<Solution, PersistenceError> {
        upsert(&self.db, problem_id, language, code).await
    }

    async fn save_solutions(
        &self,
        problem_id: &str,
        solutions: &[SolutionInput],
    ) -> Result<Vec<Solution>, PersistenceError> {
        save_all(&self.db, problem_id, solutions).await
    }
}

/// All solutions of one problem, oldest first.
pub(super) async fn load_for_problem(
    db: &Database,
    problem_id: &str,
) -> Result<Vec<Solution>, PersistenceError> {
    let sql = format!(
        r#"
        SELECT id, problem_id, language, code,
               CAST(created_at AS TEXT) AS created_at,
               CAST(updated_at AS TEXT) AS updated_at
        FROM solutions
        WHERE problem_id = ?
        ORDER BY created_at ASC, {order} ASC
        "#,
        order = db.dialect().insertion_order(),
    );
    let rows: Vec<SolutionRow> = sqlx::query_as(&db.sql(&sql))
    .bind(problem_id)
    .fetch_all(db.pool())
    .await?;

    rows.into_iter().map(Solution::try_from).collect()
}

/// Solutions of every problem under one pattern, grouped by problem id.
pub(super) async fn load_for_pattern(
    db: &Database,
    pattern_id: &str,
) -> Result<HashMap<String, Vec<Solution>>, PersistenceError> {
    let sql = format!(
        r#"
        SELECT s.id, s.problem_id, s.language, s.code,
               CAST(s.created_at AS TEXT) AS created_at,
               CAST(s.updated_at AS TEXT) AS updated_at
        FROM solutions s
        JOIN problems p ON p.id = s.problem_id
        WHERE p.pattern_id = ?
        ORDER BY s.created_at ASC, s.{order} ASC
        "#,
        order = db.dialect().insertion_order(),
    );
    let rows: Vec<SolutionRow> = sqlx::query_as(&db.sql(&sql))
    .bind(pattern_id)
    .fetch_all(db.pool())
    .await?;

    let mut grouped: HashMap<String, Vec<Solution>> = HashMap::new();
    for row in rows {
        let solution = Solution::try_from(row)?;
        grouped
            .entry(solution.problem_id.clone())
            .or_default()
            .push(solution);
    }
    Ok(grouped)
}

/// Upsert each listed solution in order. Languages not listed are untouched.
pub(super) async fn save_all(
    db: &Database,
    problem_id: &str,
    solutions: &[SolutionInput],
) -> Result<Vec<Solution>, PersistenceError> {
    let mut saved = Vec::with_capacity(solutions.len());
    for s in solutions {
        saved.push(upsert(db, problem_id, &s.language, &s.code).await?);
    }
    Ok(saved)
}

/// Update the `(problem_id, language)` row if present, insert it otherwise.
///
/// Two writers can both miss the row and both insert; the loser hits the
/// UNIQUE constraint and falls back to updating the winner's row.
pub(super) async fn upsert(
    db: &Database,
    problem_id: &str,
    language: &str,
    code: &str,
) -> Result<Solution, PersistenceError> {
    if let Some(existing) = update_code(db, problem_id, language, code).await? {
        return Ok(existing);
    }

    let id = generate_id();
    let inserted = sqlx::query(&db.sql(
        "INSERT INTO solutions (id, problem_id, language, code) VALUES (?, ?, ?, ?)",
    ))
    .bind(&id)
    .bind(problem_id)
    .bind(language)
    .bind(code)
    .execute(db.pool())
    .await
    .map_err(PersistenceError::from);

    match inserted {
        Ok(_) => {}
        Err(e) if e.is_unique_violation() => {
            tracing::debug!(problem_id, language, "Concurrent solution insert, retrying as update");
            return update_code(db, problem_id, language, code).await?.ok_or(e);
        }
        Err(e) => return Err(e),
    }

    find(db, problem_id, language)
        .await?
        .ok_or(PersistenceError::Database(sqlx::Error::RowNotFound))
}

async fn update_code(
    db: &Database,
    problem_id: &str,
    language: &str,
    code: &str,
) -> Result<Option<Solution>, PersistenceError> {
    let sql = format!(
        r#"
        UPDATE solutions
        SET code = ?, updated_at = {now}
        WHERE problem_id = ? AND language = ?
        "#,
        now = db.dialect().now(),
    );
    let result = sqlx::query(&db.sql(&sql))
    .bind(code)
    .bind(problem_id)
    .bind(language)
    .execute(db.pool())
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    find(db, problem_id, language).await
}

async fn find(
    db: &Database,
    problem_id: &str,
    language: &str,
) -> Result<Option<Solution>, PersistenceError> {
    let row: Option<SolutionRow> = sqlx::query_as(&db.sql(
        r#"
        SELECT id, problem_id, language, code,
               CAST(created_at AS TEXT) AS created_at,
               CAST(updated_at AS TEXT) AS updated_at
        FROM solutions
        WHERE problem_id = ? AND language = ?
        "#,
    ))
    .bind(problem_id)
    .bind(language)
    .fetch_optional(db.pool())
    .await?;

    row.map(Solution::try_from).transpose()
}

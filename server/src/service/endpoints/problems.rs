//! Problem and solution endpoints

use std::sync::Arc;

use catalog::{Problem, ProblemInput, Solution, SolutionInput};

use crate::persistence::traits::{PatternRepository, ProblemRepository, SolutionRepository};
use crate::service::{ServiceContext, ServiceError};

pub struct ProblemEndpoints {
    context: Arc<ServiceContext>,
}

impl ProblemEndpoints {
    pub(crate) fn new(context: Arc<ServiceContext>) -> Self {
        Self { context }
    }

    /// Problems of a pattern, each with its solutions.
    pub async fn list(
        &self,
        authorization: Option<&str>,
        pattern_id: &str,
    ) -> Result<Vec<Problem>, ServiceError> {
        let (backend, _caller) = self.context.authorize(authorization).await?;
        tracing::debug!(pattern_id = %pattern_id, "RPC list_problems");
        Ok(backend.problems.list_problems(pattern_id).await?)
    }

    pub async fn get(&self, authorization: Option<&str>, id: &str) -> Result<Problem, ServiceError> {
        let (backend, _caller) = self.context.authorize(authorization).await?;
        tracing::debug!(problem_id = %id, "RPC get_problem");
        backend
            .problems
            .get_problem(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("problem", id))
    }

    pub async fn create(
        &self,
        authorization: Option<&str>,
        pattern_id: &str,
        input: ProblemInput,
    ) -> Result<Problem, ServiceError> {
        let (backend, caller) = self.context.authorize(authorization).await?;
        caller.ensure_can_write("create problems")?;
        tracing::info!(pattern_id = %pattern_id, title = %input.title, "RPC create_problem");
        input.validate()?;

        if backend.patterns.get_pattern(pattern_id).await?.is_none() {
            return Err(ServiceError::not_found("pattern", pattern_id));
        }
        Ok(backend.problems.create_problem(pattern_id, &input).await?)
    }

    /// Replace the problem's fields and upsert the listed solutions.
    pub async fn update(
        &self,
        authorization: Option<&str>,
        id: &str,
        input: ProblemInput,
    ) -> Result<Problem, ServiceError> {
        let (backend, caller) = self.context.authorize(authorization).await?;
        caller.ensure_can_write("update problems")?;
        tracing::info!(problem_id = %id, solutions = input.solutions.len(), "RPC update_problem");
        input.validate()?;

        backend
            .problems
            .update_problem(id, &input)
            .await?
            .ok_or_else(|| ServiceError::not_found("problem", id))
    }

    pub async fn delete(&self, authorization: Option<&str>, id: &str) -> Result<(), ServiceError> {
        let (backend, caller) = self.context.authorize(authorization).await?;
        caller.ensure_can_write("delete problems")?;
        tracing::info!(problem_id = %id, "RPC delete_problem");

        if !backend.problems.delete_problem(id).await? {
            return Err(ServiceError::not_found("problem", id));
        }
        Ok(())
    }

    /// Save one language's solution, keeping its id if it already exists.
    pub async fn save_solution(
        &self,
        authorization: Option<&str>,
        problem_id: &str,
        input: SolutionInput,
    ) -> Result<Solution, ServiceError> {
        let (backend, caller) = self.context.authorize(authorization).await?;
        caller.ensure_can_write("save solutions")?;
        tracing::info!(problem_id = %problem_id, language = %input.language, "RPC save_solution");
        input.validate()?;

        if backend.problems.get_problem(problem_id).await?.is_none() {
            return Err(ServiceError::not_found("problem", problem_id));
        }
        Ok(backend
            .solutions
            .upsert_solution(problem_id, &input.language, &input.code)
            .await?)
    }
}

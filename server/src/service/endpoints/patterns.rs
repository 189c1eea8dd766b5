//! Pattern endpoints, nested under categories

use std::sync::Arc;

use catalog::{Pattern, PatternInput};

use crate::persistence::traits::{CategoryRepository, PatternRepository};
use crate::service::{ServiceContext, ServiceError};

pub struct PatternEndpoints {
    context: Arc<ServiceContext>,
}

impl PatternEndpoints {
    pub(crate) fn new(context: Arc<ServiceContext>) -> Self {
        Self { context }
    }

    /// Patterns of a category with their problem counts.
    pub async fn list(
        &self,
        authorization: Option<&str>,
        category_id: &str,
    ) -> Result<Vec<Pattern>, ServiceError> {
        let (backend, _caller) = self.context.authorize(authorization).await?;
        tracing::debug!(category_id = %category_id, "RPC list_patterns");
        Ok(backend.patterns.list_patterns(category_id).await?)
    }

    pub async fn get(&self, authorization: Option<&str>, id: &str) -> Result<Pattern, ServiceError> {
        let (backend, _caller) = self.context.authorize(authorization).await?;
        tracing::debug!(pattern_id = %id, "RPC get_pattern");
        backend
            .patterns
            .get_pattern(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("pattern", id))
    }

    pub async fn create(
        &self,
        authorization: Option<&str>,
        category_id: &str,
        input: PatternInput,
    ) -> Result<Pattern, ServiceError> {
        let (backend, caller) = self.context.authorize(authorization).await?;
        caller.ensure_can_write("create patterns")?;
        tracing::info!(category_id = %category_id, name = %input.name, "RPC create_pattern");
        input.validate()?;

        if backend.categories.get_category(category_id).await?.is_none() {
            return Err(ServiceError::not_found("category", category_id));
        }
        Ok(backend.patterns.create_pattern(category_id, &input).await?)
    }

    pub async fn update(
        &self,
        authorization: Option<&str>,
        id: &str,
        input: PatternInput,
    ) -> Result<Pattern, ServiceError> {
        let (backend, caller) = self.context.authorize(authorization).await?;
        caller.ensure_can_write("update patterns")?;
        tracing::info!(pattern_id = %id, "RPC update_pattern");
        input.validate()?;

        backend
            .patterns
            .update_pattern(id, &input)
            .await?
            .ok_or_else(|| ServiceError::not_found("pattern", id))
    }

    /// Replace only the theory text.
    pub async fn update_theory(
        &self,
        authorization: Option<&str>,
        id: &str,
        theory: &str,
    ) -> Result<Pattern, ServiceError> {
        let (backend, caller) = self.context.authorize(authorization).await?;
        caller.ensure_can_write("update pattern theory")?;
        tracing::info!(pattern_id = %id, len = theory.len(), "RPC update_pattern_theory");

        backend
            .patterns
            .update_pattern_theory(id, theory)
            .await?
            .ok_or_else(|| ServiceError::not_found("pattern", id))
    }

    pub async fn delete(&self, authorization: Option<&str>, id: &str) -> Result<(), ServiceError> {
        let (backend, caller) = self.context.authorize(authorization).await?;
        caller.ensure_can_write("delete patterns")?;
        tracing::info!(pattern_id = %id, "RPC delete_pattern");

        if !backend.patterns.delete_pattern(id).await? {
            return Err(ServiceError::not_found("pattern", id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::test_support::*;
    use crate::service::ServiceSettings;
    use catalog::CategoryInput;

    fn sample_pattern(name: &str) -> PatternInput {
        PatternInput {
            name: name.to_string(),
            icon: "ArrowLeftRight".to_string(),
            description: "Two indices moving toward each other".to_string(),
            theory: String::new(),
        }
    }

    #[tokio::test]
    async fn test_create_under_missing_category() {
        let (service, _db) = ready_service(ServiceSettings::default()).await;
        let result = service
            .patterns()
            .create(Some(&admin_header()), "no-such-category", sample_pattern("Two Pointers"))
            .await;
        assert!(matches!(result, Err(ServiceError::NotFound { kind: "category", .. })));
    }

    #[tokio::test]
    async fn test_theory_update_keeps_other_fields() {
        let (service, _db) = ready_service(ServiceSettings::default()).await;
        let admin = admin_header();
        let category = service
            .categories()
            .create(
                Some(&admin),
                CategoryInput {
                    name: "Arrays".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let pattern = service
            .patterns()
            .create(Some(&admin), &category.id, sample_pattern("Two Pointers"))
            .await
            .unwrap();

        let updated = service
            .patterns()
            .update_theory(Some(&admin), &pattern.id, "## Invariant\nl < r")
            .await
            .unwrap();
        assert_eq!(updated.theory, "## Invariant\nl < r");
        assert_eq!(updated.name, "Two Pointers");
        assert_eq!(updated.category_id, category.id);

        let missing = service
            .patterns()
            .update_theory(Some(&admin), "missing", "x")
            .await;
        assert_eq!(missing.unwrap_err().status_code(), 404);
    }
}

//! Category endpoints

use std::sync::Arc;

use catalog::{Category, CategoryInput};

use crate::persistence::traits::CategoryRepository;
use crate::service::{ServiceContext, ServiceError};

pub struct CategoryEndpoints {
    context: Arc<ServiceContext>,
}

impl CategoryEndpoints {
    pub(crate) fn new(context: Arc<ServiceContext>) -> Self {
        Self { context }
    }

    pub async fn list(&self, authorization: Option<&str>) -> Result<Vec<Category>, ServiceError> {
        let (backend, _caller) = self.context.authorize(authorization).await?;
        tracing::debug!("RPC list_categories");
        Ok(backend.categories.list_categories().await?)
    }

    pub async fn get(
        &self,
        authorization: Option<&str>,
        id: &str,
    ) -> Result<Category, ServiceError> {
        let (backend, _caller) = self.context.authorize(authorization).await?;
        tracing::debug!(category_id = %id, "RPC get_category");
        backend
            .categories
            .get_category(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("category", id))
    }

    pub async fn create(
        &self,
        authorization: Option<&str>,
        input: CategoryInput,
    ) -> Result<Category, ServiceError> {
        let (backend, caller) = self.context.authorize(authorization).await?;
        caller.ensure_can_write("create categories")?;
        tracing::info!(name = %input.name, "RPC create_category");
        input.validate()?;

        Ok(backend.categories.create_category(&input).await?)
    }

    pub async fn update(
        &self,
        authorization: Option<&str>,
        id: &str,
        input: CategoryInput,
    ) -> Result<Category, ServiceError> {
        let (backend, caller) = self.context.authorize(authorization).await?;
        caller.ensure_can_write("update categories")?;
        tracing::info!(category_id = %id, "RPC update_category");
        input.validate()?;

        backend
            .categories
            .update_category(id, &input)
            .await?
            .ok_or_else(|| ServiceError::not_found("category", id))
    }

    /// Deletes the category with its patterns, problems and solutions.
    pub async fn delete(&self, authorization: Option<&str>, id: &str) -> Result<(), ServiceError> {
        let (backend, caller) = self.context.authorize(authorization).await?;
        caller.ensure_can_write("delete categories")?;
        tracing::info!(category_id = %id, "RPC delete_category");

        if !backend.categories.delete_category(id).await? {
            return Err(ServiceError::not_found("category", id));
        }
        Ok(())
    }
}

//! Bulk import and wipe

use std::sync::Arc;

use catalog::{CatalogueImport, ImportStats};

use crate::persistence::traits::MaintenanceRepository;
use crate::service::{ServiceContext, ServiceError};

pub struct MaintenanceEndpoints {
    context: Arc<ServiceContext>,
}

impl MaintenanceEndpoints {
    pub(crate) fn new(context: Arc<ServiceContext>) -> Self {
        Self { context }
    }

    /// Merge an externally fetched catalogue into the store.
    pub async fn import(
        &self,
        authorization: Option<&str>,
        bundle: CatalogueImport,
    ) -> Result<ImportStats, ServiceError> {
        let (backend, caller) = self.context.authorize(authorization).await?;
        caller.ensure_can_write("import data")?;
        tracing::info!(
            user_id = %caller.user_id,
            categories = bundle.categories.len(),
            "RPC import_catalogue"
        );
        Ok(backend.maintenance.import_catalogue(&bundle).await?)
    }

    /// Delete every category, pattern, problem, solution and learning row.
    pub async fn clear_all(&self, authorization: Option<&str>) -> Result<(), ServiceError> {
        let (backend, caller) = self.context.authorize(authorization).await?;
        caller.ensure_can_write("clear data")?;
        tracing::warn!(user_id = %caller.user_id, "RPC clear_all");
        Ok(backend.maintenance.clear_all().await?)
    }
}

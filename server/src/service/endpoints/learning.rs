//! Learning topic endpoints (read-only)

use std::sync::Arc;

use catalog::{LearningResource, LearningTopic, RoadmapItem};

use crate::persistence::traits::LearningRepository;
use crate::service::{ServiceContext, ServiceError};

pub struct LearningEndpoints {
    context: Arc<ServiceContext>,
}

impl LearningEndpoints {
    pub(crate) fn new(context: Arc<ServiceContext>) -> Self {
        Self { context }
    }

    pub async fn topics(
        &self,
        authorization: Option<&str>,
    ) -> Result<Vec<LearningTopic>, ServiceError> {
        let (backend, _caller) = self.context.authorize(authorization).await?;
        tracing::debug!("RPC list_learning_topics");
        Ok(backend.learning.list_topics().await?)
    }

    pub async fn topic(
        &self,
        authorization: Option<&str>,
        slug: &str,
    ) -> Result<LearningTopic, ServiceError> {
        let (backend, _caller) = self.context.authorize(authorization).await?;
        tracing::debug!(slug = %slug, "RPC get_learning_topic");
        backend
            .learning
            .get_topic_by_slug(slug)
            .await?
            .ok_or_else(|| ServiceError::not_found("topic", slug))
    }

    pub async fn resources(
        &self,
        authorization: Option<&str>,
        topic_id: &str,
    ) -> Result<Vec<LearningResource>, ServiceError> {
        let (backend, _caller) = self.context.authorize(authorization).await?;
        tracing::debug!(topic_id = %topic_id, "RPC list_learning_resources");
        Ok(backend.learning.list_resources(topic_id).await?)
    }

    pub async fn roadmap(
        &self,
        authorization: Option<&str>,
        topic_id: &str,
    ) -> Result<Vec<RoadmapItem>, ServiceError> {
        let (backend, _caller) = self.context.authorize(authorization).await?;
        tracing::debug!(topic_id = %topic_id, "RPC get_roadmap");
        Ok(backend.learning.list_roadmap(topic_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use crate::service::test_support::*;
    use crate::service::ServiceSettings;

    #[tokio::test]
    async fn test_demo_reads_seeded_topics() {
        let (service, _db) = ready_service(ServiceSettings::default()).await;
        let demo = demo_header();

        let topics = service.learning().topics(Some(&demo)).await.unwrap();
        assert_eq!(topics.len(), 7);

        let docker = service.learning().topic(Some(&demo), "docker").await.unwrap();
        assert!(service
            .learning()
            .resources(Some(&demo), &docker.id)
            .await
            .unwrap()
            .is_empty());
        assert!(service
            .learning()
            .roadmap(Some(&demo), &docker.id)
            .await
            .unwrap()
            .is_empty());

        let missing = service.learning().topic(Some(&demo), "cobol").await;
        assert_eq!(missing.unwrap_err().status_code(), 404);
    }
}

//! SQL-backed read access to learning topics, resources and roadmaps.

use catalog::{LearningResource, LearningTopic, RoadmapItem, RoadmapStatus};

use super::helpers::decode_timestamp;
use super::Database;
use crate::persistence::traits::LearningRepository;
use crate::persistence::PersistenceError;

#[derive(sqlx::FromRow)]
struct TopicRow {
    id: String,
    name: String,
    icon: String,
    description: String,
    slug: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<TopicRow> for LearningTopic {
    type Error = PersistenceError;

    fn try_from(r: TopicRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            name: r.name,
            icon: r.icon,
            description: r.description,
            slug: r.slug,
            created_at: decode_timestamp(&r.created_at)?,
            updated_at: decode_timestamp(&r.updated_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ResourceRow {
    id: String,
    topic_id: String,
    title: String,
    content: String,
    kind: String,
    url: Option<String>,
    order_index: i64,
    created_at: String,
    updated_at: String,
}

impl TryFrom<ResourceRow> for LearningResource {
    type Error = PersistenceError;

    fn try_from(r: ResourceRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            topic_id: r.topic_id,
            title: r.title,
            content: r.content,
            kind: r.kind,
            url: r.url,
            order_index: r.order_index,
            created_at: decode_timestamp(&r.created_at)?,
            updated_at: decode_timestamp(&r.updated_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct RoadmapRow {
    id: String,
    topic_id: String,
    title: String,
    description: String,
    order_index: i64,
    status: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<RoadmapRow> for RoadmapItem {
    type Error = PersistenceError;

    fn try_from(r: RoadmapRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            topic_id: r.topic_id,
            title: r.title,
            description: r.description,
            order_index: r.order_index,
            status: RoadmapStatus::from_column(&r.status),
            created_at: decode_timestamp(&r.created_at)?,
            updated_at: decode_timestamp(&r.updated_at)?,
        })
    }
}

/// SQL implementation of [`LearningRepository`].
pub struct SqlLearningRepository {
    db: Database,
}

impl SqlLearningRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl LearningRepository for SqlLearningRepository {
    async fn list_topics(&self) -> Result<Vec<LearningTopic>, PersistenceError> {
        let rows: Vec<TopicRow> = sqlx::query_as(
            r#"
            SELECT id, name, icon, description, slug,
                   CAST(created_at AS TEXT) AS created_at,
                   CAST(updated_at AS TEXT) AS updated_at
            FROM learning_topics
            ORDER BY name ASC
            "#,
        )
        .fetch_all(self.db.pool())
        .await?;

        rows.into_iter().map(LearningTopic::try_from).collect()
    }

    async fn get_topic_by_slug(&self, slug: &str) -> Result<Option<LearningTopic>, PersistenceError> {
        let row: Option<TopicRow> = sqlx::query_as(&self.db.sql(
            r#"
            SELECT id, name, icon, description, slug,
                   CAST(created_at AS TEXT) AS created_at,
                   CAST(updated_at AS TEXT) AS updated_at
            FROM learning_topics
            WHERE slug = ?
            "#,
        ))
        .bind(slug)
        .fetch_optional(self.db.pool())
        .await?;

        row.map(LearningTopic::try_from).transpose()
    }

    async fn list_resources(&self, topic_id: &str) -> Result<Vec<LearningResource>, PersistenceError> {
        let rows: Vec<ResourceRow> = sqlx::query_as(&self.db.sql(
            r#"
            SELECT id, topic_id, title, content, type AS kind, url,
                   COALESCE(order_index, 0) AS order_index,
                   CAST(created_at AS TEXT) AS created_at,
                   CAST(updated_at AS TEXT) AS updated_at
            FROM learning_resources
            WHERE topic_id = ?
            ORDER BY order_index ASC
            "#,
        ))
        .bind(topic_id)
        .fetch_all(self.db.pool())
        .await?;

        rows.into_iter().map(LearningResource::try_from).collect()
    }

    async fn list_roadmap(&self, topic_id: &str) -> Result<Vec<RoadmapItem>, PersistenceError> {
        let rows: Vec<RoadmapRow> = sqlx::query_as(&self.db.sql(
            r#"
            SELECT id, topic_id, title, description,
                   COALESCE(order_index, 0) AS order_index,
                   COALESCE(status, 'todo') AS status,
                   CAST(created_at AS TEXT) AS created_at,
                   CAST(updated_at AS TEXT) AS updated_at
            FROM roadmap_items
            WHERE topic_id = ?
            ORDER BY order_index ASC
            "#,
        ))
        .bind(topic_id)
        .fetch_all(self.db.pool())
        .await?;

        rows.into_iter().map(RoadmapItem::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::sql::seed::ensure_learning_topics;

    async fn test_db() -> (Database, SqlLearningRepository) {
        let db = Database::new_in_memory().await.unwrap();
        ensure_learning_topics(&db).await.unwrap();
        let repo = SqlLearningRepository::new(db.clone());
        (db, repo)
    }

    #[tokio::test]
    async fn test_topics_sorted_by_name() {
        let (_db, repo) = test_db().await;
        let topics = repo.list_topics().await.unwrap();
        let names: Vec<&str> = topics.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Behavioral",
                "Docker",
                "Golang",
                "High Level Design",
                "Kubernetes",
                "Linux",
                "Low Level Design",
            ]
        );
    }

    #[tokio::test]
    async fn test_topic_by_slug() {
        let (_db, repo) = test_db().await;
        let topic = repo.get_topic_by_slug("k8s").await.unwrap().unwrap();
        assert_eq!(topic.id, "topic-k8s");
        assert_eq!(topic.name, "Kubernetes");
        assert_eq!(repo.get_topic_by_slug("rust").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_resources_and_roadmap_ordered() {
        let (db, repo) = test_db().await;
        for (id, idx, url) in [("r2", 2, None), ("r1", 1, Some("https://docs.docker.com"))] {
            sqlx::query(
                "INSERT INTO learning_resources (id, topic_id, title, content, type, url, order_index) \
                 VALUES (?, 'topic-docker', ?, '# Notes', 'article', ?, ?)",
            )
            .bind(id)
            .bind(format!("Resource {id}"))
            .bind(url)
            .bind(idx as i64)
            .execute(db.pool())
            .await
            .unwrap();
        }
        for (id, idx, status) in [("s2", 2, "completed"), ("s1", 1, "in-progress")] {
            sqlx::query(
                "INSERT INTO roadmap_items (id, topic_id, title, description, order_index, status) \
                 VALUES (?, 'topic-docker', ?, '', ?, ?)",
            )
            .bind(id)
            .bind(format!("Step {id}"))
            .bind(idx as i64)
            .bind(status)
            .execute(db.pool())
            .await
            .unwrap();
        }

        let resources = repo.list_resources("topic-docker").await.unwrap();
        assert_eq!(resources.len(), 2);
        assert_eq!(resources[0].id, "r1");
        assert_eq!(resources[0].url.as_deref(), Some("https://docs.docker.com"));
        assert_eq!(resources[1].url, None);

        let roadmap = repo.list_roadmap("topic-docker").await.unwrap();
        assert_eq!(roadmap[0].id, "s1");
        assert_eq!(roadmap[0].status, RoadmapStatus::InProgress);
        assert_eq!(roadmap[1].status, RoadmapStatus::Completed);

        assert!(repo.list_roadmap("topic-linux").await.unwrap().is_empty());
    }
}

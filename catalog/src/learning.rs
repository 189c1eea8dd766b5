use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A learning area such as "Low Level Design". Identified publicly by slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningTopic {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub description: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningResource {
    pub id: String,
    pub topic_id: String,
    pub title: String,
    /// Markdown body.
    pub content: String,
    /// `article`, `video` or `link`.
    #[serde(rename = "type")]
    pub kind: String,
    pub url: Option<String>,
    pub order_index: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoadmapStatus {
    Todo,
    InProgress,
    Completed,
}

impl RoadmapStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoadmapStatus::Todo => "todo",
            RoadmapStatus::InProgress => "in-progress",
            RoadmapStatus::Completed => "completed",
        }
    }

    pub fn from_column(s: &str) -> Self {
        match s {
            "in-progress" => RoadmapStatus::InProgress,
            "completed" => RoadmapStatus::Completed,
            _ => RoadmapStatus::Todo,
        }
    }
}

/// One ordered step of a topic's roadmap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadmapItem {
    pub id: String,
    pub topic_id: String,
    pub title: String,
    pub description: String,
    pub order_index: i64,
    pub status: RoadmapStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

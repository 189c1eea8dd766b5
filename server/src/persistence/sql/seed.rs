//! Reference data guaranteed to exist after startup.
//!
//! Each seed checks its natural key first, so re-running is harmless and
//! rows edited by users are never overwritten.

use catalog::canonical_email;

use super::Database;
use crate::auth::password::hash_password;
use crate::persistence::PersistenceError;

pub const DEMO_USER_ID: &str = "demo-user-001";
pub const DEMO_EMAIL: &str = "demo@algovault.com";
pub const DEMO_NAME: &str = "Demo User";
pub const DEMO_PASSWORD: &str = "demo123";

struct TopicSeed {
    id: &'static str,
    name: &'static str,
    icon: &'static str,
    description: &'static str,
    slug: &'static str,
}

const LEARNING_TOPICS: &[TopicSeed] = &[
    TopicSeed {
        id: "topic-lld",
        name: "Low Level Design",
        icon: "Layout",
        description: "Object-oriented design, design patterns, and SOLID principles.",
        slug: "lld",
    },
    TopicSeed {
        id: "topic-hld",
        name: "High Level Design",
        icon: "Server",
        description: "System architecture, scalability, and distributed systems.",
        slug: "hld",
    },
    TopicSeed {
        id: "topic-docker",
        name: "Docker",
        icon: "Box",
        description: "Containerization, images, and orchestration basics.",
        slug: "docker",
    },
    TopicSeed {
        id: "topic-k8s",
        name: "Kubernetes",
        icon: "Cloud",
        description: "Container orchestration at scale.",
        slug: "k8s",
    },
    TopicSeed {
        id: "topic-golang",
        name: "Golang",
        icon: "Code",
        description: "Go programming language, concurrency, and best practices.",
        slug: "golang",
    },
    TopicSeed {
        id: "topic-behavioral",
        name: "Behavioral",
        icon: "Users",
        description: "Soft skills and interview preparation.",
        slug: "behavioral",
    },
    TopicSeed {
        id: "topic-linux",
        name: "Linux",
        icon: "Terminal",
        description: "Linux commands, shell scripting, and system administration.",
        slug: "linux",
    },
];

/// Run every seed. Failures are logged, never returned.
pub async fn seed(db: &Database) {
    match ensure_demo_user(db).await {
        Ok(true) => tracing::info!(email = DEMO_EMAIL, "Seeded demo user"),
        Ok(false) => {}
        Err(e) => tracing::warn!(error = %e, "Could not seed demo user"),
    }
    match ensure_learning_topics(db).await {
        Ok(0) => {}
        Ok(n) => tracing::info!(count = n, "Seeded learning topics"),
        Err(e) => tracing::warn!(error = %e, "Could not seed learning topics"),
    }
}

/// Insert the read-only demo account unless its email is taken.
/// Returns whether a row was inserted.
pub async fn ensure_demo_user(db: &Database) -> Result<bool, PersistenceError> {
    let canonical = canonical_email(DEMO_EMAIL);
    let existing: i64 = sqlx::query_scalar(&db.sql(
        "SELECT COUNT(*) FROM users WHERE email_canonical = ? OR email = ?",
    ))
    .bind(&canonical)
    .bind(DEMO_EMAIL)
    .fetch_one(db.pool())
    .await?;
    if existing > 0 {
        return Ok(false);
    }

    let hash =
        hash_password(DEMO_PASSWORD).map_err(|e| PersistenceError::PasswordHash(e.to_string()))?;

    sqlx::query(&db.sql(
        r#"
        INSERT INTO users (id, email, email_canonical, name, password, role)
        VALUES (?, ?, ?, ?, ?, 'demo')
        "#,
    ))
    .bind(DEMO_USER_ID)
    .bind(DEMO_EMAIL)
    .bind(&canonical)
    .bind(DEMO_NAME)
    .bind(&hash)
    .execute(db.pool())
    .await?;

    Ok(true)
}

/// Insert each built-in learning topic whose slug is absent.
/// Returns how many were inserted.
pub async fn ensure_learning_topics(db: &Database) -> Result<usize, PersistenceError> {
    let mut inserted = 0;

    for topic in LEARNING_TOPICS {
        let existing: i64 =
            sqlx::query_scalar(&db.sql("SELECT COUNT(*) FROM learning_topics WHERE slug = ?"))
                .bind(topic.slug)
                .fetch_one(db.pool())
                .await?;
        if existing > 0 {
            continue;
        }

        sqlx::query(&db.sql(
            r#"
            INSERT INTO learning_topics (id, name, icon, description, slug)
            VALUES (?, ?, ?, ?, ?)
            "#,
        ))
        .bind(topic.id)
        .bind(topic.name)
        .bind(topic.icon)
        .bind(topic.description)
        .bind(topic.slug)
        .execute(db.pool())
        .await?;
        inserted += 1;
    }

    Ok(inserted)
}

pub mod sql;
pub mod traits;

/// Errors from the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("schema step `{step}` failed: {source}")]
    Schema {
        step: String,
        #[source]
        source: sqlx::Error,
    },
    #[error("unreadable timestamp {0:?}")]
    Timestamp(String),
    #[error("password hashing failed: {0}")]
    PasswordHash(String),
}

impl PersistenceError {
    /// True when the underlying engine rejected a write on a UNIQUE constraint.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            PersistenceError::Database(sqlx::Error::Database(e)) => e.is_unique_violation(),
            _ => false,
        }
    }
}

/// Generate a fresh row identifier: 32 lower-case hex characters.
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

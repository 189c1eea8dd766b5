//! Service facade consumed by the HTTP layer.
//!
//! [`CatalogService`] groups the operations by domain, one endpoint struct
//! per group (see [`endpoints`]). Every operation:
//!
//! 1. fetches the backend from the readiness gate ([`ServiceError::Initializing`]
//!    until the database is usable),
//! 2. authenticates the caller (except login and registration),
//! 3. for writes, runs the caller's write-capability check before anything else.
//!
//! [`ServiceError::status_code`] gives the HTTP status for each outcome.

pub mod endpoints;

use std::sync::Arc;

use catalog::ValidationError;

use crate::auth::{AuthError, AuthGuard, Caller};
use crate::persistence::sql::{
    ConnectTarget, Database, SqlCategoryRepository, SqlLearningRepository, SqlMaintenanceRepository,
    SqlPatternRepository, SqlProblemRepository, SqlSolutionRepository, SqlUserRepository,
};
use crate::persistence::PersistenceError;
use crate::readiness::ReadinessGate;

pub use endpoints::{
    AuthEndpoints, CategoryEndpoints, LearningEndpoints, MaintenanceEndpoints, PatternEndpoints,
    ProblemEndpoints,
};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Everything that needs an initialized database.
pub struct Backend {
    pub db: Database,
    pub categories: SqlCategoryRepository,
    pub patterns: SqlPatternRepository,
    pub problems: SqlProblemRepository,
    pub solutions: SqlSolutionRepository,
    pub users: SqlUserRepository,
    pub learning: SqlLearningRepository,
    pub maintenance: SqlMaintenanceRepository,
}

impl Backend {
    pub fn new(db: Database) -> Self {
        Self {
            categories: SqlCategoryRepository::new(db.clone()),
            patterns: SqlPatternRepository::new(db.clone()),
            problems: SqlProblemRepository::new(db.clone()),
            solutions: SqlSolutionRepository::new(db.clone()),
            users: SqlUserRepository::new(db.clone()),
            learning: SqlLearningRepository::new(db.clone()),
            maintenance: SqlMaintenanceRepository::new(db.clone()),
            db,
        }
    }
}

/// Open, migrate and seed the database on a background task, then publish
/// the backend through `gate`.
///
/// Returns at once. Services sharing `gate` answer with
/// [`ServiceError::Initializing`] until the task publishes; on failure the
/// gate stays empty and the error comes back through the handle.
pub fn initialize_in_background(
    target: ConnectTarget,
    gate: ReadinessGate<Backend>,
) -> tokio::task::JoinHandle<Result<(), PersistenceError>> {
    tokio::spawn(async move {
        tracing::info!(target = %target.describe(), "Initializing database in background");
        let db = Database::open(&target).await?;
        gate.publish(Backend::new(db));
        Ok(())
    })
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("database initializing, please wait")]
    Initializing,
    #[error("invalid request: {0}")]
    Invalid(#[from] ValidationError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("user not found")]
    UnknownUser,
    #[error("invalid password")]
    InvalidCredentials,
    #[error("registration is disabled")]
    RegistrationDisabled,
    #[error("{0}")]
    Conflict(&'static str),
    #[error("{kind} not found")]
    NotFound { kind: &'static str, id: String },
    /// Details are logged when the error is created and never shown.
    #[error("internal server error")]
    Internal(#[source] BoxError),
}

impl ServiceError {
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::Initializing => 503,
            ServiceError::Invalid(_) => 400,
            ServiceError::Auth(AuthError::ReadOnly { .. }) => 403,
            ServiceError::Auth(_) => 401,
            ServiceError::UnknownUser | ServiceError::InvalidCredentials => 401,
            ServiceError::RegistrationDisabled => 403,
            ServiceError::Conflict(_) => 409,
            ServiceError::NotFound { .. } => 404,
            ServiceError::Internal(_) => 500,
        }
    }

    pub fn not_found(kind: &'static str, id: &str) -> Self {
        ServiceError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn internal(source: impl Into<BoxError>) -> Self {
        let source = source.into();
        tracing::error!(error = %source, "Internal error");
        ServiceError::Internal(source)
    }
}

impl From<PersistenceError> for ServiceError {
    fn from(e: PersistenceError) -> Self {
        ServiceError::internal(e)
    }
}

/// Registration and other deployment switches.
#[derive(Debug, Clone, Copy)]
pub struct ServiceSettings {
    pub allow_registration: bool,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            allow_registration: true,
        }
    }
}

/// State shared by every endpoint group.
pub struct ServiceContext {
    gate: ReadinessGate<Backend>,
    auth: AuthGuard,
    settings: ServiceSettings,
}

impl ServiceContext {
    fn backend(&self) -> Result<Arc<Backend>, ServiceError> {
        self.gate.get().ok_or(ServiceError::Initializing)
    }

    /// Backend plus the authenticated caller.
    async fn authorize(
        &self,
        authorization: Option<&str>,
    ) -> Result<(Arc<Backend>, Caller), ServiceError> {
        let backend = self.backend()?;
        let caller = self.auth.authenticate(&backend.users, authorization).await?;
        Ok((backend, caller))
    }
}

/// The catalogue service, one endpoint group per domain.
pub struct CatalogService {
    context: Arc<ServiceContext>,
    auth: AuthEndpoints,
    categories: CategoryEndpoints,
    patterns: PatternEndpoints,
    problems: ProblemEndpoints,
    learning: LearningEndpoints,
    maintenance: MaintenanceEndpoints,
}

impl CatalogService {
    pub fn new(gate: ReadinessGate<Backend>, auth: AuthGuard, settings: ServiceSettings) -> Self {
        let context = Arc::new(ServiceContext {
            gate,
            auth,
            settings,
        });
        Self {
            auth: AuthEndpoints::new(context.clone()),
            categories: CategoryEndpoints::new(context.clone()),
            patterns: PatternEndpoints::new(context.clone()),
            problems: ProblemEndpoints::new(context.clone()),
            learning: LearningEndpoints::new(context.clone()),
            maintenance: MaintenanceEndpoints::new(context.clone()),
            context,
        }
    }

    /// Health checks succeed before this does.
    pub fn is_ready(&self) -> bool {
        self.context.gate.is_ready()
    }

    pub fn auth(&self) -> &AuthEndpoints {
        &self.auth
    }

    pub fn categories(&self) -> &CategoryEndpoints {
        &self.categories
    }

    pub fn patterns(&self) -> &PatternEndpoints {
        &self.patterns
    }

    pub fn problems(&self) -> &ProblemEndpoints {
        &self.problems
    }

    pub fn learning(&self) -> &LearningEndpoints {
        &self.learning
    }

    pub fn maintenance(&self) -> &MaintenanceEndpoints {
        &self.maintenance
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::time::Duration;

    use catalog::Role;

    use super::*;
    use crate::auth::token::TokenSigner;
    use crate::persistence::sql::seed::{self, DEMO_USER_ID};

    pub const SECRET: &str = "service-test-secret";

    /// A ready service over a seeded in-memory database, plus the database.
    pub async fn ready_service(settings: ServiceSettings) -> (CatalogService, Database) {
        let db = Database::new_in_memory().await.unwrap();
        seed::seed(&db).await;
        (service_over(db.clone(), settings), db)
    }

    /// A ready service over an already-initialized database.
    pub fn service_over(db: Database, settings: ServiceSettings) -> CatalogService {
        let gate = ReadinessGate::new();
        gate.publish(Backend::new(db));
        CatalogService::new(gate, guard(), settings)
    }

    pub fn guard() -> AuthGuard {
        AuthGuard::new(
            TokenSigner::new(SECRET, Duration::from_secs(3600)),
            Role::Demo,
        )
    }

    fn header(user_id: &str, role: Role) -> String {
        let token = TokenSigner::new(SECRET, Duration::from_secs(3600))
            .issue(user_id, role)
            .unwrap();
        format!("Bearer {token}")
    }

    pub fn admin_header() -> String {
        header("admin-user", Role::Admin)
    }

    pub fn demo_header() -> String {
        header(DEMO_USER_ID, Role::Demo)
    }
}

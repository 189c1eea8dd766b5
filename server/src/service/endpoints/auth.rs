//! Login, registration and the current-user lookup

use std::sync::Arc;

use catalog::{LoginRequest, RegisterRequest, Role, Session, User};

use crate::auth::password::{hash_password, needs_rehash, verify_password};
use crate::persistence::traits::UserRepository;
use crate::service::{Backend, ServiceContext, ServiceError};

pub struct AuthEndpoints {
    context: Arc<ServiceContext>,
}

impl AuthEndpoints {
    pub(crate) fn new(context: Arc<ServiceContext>) -> Self {
        Self { context }
    }

    pub async fn login(&self, request: LoginRequest) -> Result<Session, ServiceError> {
        tracing::info!(email = %request.email, "RPC login");
        let backend = self.context.backend()?;
        request.validate()?;

        let stored = backend
            .users
            .find_user_by_email(&request.email)
            .await?
            .ok_or(ServiceError::UnknownUser)?;

        let password = request.password;
        let hash = stored.password_hash;
        let legacy = needs_rehash(&hash);
        let (matches, password) = tokio::task::spawn_blocking(move || {
            let matches = verify_password(&password, &hash);
            (matches, password)
        })
        .await
        .map_err(ServiceError::internal)?;
        if !matches {
            tracing::info!(user_id = %stored.user.id, "Login rejected: wrong password");
            return Err(ServiceError::InvalidCredentials);
        }

        if legacy {
            self.upgrade_hash(&backend, &stored.user.id, password).await;
        }
        self.session_for(stored.user)
    }

    /// Swap a verified bcrypt hash for argon2. Failure only costs the
    /// upgrade, never the login.
    async fn upgrade_hash(&self, backend: &Backend, user_id: &str, password: String) {
        let hash = match tokio::task::spawn_blocking(move || hash_password(&password)).await {
            Ok(Ok(hash)) => hash,
            Ok(Err(e)) => {
                tracing::warn!(user_id, error = %e, "Could not rehash legacy password");
                return;
            }
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Could not rehash legacy password");
                return;
            }
        };
        match backend.users.update_password_hash(user_id, &hash).await {
            Ok(_) => tracing::info!(user_id, "Upgraded legacy bcrypt hash to argon2"),
            Err(e) => tracing::warn!(user_id, error = %e, "Could not store upgraded hash"),
        }
    }

    /// Create an admin account and sign it in.
    pub async fn register(&self, request: RegisterRequest) -> Result<Session, ServiceError> {
        tracing::info!(email = %request.email, "RPC register");
        let backend = self.context.backend()?;
        if !self.context.settings.allow_registration {
            return Err(ServiceError::RegistrationDisabled);
        }
        request.validate()?;

        if backend
            .users
            .find_user_by_email(&request.email)
            .await?
            .is_some()
        {
            return Err(ServiceError::Conflict("user with this email already exists"));
        }

        let password = request.password;
        let hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(ServiceError::internal)?
            .map_err(|e| ServiceError::internal(e.to_string()))?;

        let user = match backend
            .users
            .create_user(&request.email, request.name.trim(), &hash, Role::Admin)
            .await
        {
            Ok(user) => user,
            Err(e) if e.is_unique_violation() => {
                return Err(ServiceError::Conflict("user with this email already exists"));
            }
            Err(e) => return Err(e.into()),
        };

        self.session_for(user)
    }

    /// The account behind the bearer token.
    pub async fn current_user(&self, authorization: Option<&str>) -> Result<User, ServiceError> {
        let (backend, caller) = self.context.authorize(authorization).await?;
        tracing::debug!(user_id = %caller.user_id, "RPC current_user");
        backend
            .users
            .find_user_by_id(&caller.user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("user", &caller.user_id))
    }

    fn session_for(&self, user: User) -> Result<Session, ServiceError> {
        let token = self
            .context
            .auth
            .signer()
            .issue(&user.id, user.role)
            .map_err(ServiceError::internal)?;
        Ok(Session { token, user })
    }
}

//! Request authentication and the write-capability check.
//!
//! Every request goes through [`AuthGuard::authenticate`]:
//! bearer header → verified token → resolved role → [`Caller`].
//! Mutating operations then call [`Caller::ensure_can_write`] before doing
//! anything else; it is the only place the read-only rule lives.

pub mod password;
pub mod token;

use catalog::Role;

use crate::persistence::traits::UserRepository;
use token::{TokenError, TokenSigner};

/// An authenticated principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: String,
    pub role: Role,
}

impl Caller {
    /// Reject restricted callers. `action` completes "demo users cannot ...".
    pub fn ensure_can_write(&self, action: &'static str) -> Result<(), AuthError> {
        if self.role.is_read_only() {
            tracing::info!(user_id = %self.user_id, action, "Rejected write from read-only caller");
            return Err(AuthError::ReadOnly { action });
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("authorization header required")]
    MissingHeader,
    #[error("authorization header must be `Bearer <token>`")]
    MalformedHeader,
    #[error("invalid token: {0}")]
    InvalidToken(#[from] TokenError),
    #[error("token refers to an unknown user")]
    UnknownUser,
    #[error("demo users cannot {action}")]
    ReadOnly { action: &'static str },
}

/// Extract the token from an `Authorization` header value.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::MissingHeader)?;
    let (scheme, token) = header
        .trim()
        .split_once(' ')
        .ok_or(AuthError::MalformedHeader)?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(AuthError::MalformedHeader);
    }
    Ok(token)
}

/// Turns request credentials into a [`Caller`].
pub struct AuthGuard {
    signer: TokenSigner,
    /// Role assumed when the role lookup itself fails.
    lookup_failure_role: Role,
}

impl AuthGuard {
    pub fn new(signer: TokenSigner, lookup_failure_role: Role) -> Self {
        Self {
            signer,
            lookup_failure_role,
        }
    }

    pub fn signer(&self) -> &TokenSigner {
        &self.signer
    }

    pub async fn authenticate(
        &self,
        users: &impl UserRepository,
        authorization: Option<&str>,
    ) -> Result<Caller, AuthError> {
        let token = bearer_token(authorization)?;
        let claims = self.signer.verify(token)?;

        let role = match claims.role {
            Some(role) => role,
            None => self.resolve_role(users, &claims.sub).await?,
        };

        Ok(Caller {
            user_id: claims.sub,
            role,
        })
    }

    async fn resolve_role(
        &self,
        users: &impl UserRepository,
        user_id: &str,
    ) -> Result<Role, AuthError> {
        match users.find_role(user_id).await {
            Ok(Some(role)) => Ok(role),
            Ok(None) => Err(AuthError::UnknownUser),
            Err(e) => {
                tracing::warn!(
                    user_id,
                    error = %e,
                    fallback = self.lookup_failure_role.as_str(),
                    "Role lookup failed, using fallback role"
                );
                Ok(self.lookup_failure_role)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::token::Claims;
    use super::*;
    use crate::persistence::sql::{Database, SqlUserRepository};
    use std::time::Duration;

    const HOUR: Duration = Duration::from_secs(3600);

    fn guard(fallback: Role) -> AuthGuard {
        AuthGuard::new(TokenSigner::new("guard-secret", HOUR), fallback)
    }

    async fn users() -> (Database, SqlUserRepository) {
        let db = Database::new_in_memory().await.unwrap();
        (db.clone(), SqlUserRepository::new(db))
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(Some("Bearer abc.def.ghi")).unwrap(), "abc.def.ghi");
        assert_eq!(bearer_token(Some("bearer   tok ")).unwrap(), "tok");
        assert!(matches!(bearer_token(None), Err(AuthError::MissingHeader)));
        assert!(matches!(
            bearer_token(Some("Basic dXNlcjpwYXNz")),
            Err(AuthError::MalformedHeader)
        ));
        assert!(matches!(
            bearer_token(Some("Bearer")),
            Err(AuthError::MalformedHeader)
        ));
    }

    #[test]
    fn test_demo_cannot_write() {
        let demo = Caller {
            user_id: "d".to_string(),
            role: Role::Demo,
        };
        let admin = Caller {
            user_id: "a".to_string(),
            role: Role::Admin,
        };
        assert!(matches!(
            demo.ensure_can_write("delete problems"),
            Err(AuthError::ReadOnly { action: "delete problems" })
        ));
        assert!(admin.ensure_can_write("delete problems").is_ok());
    }

    #[tokio::test]
    async fn test_role_claim_is_used() {
        let (_db, users) = users().await;
        let guard = guard(Role::Demo);
        let token = guard.signer().issue("someone", Role::Admin).unwrap();
        let caller = guard
            .authenticate(&users, Some(&format!("Bearer {token}")))
            .await
            .unwrap();
        assert_eq!(caller.role, Role::Admin);
        assert_eq!(caller.user_id, "someone");
    }

    #[tokio::test]
    async fn test_role_looked_up_without_claim() {
        let (_db, users) = users().await;
        let viewer = users
            .create_user("viewer@example.com", "Viewer", "h", Role::Demo)
            .await
            .unwrap();
        let guard = guard(Role::Admin);
        let token = guard
            .signer()
            .sign(&Claims::new(&viewer.id, None, HOUR))
            .unwrap();

        let caller = guard
            .authenticate(&users, Some(&format!("Bearer {token}")))
            .await
            .unwrap();
        assert_eq!(caller.role, Role::Demo);
    }

    #[tokio::test]
    async fn test_unknown_user_rejected() {
        let (_db, users) = users().await;
        let guard = guard(Role::Admin);
        let token = guard.signer().sign(&Claims::new("ghost", None, HOUR)).unwrap();
        let result = guard
            .authenticate(&users, Some(&format!("Bearer {token}")))
            .await;
        assert!(matches!(result, Err(AuthError::UnknownUser)));
    }

    #[tokio::test]
    async fn test_lookup_failure_uses_fallback() {
        let (db, users) = users().await;
        sqlx::query("DROP TABLE users")
            .execute(db.pool())
            .await
            .unwrap();

        let token = guard(Role::Demo)
            .signer()
            .sign(&Claims::new("anyone", None, HOUR))
            .unwrap();
        let header = format!("Bearer {token}");

        let strict = guard(Role::Demo)
            .authenticate(&users, Some(&header))
            .await
            .unwrap();
        assert_eq!(strict.role, Role::Demo);

        let permissive = guard(Role::Admin)
            .authenticate(&users, Some(&header))
            .await
            .unwrap();
        assert_eq!(permissive.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_bad_token_rejected() {
        let (_db, users) = users().await;
        let result = guard(Role::Admin)
            .authenticate(&users, Some("Bearer not-a-token"))
            .await;
        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }
}

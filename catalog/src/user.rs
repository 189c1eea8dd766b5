use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{require, ValidationError};

/// What an authenticated caller is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full read/write access.
    Admin,
    /// Read-only showcase account.
    Demo,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Demo => "demo",
        }
    }

    /// Decode a stored role. Only `demo` restricts; anything else,
    /// including the empty string left by old rows, is an admin.
    pub fn from_column(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("demo") {
            Role::Demo
        } else {
            Role::Admin
        }
    }

    pub fn is_read_only(&self) -> bool {
        matches!(self, Role::Demo)
    }
}

/// A user as returned to clients. The password hash never leaves storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("email", &self.email)?;
        require("password", &self.password)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("email", &self.email)?;
        require("password", &self.password)?;
        require("name", &self.name)
    }
}

/// A bearer token plus the user it was issued to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// Lookup key for an email address: surrounding whitespace removed,
/// lower-cased. Stored next to the original so lookups are a single
/// indexed equality.
pub fn canonical_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_from_column() {
        assert_eq!(Role::from_column("demo"), Role::Demo);
        assert_eq!(Role::from_column("DEMO "), Role::Demo);
        assert_eq!(Role::from_column("admin"), Role::Admin);
        assert_eq!(Role::from_column(""), Role::Admin);
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Demo).unwrap(), "\"demo\"");
        let role: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, Role::Admin);
    }

    #[test]
    fn canonical_email_trims_and_lowercases() {
        assert_eq!(canonical_email("  Demo@AlgoVault.com "), "demo@algovault.com");
        assert_eq!(canonical_email("a@b.c"), "a@b.c");
    }
}

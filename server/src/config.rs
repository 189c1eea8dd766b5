//! Configuration for the AlgoVault server
//!
//! Every setting is a command-line flag with an environment fallback, so the
//! same binary runs locally with no arguments and in a container configured
//! purely through the environment.
//!
//! Engine selection:
//! 1. `DATABASE_URL` / `--database-url` set: PostgreSQL
//! 2. otherwise: SQLite file at `--db` (default `./algovault.db`)

use std::path::PathBuf;
use std::time::Duration;

use catalog::Role;
use clap::{ArgAction, Parser};

use crate::persistence::sql::ConnectTarget;

const DEV_JWT_SECRET: &str = "algovault-dev-secret-change-me";
const DEFAULT_DB_PATH: &str = "./algovault.db";

#[derive(Debug, Clone, Parser)]
#[command(name = "algovault-server", about = "AlgoVault practice catalogue server")]
pub struct Config {
    /// Port the HTTP layer listens on.
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// SQLite database file, used when no database URL is given.
    #[arg(long, default_value = DEFAULT_DB_PATH)]
    pub db: PathBuf,

    /// PostgreSQL connection string.
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Secret used to sign bearer tokens.
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Lifetime of issued tokens.
    #[arg(long, env = "TOKEN_TTL_HOURS", default_value_t = 168)]
    pub token_ttl_hours: u64,

    /// Whether new accounts can sign up.
    #[arg(long, env = "ALLOW_REGISTRATION", default_value_t = true, action = ArgAction::Set)]
    pub allow_registration: bool,

    /// Treat callers as admins when their role cannot be looked up.
    #[arg(long, env = "PERMISSIVE_ROLE_FALLBACK", default_value_t = false, action = ArgAction::Set)]
    pub permissive_role_fallback: bool,
}

impl Config {
    pub fn connect_target(&self) -> ConnectTarget {
        ConnectTarget::from_config(self.database_url.as_deref(), &self.db)
    }

    pub fn jwt_secret(&self) -> &str {
        self.jwt_secret
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(DEV_JWT_SECRET)
    }

    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret() == DEV_JWT_SECRET
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_hours.saturating_mul(3600))
    }

    /// Role assumed when a role lookup fails.
    pub fn fallback_role(&self) -> Role {
        if self.permissive_role_fallback {
            Role::Admin
        } else {
            Role::Demo
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::sql::Dialect;

    // Note: these tests assume DATABASE_URL and friends are not set in the
    // test environment, since clap reads them as fallbacks.

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["algovault-server"]).unwrap();
        assert_eq!(config.db, PathBuf::from(DEFAULT_DB_PATH));
        assert_eq!(config.token_ttl(), Duration::from_secs(7 * 24 * 3600));
        assert_eq!(config.fallback_role(), Role::Demo);
        assert!(config.allow_registration);
    }

    #[test]
    fn test_database_url_selects_postgres() {
        let config = Config::try_parse_from([
            "algovault-server",
            "--database-url",
            "postgres://app:pw@db:5432/algovault",
        ])
        .unwrap();
        assert_eq!(config.connect_target().dialect(), Dialect::Postgres);

        let blank = Config::try_parse_from(["algovault-server", "--database-url", " "]).unwrap();
        assert_eq!(blank.connect_target().dialect(), Dialect::Sqlite);
    }

    #[test]
    fn test_switches() {
        let config = Config::try_parse_from([
            "algovault-server",
            "--allow-registration",
            "false",
            "--permissive-role-fallback",
            "true",
            "--jwt-secret",
            "s3cret",
        ])
        .unwrap();
        assert!(!config.allow_registration);
        assert_eq!(config.fallback_role(), Role::Admin);
        assert_eq!(config.jwt_secret(), "s3cret");
        assert!(!config.uses_default_secret());
    }
}

//! AlgoVault catalogue server.
//!
//! The HTTP layer mounts [`service::CatalogService`] and maps
//! [`service::ServiceError::status_code`] onto responses. Everything below
//! the service (authentication, repositories, schema management) lives here.

pub mod auth;
pub mod config;
pub mod persistence;
pub mod readiness;
pub mod service;

//! Domain types for the AlgoVault practice catalogue.
//!
//! The catalogue is a strict hierarchy: categories own patterns, patterns own
//! problems, problems own one solution per language. Learning topics form a
//! separate, read-mostly hierarchy. Everything here is plain data; storage
//! and access control live in the server crate.

pub mod content;
pub mod import;
pub mod learning;
pub mod user;

pub use content::*;
pub use import::*;
pub use learning::*;
pub use user::*;

/// A client payload failed validation before reaching storage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: &'static str,
}

impl ValidationError {
    pub fn required(field: &'static str) -> Self {
        Self {
            field,
            message: "must not be empty",
        }
    }
}

pub(crate) fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::required(field));
    }
    Ok(())
}

//! Bulk catalogue import payload.
//!
//! An import is a nested tree of names. Existing categories, patterns and
//! problems are matched by name within their parent and left alone; only
//! missing nodes are created, so re-running the same import is harmless.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogueImport {
    #[serde(default)]
    pub categories: Vec<ImportedCategory>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportedCategory {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub patterns: Vec<ImportedPattern>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedPattern {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "matched_problems")]
    pub problems: Vec<ImportedProblem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportedProblem {
    /// Upstream identifier, reused as the row id when present.
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    /// Upstream difficulty string; normalised on import.
    #[serde(default)]
    pub difficulty: String,
}

/// How many rows an import created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportStats {
    pub categories_created: u64,
    pub patterns_created: u64,
    pub problems_created: u64,
}

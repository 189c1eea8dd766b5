use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{require, ValidationError};

/// How hard a problem is. Stored as its display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }

    /// Parse loosely, falling back to `Medium` for anything unrecognised.
    ///
    /// Used for data that did not come through a typed payload (imports,
    /// rows written before the CHECK constraint existed).
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Difficulty::Easy,
            "hard" => Difficulty::Hard,
            _ => Difficulty::Medium,
        }
    }
}

impl FromStr for Difficulty {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Easy" => Ok(Difficulty::Easy),
            "Medium" => Ok(Difficulty::Medium),
            "Hard" => Ok(Difficulty::Hard),
            _ => Err(ValidationError {
                field: "difficulty",
                message: "must be one of Easy, Medium, Hard",
            }),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top level of the practice hierarchy (e.g. "Arrays").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub description: String,
    /// Computed at read time, never stored.
    pub pattern_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A solving technique inside a category (e.g. "Two Pointers").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pattern {
    pub id: String,
    pub category_id: String,
    pub name: String,
    pub icon: String,
    pub description: String,
    /// Long-form markdown. Empty until someone writes it.
    pub theory: String,
    /// Computed at read time, never stored.
    pub problem_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A practice problem. Text fields are markdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    pub id: String,
    pub pattern_id: String,
    pub title: String,
    pub difficulty: Difficulty,
    pub description: String,
    pub input: String,
    pub output: String,
    pub constraints: String,
    pub sample_input: String,
    pub sample_output: String,
    pub explanation: String,
    pub notes: String,
    pub solutions: Vec<Solution>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Reference code for a problem. At most one per (problem, language).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Solution {
    pub id: String,
    pub problem_id: String,
    /// Free-form language key such as `cpp`, `go`, `python`.
    pub language: String,
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ── Client payloads ────────────────────────────────────────────────────
//
// Payloads carry only mutable fields. Identifiers, parent links and
// timestamps are assigned by the server and cannot be supplied here.

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CategoryInput {
    pub name: String,
    pub icon: String,
    pub description: String,
}

impl CategoryInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("name", &self.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PatternInput {
    pub name: String,
    pub icon: String,
    pub description: String,
    pub theory: String,
}

impl PatternInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("name", &self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemInput {
    pub title: String,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub input: String,
    #[serde(default)]
    pub output: String,
    #[serde(default)]
    pub constraints: String,
    #[serde(default)]
    pub sample_input: String,
    #[serde(default)]
    pub sample_output: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub notes: String,
    /// Solutions to save alongside the problem. Languages not listed are
    /// left as they are.
    #[serde(default)]
    pub solutions: Vec<SolutionInput>,
}

impl ProblemInput {
    /// A problem with only a title and difficulty; everything else empty.
    pub fn new(title: impl Into<String>, difficulty: Difficulty) -> Self {
        Self {
            title: title.into(),
            difficulty,
            description: String::new(),
            input: String::new(),
            output: String::new(),
            constraints: String::new(),
            sample_input: String::new(),
            sample_output: String::new(),
            explanation: String::new(),
            notes: String::new(),
            solutions: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require("title", &self.title)?;
        self.solutions.iter().try_for_each(SolutionInput::validate)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolutionInput {
    pub language: String,
    pub code: String,
}

impl SolutionInput {
    pub fn new(language: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            code: code.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require("language", &self.language)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_strict_parse() {
        assert_eq!("Easy".parse::<Difficulty>().unwrap(), Difficulty::Easy);
        assert_eq!("Hard".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert!("easy".parse::<Difficulty>().is_err());
        assert!("Impossible".parse::<Difficulty>().is_err());
    }

    #[test]
    fn difficulty_lenient_parse_falls_back_to_medium() {
        assert_eq!(Difficulty::parse_lenient("EASY"), Difficulty::Easy);
        assert_eq!(Difficulty::parse_lenient(" hard "), Difficulty::Hard);
        assert_eq!(Difficulty::parse_lenient(""), Difficulty::Medium);
        assert_eq!(Difficulty::parse_lenient("Expert"), Difficulty::Medium);
    }

    #[test]
    fn category_payload_ignores_server_fields() {
        let json = r#"{"id":"spoofed","name":"Arrays","icon":"Grid","createdAt":"2020-01-01T00:00:00Z"}"#;
        let input: CategoryInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.name, "Arrays");
        assert_eq!(input.description, "");
    }

    #[test]
    fn problem_payload_camel_case() {
        let json = r#"{
            "title": "Valid Palindrome",
            "difficulty": "Easy",
            "sampleInput": "\"racecar\"",
            "solutions": [{"language": "cpp", "code": "int main() {}"}]
        }"#;
        let input: ProblemInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.sample_input, "\"racecar\"");
        assert_eq!(input.solutions.len(), 1);
        assert!(input.validate().is_ok());
    }

    #[test]
    fn validation_rejects_blank_names() {
        let input = CategoryInput {
            name: "   ".to_string(),
            ..Default::default()
        };
        assert_eq!(input.validate(), Err(ValidationError::required("name")));

        let mut problem = ProblemInput::new("Two Sum", Difficulty::Easy);
        problem.solutions.push(SolutionInput::new("", "code"));
        assert_eq!(
            problem.validate(),
            Err(ValidationError::required("language"))
        );
    }
}

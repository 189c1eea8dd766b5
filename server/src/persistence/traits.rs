//! Async repository trait definitions for the persistence layer.
//!
//! Each trait covers one aggregate of the catalogue. Lookups return
//! `Ok(None)` when the row does not exist so that "not found" is never
//! confused with a failed query. Updates and deletes report whether a row
//! was touched the same way.
//!
//! Methods return `impl Future + Send` rather than using `async fn` so that
//! the futures are guaranteed `Send` and can be driven from `tokio::spawn`.

use std::future::Future;

use catalog::{
    Category, CategoryInput, CatalogueImport, ImportStats, LearningResource, LearningTopic,
    Pattern, PatternInput, Problem, ProblemInput, Role, RoadmapItem, Solution, SolutionInput,
    User,
};

use super::PersistenceError;

/// A user row including the password hash. Never leaves the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUser {
    pub user: User,
    pub password_hash: String,
}

pub trait CategoryRepository: Send + Sync {
    /// All categories, oldest first, each with its pattern count.
    fn list_categories(
        &self,
    ) -> impl Future<Output = Result<Vec<Category>, PersistenceError>> + Send;
    fn get_category(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<Category>, PersistenceError>> + Send;
    fn create_category(
        &self,
        input: &CategoryInput,
    ) -> impl Future<Output = Result<Category, PersistenceError>> + Send;
    fn update_category(
        &self,
        id: &str,
        input: &CategoryInput,
    ) -> impl Future<Output = Result<Option<Category>, PersistenceError>> + Send;
    /// Removes the category and, by cascade, everything beneath it.
    fn delete_category(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<bool, PersistenceError>> + Send;
}

pub trait PatternRepository: Send + Sync {
    /// Patterns of one category, oldest first, each with its problem count.
    fn list_patterns(
        &self,
        category_id: &str,
    ) -> impl Future<Output = Result<Vec<Pattern>, PersistenceError>> + Send;
    fn get_pattern(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<Pattern>, PersistenceError>> + Send;
    fn create_pattern(
        &self,
        category_id: &str,
        input: &PatternInput,
    ) -> impl Future<Output = Result<Pattern, PersistenceError>> + Send;
    /// Replaces every mutable field, theory included. The parent category
    /// never changes.
    fn update_pattern(
        &self,
        id: &str,
        input: &PatternInput,
    ) -> impl Future<Output = Result<Option<Pattern>, PersistenceError>> + Send;
    fn update_pattern_theory(
        &self,
        id: &str,
        theory: &str,
    ) -> impl Future<Output = Result<Option<Pattern>, PersistenceError>> + Send;
    fn delete_pattern(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<bool, PersistenceError>> + Send;
}

/// Problems are always returned with their solutions attached.
pub trait ProblemRepository: Send + Sync {
    fn list_problems(
        &self,
        pattern_id: &str,
    ) -> impl Future<Output = Result<Vec<Problem>, PersistenceError>> + Send;
    fn get_problem(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<Problem>, PersistenceError>> + Send;
    fn create_problem(
        &self,
        pattern_id: &str,
        input: &ProblemInput,
    ) -> impl Future<Output = Result<Problem, PersistenceError>> + Send;
    /// Replaces every mutable field and upserts the listed solutions.
    /// Solutions for languages not listed are kept.
    fn update_problem(
        &self,
        id: &str,
        input: &ProblemInput,
    ) -> impl Future<Output = Result<Option<Problem>, PersistenceError>> + Send;
    fn delete_problem(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<bool, PersistenceError>> + Send;
}

/// Solutions are keyed on `(problem_id, language)`.
pub trait SolutionRepository: Send + Sync {
    fn list_solutions(
        &self,
        problem_id: &str,
    ) -> impl Future<Output = Result<Vec<Solution>, PersistenceError>> + Send;
    /// Insert, or replace the code of, the solution for this language.
    /// The solution id is stable across repeated calls.
    fn upsert_solution(
        &self,
        problem_id: &str,
        language: &str,
        code: &str,
    ) -> impl Future<Output = Result<Solution, PersistenceError>> + Send;
    fn save_solutions(
        &self,
        problem_id: &str,
        solutions: &[SolutionInput],
    ) -> impl Future<Output = Result<Vec<Solution>, PersistenceError>> + Send;
}

pub trait UserRepository: Send + Sync {
    /// Look up by email, ignoring case and surrounding whitespace.
    fn find_user_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<StoredUser>, PersistenceError>> + Send;
    fn find_user_by_id(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<User>, PersistenceError>> + Send;
    fn find_role(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<Option<Role>, PersistenceError>> + Send;
    fn create_user(
        &self,
        email: &str,
        name: &str,
        password_hash: &str,
        role: Role,
    ) -> impl Future<Output = Result<User, PersistenceError>> + Send;
    /// Replace a stored hash. Returns false when the user does not exist.
    fn update_password_hash(
        &self,
        user_id: &str,
        password_hash: &str,
    ) -> impl Future<Output = Result<bool, PersistenceError>> + Send;
}

/// Read side of the learning hierarchy.
pub trait LearningRepository: Send + Sync {
    fn list_topics(
        &self,
    ) -> impl Future<Output = Result<Vec<LearningTopic>, PersistenceError>> + Send;
    fn get_topic_by_slug(
        &self,
        slug: &str,
    ) -> impl Future<Output = Result<Option<LearningTopic>, PersistenceError>> + Send;
    fn list_resources(
        &self,
        topic_id: &str,
    ) -> impl Future<Output = Result<Vec<LearningResource>, PersistenceError>> + Send;
    fn list_roadmap(
        &self,
        topic_id: &str,
    ) -> impl Future<Output = Result<Vec<RoadmapItem>, PersistenceError>> + Send;
}

/// Whole-catalogue operations.
pub trait MaintenanceRepository: Send + Sync {
    /// Create whatever part of `bundle` is missing, matching by name within
    /// the parent. Items that fail to insert are logged and skipped.
    fn import_catalogue(
        &self,
        bundle: &CatalogueImport,
    ) -> impl Future<Output = Result<ImportStats, PersistenceError>> + Send;
    /// Delete all content and learning data. Users are kept.
    fn clear_all(&self) -> impl Future<Output = Result<(), PersistenceError>> + Send;
}

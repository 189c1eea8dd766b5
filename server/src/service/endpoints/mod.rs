//! Endpoint handlers organized by domain

pub mod auth;
pub mod categories;
pub mod learning;
pub mod maintenance;
pub mod patterns;
pub mod problems;

pub use auth::AuthEndpoints;
pub use categories::CategoryEndpoints;
pub use learning::LearningEndpoints;
pub use maintenance::MaintenanceEndpoints;
pub use patterns::PatternEndpoints;
pub use problems::ProblemEndpoints;

//! SQL-backed repository implementations.
//!
//! ## Engines
//!
//! One code path serves both engines through the sqlx `Any` driver.
//! [`ConnectTarget`] picks the engine from configuration and [`Dialect`]
//! carries the few fragments that differ:
//!
//! - **SQLite** (default) - a single pooled connection with WAL journaling,
//!   a 5s busy timeout and foreign keys switched on per connection.
//! - **PostgreSQL** (`DATABASE_URL` set) - up to 10 connections, 5 kept
//!   warm, session time zone pinned to UTC.
//!
//! Statements are written with `?` placeholders and passed through
//! [`Database::sql`] right before execution.
//!
//! ## Schema
//!
//! [`Database::open`] runs [`schema::initialize`] (create, then additive
//! migrations) before anything else can use the pool, then [`seed`]s the
//! demo account and built-in learning topics.
//!
//! Timestamps are filled by the engine ([`Dialect::now`], millisecond or
//! finer) and always selected as text, then decoded by
//! [`helpers::decode_timestamp`]. Lists order by `created_at`, then by
//! [`Dialect::insertion_order`] so rows created in the same instant keep
//! their insert order.
//!
//! ## Repository types
//!
//! | Type | Trait |
//! |------|-------|
//! | [`SqlCategoryRepository`] | `CategoryRepository` |
//! | [`SqlPatternRepository`] | `PatternRepository` |
//! | [`SqlProblemRepository`] | `ProblemRepository` |
//! | [`SqlSolutionRepository`] | `SolutionRepository` |
//! | [`SqlUserRepository`] | `UserRepository` |
//! | [`SqlLearningRepository`] | `LearningRepository` |
//! | [`SqlMaintenanceRepository`] | `MaintenanceRepository` |

mod category_repo;
mod database;
mod dialect;
mod learning_repo;
mod maintenance_repo;
mod pattern_repo;
pub mod placeholders;
mod problem_repo;
pub mod schema;
pub mod seed;
mod solution_repo;
mod user_repo;
pub(crate) mod helpers;

pub use category_repo::SqlCategoryRepository;
pub use database::Database;
pub use dialect::{ConnectTarget, Dialect};
pub use learning_repo::SqlLearningRepository;
pub use maintenance_repo::SqlMaintenanceRepository;
pub use pattern_repo::SqlPatternRepository;
pub use problem_repo::SqlProblemRepository;
pub use solution_repo::SqlSolutionRepository;
pub use user_repo::SqlUserRepository;

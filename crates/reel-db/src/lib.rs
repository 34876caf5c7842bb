//! SQLite persistence layer.
//!
//! Connection pool setup, embedded migrations, and the `VideoRepository`
//! that owns the `videos` and `video_processing_jobs` tables.

pub mod error;
pub mod models;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{init_pool, run_migrations, DatabaseConfig, DbPool};
pub use repository::{VideoPage, VideoRepository};

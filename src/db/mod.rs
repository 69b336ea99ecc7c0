//! Database connection and operations
//!
//! Re-exports are provided for convenience, even if not all are used within the crate.

#![allow(unused_imports)]

pub mod courses;
pub mod documents;
pub mod groups;
pub mod messages;
pub mod resources;
pub mod schema;
pub mod seed;
pub mod sessions;
pub mod settings;
pub mod sqlite_helpers;
pub mod users;

use std::str::FromStr;

use anyhow::Result;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::info;

pub use courses::{CourseRecord, CourseRepository, CreateCourse};
pub use documents::{DocumentRecord, DocumentRepository};
pub use groups::{GroupRecord, GroupRepository};
pub use messages::{CreateMessage, MessageRecord, MessageRepository, MessageStatus};
pub use resources::ResourceRepository;
pub use seed::run_seeds;
pub use sessions::{
    CreateSession, SessionAccessRecord, SessionCourseRecord, SessionRecord, SessionRepository,
};
pub use settings::{SettingRecord, SettingsRepository};
pub use users::{CreateUser, UserRecord, UsersRepository};

/// Database wrapper providing connection pool access
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database wrapper from an existing pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new database connection pool
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.foreign_keys(true);
        let in_memory = url.contains(":memory:");

        if !in_memory
            && let Some(parent) = options.get_filename().parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        // Every connection to `:memory:` opens its own private database,
        // so keep exactly one and never recycle it
        let pool = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(max_connections)
                .connect_with(options)
                .await?
        };

        Ok(Self { pool })
    }

    /// Open a private in-memory database with tables and seed data in place
    pub async fn connect_in_memory() -> Result<Self> {
        let db = Self::connect("sqlite::memory:", 1).await?;
        db.initialize().await?;
        Ok(db)
    }

    /// Create missing tables and apply seed data
    pub async fn initialize(&self) -> Result<()> {
        schema::create_tables(&self.pool).await?;
        let seeded = run_seeds(&self.pool).await;
        if !seeded.errors.is_empty() {
            anyhow::bail!("Seeding failed: {}", seeded.errors.join("; "));
        }
        info!("Database schema ready");
        Ok(())
    }

    /// Get the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Get a settings repository
    pub fn settings(&self) -> SettingsRepository {
        SettingsRepository::new(self.pool.clone())
    }

    /// Get a users repository
    pub fn users(&self) -> UsersRepository {
        UsersRepository::new(self.pool.clone())
    }

    /// Get a courses repository
    pub fn courses(&self) -> CourseRepository {
        CourseRepository::new(self.pool.clone())
    }

    /// Get a course groups repository
    pub fn groups(&self) -> GroupRepository {
        GroupRepository::new(self.pool.clone())
    }

    /// Get a sessions repository
    pub fn sessions(&self) -> SessionRepository {
        SessionRepository::new(self.pool.clone())
    }

    /// Get a messages repository
    pub fn messages(&self) -> MessageRepository {
        MessageRepository::new(self.pool.clone())
    }

    /// Get a resource node/link repository
    pub fn resources(&self) -> ResourceRepository {
        ResourceRepository::new(self.pool.clone())
    }

    /// Get a documents repository
    pub fn documents(&self) -> DocumentRepository {
        DocumentRepository::new(self.pool.clone())
    }
}

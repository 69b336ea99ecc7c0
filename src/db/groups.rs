//! Course group database operations

use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

/// A group inside a course
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct GroupRecord {
    pub iid: i64,
    pub course_id: i64,
    pub name: String,
}

pub struct GroupRepository {
    pool: SqlitePool,
}

impl GroupRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a group in a course
    pub async fn create(&self, course_id: i64, name: &str) -> Result<GroupRecord> {
        let result = sqlx::query("INSERT INTO course_groups (course_id, name) VALUES (?, ?)")
            .bind(course_id)
            .bind(name)
            .execute(&self.pool)
            .await?;

        Ok(GroupRecord {
            iid: result.last_insert_rowid(),
            course_id,
            name: name.to_string(),
        })
    }

    /// Get a group by iid
    pub async fn get_by_id(&self, iid: i64) -> Result<Option<GroupRecord>> {
        let record = sqlx::query_as::<_, GroupRecord>("SELECT * FROM course_groups WHERE iid = ?")
            .bind(iid)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }
}

//! Course database operations

use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

/// `course_rel_user.status` of a course teacher
pub const COURSE_STATUS_TEACHER: i32 = 1;
/// `course_rel_user.status` of a course student
pub const COURSE_STATUS_STUDENT: i32 = 5;
/// `course_rel_user.relation_type` of human-resources followers, not real subscriptions
pub const COURSE_RELATION_TYPE_RRHH: i32 = 1;

/// A course record in the database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CourseRecord {
    pub id: i64,
    pub code: String,
    pub title: String,
    pub visibility: i32,
}

#[derive(Debug, Clone)]
pub struct CreateCourse {
    pub code: String,
    pub title: String,
    pub visibility: i32,
}

impl CreateCourse {
    /// Course open to registered platform users
    pub fn new(code: &str, title: &str) -> Self {
        Self {
            code: code.to_string(),
            title: title.to_string(),
            visibility: 2,
        }
    }
}

/// Course repository for database operations
pub struct CourseRepository {
    pool: SqlitePool,
}

impl CourseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a course
    pub async fn create(&self, course: CreateCourse) -> Result<CourseRecord> {
        let result = sqlx::query("INSERT INTO courses (code, title, visibility) VALUES (?, ?, ?)")
            .bind(&course.code)
            .bind(&course.title)
            .bind(course.visibility)
            .execute(&self.pool)
            .await?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to create course"))
    }

    /// Get a course by ID
    pub async fn get_by_id(&self, id: i64) -> Result<Option<CourseRecord>> {
        let record = sqlx::query_as::<_, CourseRecord>("SELECT * FROM courses WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    /// Change the course visibility
    pub async fn set_visibility(&self, id: i64, visibility: i32) -> Result<bool> {
        let result = sqlx::query("UPDATE courses SET visibility = ? WHERE id = ?")
            .bind(visibility)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Subscribe a user to a course with the given status (teacher/student)
    pub async fn subscribe_user(&self, course_id: i64, user_id: i64, status: i32) -> Result<()> {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO course_rel_user (course_id, user_id, status, relation_type, sort)
            VALUES (?, ?, ?, 0, 0)
            "#,
        )
        .bind(course_id)
        .bind(user_id)
        .bind(status)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Get the user's status in a course, if subscribed
    pub async fn user_status(&self, course_id: i64, user_id: i64) -> Result<Option<i32>> {
        let status: Option<i32> = sqlx::query_scalar(
            r#"
            SELECT status FROM course_rel_user
            WHERE course_id = ? AND user_id = ? AND relation_type <> ?
            ORDER BY status
            LIMIT 1
            "#,
        )
        .bind(course_id)
        .bind(user_id)
        .bind(COURSE_RELATION_TYPE_RRHH)
        .fetch_optional(&self.pool)
        .await?;

        Ok(status)
    }

    /// Make a course available on an access URL
    pub async fn add_to_access_url(&self, course_id: i64, access_url_id: i64) -> Result<()> {
        sqlx::query(
            "INSERT OR IGNORE INTO access_url_rel_course (access_url_id, course_id) VALUES (?, ?)",
        )
        .bind(access_url_id)
        .bind(course_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// IDs of the courses a user is directly subscribed to on an access URL.
    ///
    /// Human-resources follow-ups are not subscriptions and are left out.
    pub async fn list_ids_by_user(&self, user_id: i64, access_url_id: i64) -> Result<Vec<i64>> {
        let ids: Vec<i64> = sqlx::query_scalar(
            r#"
            SELECT c.id FROM courses c
            INNER JOIN course_rel_user cu ON cu.course_id = c.id
            INNER JOIN access_url_rel_course url ON url.course_id = c.id
            WHERE cu.user_id = ? AND cu.relation_type <> ? AND url.access_url_id = ?
            GROUP BY c.id
            ORDER BY MIN(cu.sort), c.title
            "#,
        )
        .bind(user_id)
        .bind(COURSE_RELATION_TYPE_RRHH)
        .bind(access_url_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }
}

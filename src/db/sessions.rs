//! Training session database operations
//!
//! Sessions group courses over a period of time. Users join a session per
//! course (`session_rel_course_rel_user`) either as participants or as course
//! coaches; the general coach supervises the whole session.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use super::sqlite_helpers::{
    datetime_opt_to_str, datetime_to_str, decode_datetime_opt, in_placeholders,
};

/// `session_rel_course_rel_user.status` of a participant
pub const SESSION_COURSE_STATUS_STUDENT: i32 = 0;
/// `session_rel_course_rel_user.status` of a course coach
pub const SESSION_COURSE_STATUS_COACH: i32 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: i64,
    pub name: String,
    pub category_id: Option<i64>,
    pub access_start_date: Option<DateTime<Utc>>,
    pub access_end_date: Option<DateTime<Utc>>,
    pub coach_access_start_date: Option<DateTime<Utc>>,
    pub coach_access_end_date: Option<DateTime<Utc>>,
    /// Days a participant may stay after first entering, 0 when unused
    pub duration: i32,
    pub position: i32,
    /// Visibility applied once the access period is over
    pub visibility: i32,
    pub general_coach_id: Option<i64>,
}

impl sqlx::FromRow<'_, sqlx::sqlite::SqliteRow> for SessionRecord {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> sqlx::Result<Self> {
        use sqlx::Row;

        let start: Option<String> = row.try_get("access_start_date")?;
        let end: Option<String> = row.try_get("access_end_date")?;
        let coach_start: Option<String> = row.try_get("coach_access_start_date")?;
        let coach_end: Option<String> = row.try_get("coach_access_end_date")?;

        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            category_id: row.try_get("category_id")?,
            access_start_date: decode_datetime_opt(start.as_deref())?,
            access_end_date: decode_datetime_opt(end.as_deref())?,
            coach_access_start_date: decode_datetime_opt(coach_start.as_deref())?,
            coach_access_end_date: decode_datetime_opt(coach_end.as_deref())?,
            duration: row.try_get("duration")?,
            position: row.try_get("position")?,
            visibility: row.try_get("visibility")?,
            general_coach_id: row.try_get("general_coach_id")?,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct CreateSession {
    pub name: String,
    pub category_id: Option<i64>,
    pub access_start_date: Option<DateTime<Utc>>,
    pub access_end_date: Option<DateTime<Utc>>,
    pub coach_access_start_date: Option<DateTime<Utc>>,
    pub coach_access_end_date: Option<DateTime<Utc>>,
    pub duration: i32,
    pub position: i32,
    pub visibility: i32,
    pub general_coach_id: Option<i64>,
}

impl CreateSession {
    /// Session without dates that turns read-only after its end
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            visibility: 1,
            ..Default::default()
        }
    }
}

/// A course of a session as seen by one user
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct SessionCourseRecord {
    pub course_id: i64,
    pub code: String,
    pub title: String,
    pub visibility: i32,
    /// Whether the user coaches this course inside the session
    pub is_coach: bool,
}

/// Per-user access data used by duration based sessions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionAccessRecord {
    /// First time the user entered any course of the session
    pub first_access: Option<DateTime<Utc>>,
    /// Extra days granted to this user on top of the session duration
    pub extra_duration: i32,
}

pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a session
    pub async fn create(&self, session: CreateSession) -> Result<SessionRecord> {
        let result = sqlx::query(
            r#"
            INSERT INTO sessions (
                name, category_id, access_start_date, access_end_date,
                coach_access_start_date, coach_access_end_date,
                duration, position, visibility, general_coach_id
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&session.name)
        .bind(session.category_id)
        .bind(datetime_opt_to_str(session.access_start_date))
        .bind(datetime_opt_to_str(session.access_end_date))
        .bind(datetime_opt_to_str(session.coach_access_start_date))
        .bind(datetime_opt_to_str(session.coach_access_end_date))
        .bind(session.duration)
        .bind(session.position)
        .bind(session.visibility)
        .bind(session.general_coach_id)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to create session"))
    }

    /// Create a session category
    pub async fn create_category(&self, name: &str) -> Result<i64> {
        let result = sqlx::query("INSERT INTO session_categories (name) VALUES (?)")
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(result.last_insert_rowid())
    }

    /// Get a session by ID
    pub async fn get_by_id(&self, id: i64) -> Result<Option<SessionRecord>> {
        let record = sqlx::query_as::<_, SessionRecord>("SELECT * FROM sessions WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    /// Load sessions by id, in the order the ids were given. Unknown ids are skipped.
    pub async fn get_many(&self, ids: &[i64]) -> Result<Vec<SessionRecord>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT * FROM sessions WHERE id IN ({})",
            in_placeholders(ids.len())
        );
        let mut query = sqlx::query_as::<_, SessionRecord>(&sql);
        for id in ids {
            query = query.bind(id);
        }
        let mut records = query.fetch_all(&self.pool).await?;

        records.sort_by_key(|r| ids.iter().position(|id| *id == r.id));
        Ok(records)
    }

    /// Attach a course to a session
    pub async fn add_course(&self, session_id: i64, course_id: i64) -> Result<()> {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO session_rel_course (session_id, course_id, position)
            VALUES (?, ?, (SELECT COUNT(*) FROM session_rel_course WHERE session_id = ?))
            "#,
        )
        .bind(session_id)
        .bind(course_id)
        .bind(session_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Subscribe a user to a course of a session as participant or coach
    pub async fn subscribe_user_to_course(
        &self,
        session_id: i64,
        course_id: i64,
        user_id: i64,
        status: i32,
    ) -> Result<()> {
        self.add_course(session_id, course_id).await?;
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO session_rel_course_rel_user (session_id, course_id, user_id, status)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(session_id)
        .bind(course_id)
        .bind(user_id)
        .bind(status)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Register a user in the session, optionally granting extra days
    pub async fn subscribe_user(&self, session_id: i64, user_id: i64, extra_duration: i32) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO session_rel_user (session_id, user_id, relation_type, duration)
            VALUES (?, ?, 0, ?)
            ON CONFLICT (session_id, user_id, relation_type) DO UPDATE SET duration = excluded.duration
            "#,
        )
        .bind(session_id)
        .bind(user_id)
        .bind(extra_duration)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Make a session available on an access URL
    pub async fn add_to_access_url(&self, session_id: i64, access_url_id: i64) -> Result<()> {
        sqlx::query(
            "INSERT OR IGNORE INTO access_url_rel_session (access_url_id, session_id) VALUES (?, ?)",
        )
        .bind(access_url_id)
        .bind(session_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Track a user entering a course of a session
    pub async fn record_course_access(
        &self,
        user_id: i64,
        course_id: i64,
        session_id: i64,
        at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO course_access (user_id, course_id, session_id, login_course_date)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(course_id)
        .bind(session_id)
        .bind(datetime_to_str(at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Sessions of a user on an access URL, sorted by `order_clause`.
    ///
    /// A user belongs to a session when subscribed to any of its courses or when
    /// they are its general coach. `order_clause` may reference the session as `s`
    /// and its category as `sc`.
    pub async fn list_for_user(
        &self,
        user_id: i64,
        access_url_id: i64,
        order_clause: &str,
    ) -> Result<Vec<SessionRecord>> {
        let sql = format!(
            r#"
            SELECT s.*, sc.name AS category_name
            FROM sessions s
            LEFT JOIN session_rel_course_rel_user scu ON scu.session_id = s.id
            INNER JOIN access_url_rel_session url ON url.session_id = s.id
            LEFT JOIN session_categories sc ON s.category_id = sc.id
            WHERE (scu.user_id = ?1 OR s.general_coach_id = ?1) AND url.access_url_id = ?2
            GROUP BY s.id
            ORDER BY {}
            "#,
            order_clause
        );

        let records = sqlx::query_as::<_, SessionRecord>(&sql)
            .bind(user_id)
            .bind(access_url_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }

    /// IDs of the users coaching any course of the session
    pub async fn coach_ids(&self, session_id: i64) -> Result<Vec<i64>> {
        let ids: Vec<i64> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT user_id FROM session_rel_course_rel_user
            WHERE session_id = ? AND status = ?
            ORDER BY user_id
            "#,
        )
        .bind(session_id)
        .bind(SESSION_COURSE_STATUS_COACH)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    /// Courses of the session visible to a user.
    ///
    /// The general coach sees every course of the session; anybody else sees
    /// the courses they are subscribed to.
    pub async fn courses_for_user(
        &self,
        session_id: i64,
        user_id: i64,
    ) -> Result<Vec<SessionCourseRecord>> {
        let records = sqlx::query_as::<_, SessionCourseRecord>(
            r#"
            SELECT
                c.id AS course_id,
                c.code,
                c.title,
                c.visibility,
                EXISTS (
                    SELECT 1 FROM session_rel_course_rel_user coach
                    WHERE coach.session_id = src.session_id
                      AND coach.course_id = c.id
                      AND coach.user_id = ?2
                      AND coach.status = ?3
                ) AS is_coach
            FROM session_rel_course src
            INNER JOIN courses c ON c.id = src.course_id
            INNER JOIN sessions s ON s.id = src.session_id
            WHERE src.session_id = ?1
              AND (
                  s.general_coach_id = ?2
                  OR EXISTS (
                      SELECT 1 FROM session_rel_course_rel_user scu
                      WHERE scu.session_id = src.session_id
                        AND scu.course_id = c.id
                        AND scu.user_id = ?2
                  )
              )
            ORDER BY src.position, c.title
            "#,
        )
        .bind(session_id)
        .bind(user_id)
        .bind(SESSION_COURSE_STATUS_COACH)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// First access and granted extension of a user in a session
    pub async fn access(&self, session_id: i64, user_id: i64) -> Result<SessionAccessRecord> {
        let first_access: Option<String> = sqlx::query_scalar(
            "SELECT MIN(login_course_date) FROM course_access WHERE session_id = ? AND user_id = ?",
        )
        .bind(session_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let extra_duration: Option<i32> = sqlx::query_scalar(
            r#"
            SELECT duration FROM session_rel_user
            WHERE session_id = ? AND user_id = ? AND relation_type = 0
            "#,
        )
        .bind(session_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(SessionAccessRecord {
            first_access: decode_datetime_opt(first_access.as_deref())?,
            extra_duration: extra_duration.unwrap_or(0),
        })
    }
}

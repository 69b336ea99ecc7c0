//! Users repository
//!
//! Handles platform users and their access URL registration.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool as Pool;

use super::sqlite_helpers::{bool_to_int, decode_datetime, int_to_bool, now_iso8601};

/// Platform role granting access to every user's data
pub use crate::security::voter::ROLE_ADMIN;
pub const ROLE_TEACHER: &str = "ROLE_TEACHER";
pub const ROLE_STUDENT: &str = "ROLE_STUDENT";

/// Maximum number of suggestions returned by the contact search
pub const MESSAGE_CONTACTS_LIMIT: i64 = 10;

// ============================================================================
// User Records
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub firstname: String,
    pub lastname: String,
    pub email: Option<String>,
    pub role: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.firstname, self.lastname).trim().to_string()
    }
}

impl sqlx::FromRow<'_, sqlx::sqlite::SqliteRow> for UserRecord {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> sqlx::Result<Self> {
        use sqlx::Row;

        let created_str: String = row.try_get("created_at")?;
        let active: i32 = row.try_get("active")?;

        Ok(Self {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            firstname: row.try_get("firstname")?,
            lastname: row.try_get("lastname")?,
            email: row.try_get("email")?,
            role: row.try_get("role")?,
            active: int_to_bool(active),
            created_at: decode_datetime(&created_str)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct CreateUser {
    pub username: String,
    pub firstname: String,
    pub lastname: String,
    pub email: Option<String>,
    pub role: String,
    pub active: bool,
}

impl CreateUser {
    /// Active student account with the given username
    pub fn student(username: &str) -> Self {
        Self {
            username: username.to_string(),
            firstname: String::new(),
            lastname: String::new(),
            email: None,
            role: ROLE_STUDENT.to_string(),
            active: true,
        }
    }
}

// ============================================================================
// Repository
// ============================================================================

pub struct UsersRepository {
    pool: Pool,
}

impl UsersRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create a new user
    pub async fn create(&self, user: CreateUser) -> Result<UserRecord> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (username, firstname, lastname, email, role, active, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.username)
        .bind(&user.firstname)
        .bind(&user.lastname)
        .bind(&user.email)
        .bind(&user.role)
        .bind(bool_to_int(user.active))
        .bind(now_iso8601())
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.get_by_id(id).await?.ok_or_else(|| anyhow::anyhow!("Failed to create user"))
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i64) -> Result<Option<UserRecord>> {
        let record = sqlx::query_as::<_, UserRecord>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    /// Get user by username (case-insensitive)
    pub async fn get_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT * FROM users WHERE username = ? COLLATE NOCASE",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Get several users at once; unknown ids are skipped
    pub async fn get_many(&self, ids: &[i64]) -> Result<Vec<UserRecord>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT * FROM users WHERE id IN ({}) ORDER BY id",
            super::sqlite_helpers::in_placeholders(ids.len())
        );
        let mut query = sqlx::query_as::<_, UserRecord>(&sql);
        for id in ids {
            query = query.bind(id);
        }

        Ok(query.fetch_all(&self.pool).await?)
    }

    /// Register a user on an access URL
    pub async fn add_to_access_url(&self, user_id: i64, access_url_id: i64) -> Result<()> {
        sqlx::query(
            "INSERT OR IGNORE INTO access_url_rel_user (access_url_id, user_id) VALUES (?, ?)",
        )
        .bind(access_url_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Find users the given user may write to.
    ///
    /// Candidates are active users other than `user_id` that share at least one
    /// course or session with them and whose username, first name, last name or
    /// e-mail contains `filter`.
    pub async fn find_users_to_send_message(
        &self,
        user_id: i64,
        filter: &str,
        limit: i64,
    ) -> Result<Vec<UserRecord>> {
        let pattern = format!("%{}%", escape_like(filter));

        let records = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT u.* FROM users u
            WHERE u.active = 1
              AND u.id <> ?1
              AND (
                  u.username LIKE ?2 ESCAPE '\'
                  OR u.firstname LIKE ?2 ESCAPE '\'
                  OR u.lastname LIKE ?2 ESCAPE '\'
                  OR u.email LIKE ?2 ESCAPE '\'
              )
              AND (
                  EXISTS (
                      SELECT 1 FROM course_rel_user mine
                      JOIN course_rel_user theirs ON theirs.course_id = mine.course_id
                      WHERE mine.user_id = ?1 AND theirs.user_id = u.id
                  )
                  OR EXISTS (
                      SELECT 1 FROM session_rel_course_rel_user mine
                      JOIN session_rel_course_rel_user theirs ON theirs.session_id = mine.session_id
                      WHERE mine.user_id = ?1 AND theirs.user_id = u.id
                  )
                  OR EXISTS (
                      SELECT 1 FROM session_rel_user mine
                      JOIN session_rel_user theirs ON theirs.session_id = mine.session_id
                      WHERE mine.user_id = ?1 AND theirs.user_id = u.id
                  )
              )
            ORDER BY u.lastname, u.firstname, u.username
            LIMIT ?3
            "#,
        )
        .bind(user_id)
        .bind(&pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}

/// Escape LIKE wildcards so user input matches literally
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

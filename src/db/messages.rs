//! Private message database operations

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use super::sqlite_helpers::{decode_datetime, now_iso8601};

/// Message inbox status as stored in `messages.status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageStatus {
    New = 0,
    Unread = 1,
    Deleted = 3,
    Outbox = 4,
}

impl MessageStatus {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::New),
            1 => Some(Self::Unread),
            3 => Some(Self::Deleted),
            4 => Some(Self::Outbox),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub title: String,
    pub content: String,
    pub status: i32,
    pub send_date: DateTime<Utc>,
}

impl sqlx::FromRow<'_, sqlx::sqlite::SqliteRow> for MessageRecord {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> sqlx::Result<Self> {
        use sqlx::Row;

        let send_str: String = row.try_get("send_date")?;

        Ok(Self {
            id: row.try_get("id")?,
            sender_id: row.try_get("sender_id")?,
            receiver_id: row.try_get("receiver_id")?,
            title: row.try_get("title")?,
            content: row.try_get("content")?,
            status: row.try_get("status")?,
            send_date: decode_datetime(&send_str)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct CreateMessage {
    pub sender_id: i64,
    pub receiver_id: i64,
    pub title: String,
    pub content: String,
    pub status: MessageStatus,
}

pub struct MessageRepository {
    pool: SqlitePool,
}

impl MessageRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Store a message
    pub async fn create(&self, message: CreateMessage) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO messages (sender_id, receiver_id, title, content, status, send_date)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(message.sender_id)
        .bind(message.receiver_id)
        .bind(&message.title)
        .bind(&message.content)
        .bind(message.status.as_i32())
        .bind(now_iso8601())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Unread messages received by a user, newest first.
    ///
    /// With `last_id > 0` only messages with a greater id are returned, which lets
    /// clients poll for what arrived since the last one they saw.
    pub async fn unread_received(&self, user_id: i64, last_id: i64) -> Result<Vec<MessageRecord>> {
        let records = sqlx::query_as::<_, MessageRecord>(
            r#"
            SELECT * FROM messages
            WHERE receiver_id = ? AND status = ? AND (? <= 0 OR id > ?)
            ORDER BY send_date DESC, id DESC
            "#,
        )
        .bind(user_id)
        .bind(MessageStatus::Unread.as_i32())
        .bind(last_id)
        .bind(last_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}

//! Application settings database operations
//!
//! Settings are stored as JSON text keyed by a dotted name such as
//! `display.show_email_addresses`.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::SqlitePool;

use super::sqlite_helpers::{decode_datetime, now_iso8601};

/// A setting record in the database
#[derive(Debug, Clone)]
pub struct SettingRecord {
    pub key: String,
    pub value: JsonValue,
    pub description: Option<String>,
    pub category: String,
    pub updated_at: DateTime<Utc>,
}

impl sqlx::FromRow<'_, sqlx::sqlite::SqliteRow> for SettingRecord {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> sqlx::Result<Self> {
        use sqlx::Row;

        let updated_str: String = row.try_get("updated_at")?;
        let value_str: String = row.try_get("value")?;

        Ok(Self {
            key: row.try_get("key")?,
            value: serde_json::from_str(&value_str).map_err(|e| sqlx::Error::Decode(e.into()))?,
            description: row.try_get("description")?,
            category: row.try_get("category")?,
            updated_at: decode_datetime(&updated_str)?,
        })
    }
}

/// Settings repository for database operations
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a setting by key
    pub async fn get(&self, key: &str) -> Result<Option<SettingRecord>> {
        let record =
            sqlx::query_as::<_, SettingRecord>("SELECT * FROM app_settings WHERE key = ?1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        Ok(record)
    }

    /// Get a setting value as a specific type
    pub async fn get_value<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let record = self.get(key).await?;
        match record {
            Some(r) if r.value.is_null() => Ok(None),
            Some(r) => Ok(Some(serde_json::from_value(r.value)?)),
            None => Ok(None),
        }
    }

    /// Read a yes/no setting.
    ///
    /// Platform settings are historically stored as the strings `"true"` /
    /// `"false"`; JSON booleans are accepted as well. Anything else is `false`.
    pub async fn get_flag(&self, key: &str) -> Result<bool> {
        let record = self.get(key).await?;
        Ok(match record.map(|r| r.value) {
            Some(JsonValue::Bool(b)) => b,
            Some(JsonValue::String(s)) => s == "true",
            _ => false,
        })
    }

    /// Set a setting value
    pub async fn set<T: serde::Serialize>(&self, key: &str, value: T) -> Result<SettingRecord> {
        let json_value = serde_json::to_string(&serde_json::to_value(value)?)?;

        sqlx::query(
            r#"
            INSERT INTO app_settings (key, value, category, updated_at)
            VALUES (?1, ?2, 'general', ?3)
            ON CONFLICT (key) DO UPDATE SET
                value = ?2,
                updated_at = ?3
            "#,
        )
        .bind(key)
        .bind(&json_value)
        .bind(now_iso8601())
        .execute(&self.pool)
        .await?;

        self.get(key).await?.ok_or_else(|| anyhow::anyhow!("Failed to retrieve setting after insert"))
    }
}

#[cfg(test)]
mod tests {
    use crate::db::Database;

    #[tokio::test]
    async fn test_flag_accepts_strings_and_booleans() {
        let db = Database::connect_in_memory().await.unwrap();
        let settings = db.settings();

        settings.set("display.show_email_addresses", "true").await.unwrap();
        assert!(settings.get_flag("display.show_email_addresses").await.unwrap());

        settings.set("display.show_email_addresses", false).await.unwrap();
        assert!(!settings.get_flag("display.show_email_addresses").await.unwrap());

        settings.set("display.show_email_addresses", "yes").await.unwrap();
        assert!(!settings.get_flag("display.show_email_addresses").await.unwrap());

        assert!(!settings.get_flag("missing.key").await.unwrap());
    }

    #[tokio::test]
    async fn test_null_value_reads_as_missing() {
        let db = Database::connect_in_memory().await.unwrap();
        let settings = db.settings();

        settings.set("session.my_courses_session_order", serde_json::Value::Null).await.unwrap();
        let value: Option<serde_json::Value> =
            settings.get_value("session.my_courses_session_order").await.unwrap();
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn test_set_keeps_seeded_category_and_description() {
        let db = Database::connect_in_memory().await.unwrap();
        let settings = db.settings();
        let seeded = settings.get("display.show_email_addresses").await.unwrap().unwrap();

        let record = settings.set("display.show_email_addresses", "true").await.unwrap();
        assert_eq!(record.category, "display");
        assert_eq!(record.description, seeded.description);
        assert_eq!(record.value, serde_json::json!("true"));
    }
}
